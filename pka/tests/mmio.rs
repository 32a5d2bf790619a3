//! Register-level backend driven against a simulated register block.

use pka::{
    Accelerator, BeBytes, Instruction, LenId, LeWords, MmioPka, Pka, PkaRegisters, Reg,
    SoftPka, Status,
    mmio::offset,
};

/// Register block in front of the software engine.
#[derive(Default)]
struct Registers {
    engine: SoftPka,
    write_addr: usize,
    read_addr: usize,
    status: u32,
    clock: u32,
}

impl PkaRegisters for Registers {
    fn read(&mut self, offset: usize) -> u32 {
        match offset {
            offset::STATUS => self.status,
            offset::PIPE_RDY | offset::DONE => 1,
            offset::CLK_ENABLE => self.clock,
            offset::SRAM_RDATA => {
                let mut word = [0u32];
                self.engine.read_sram(self.read_addr, &mut word);
                self.read_addr += 1;
                word[0]
            }
            _ => 0,
        }
    }

    fn write(&mut self, offset: usize, value: u32) {
        match offset {
            o if o < offset::OPCODE => {
                let reg = Reg::new((o / 4) as u8).unwrap();
                self.engine.write_map(reg, value as usize);
            }
            o if (offset::SIZE_TABLE..offset::SIZE_TABLE + 32).contains(&o) => {
                let len = LenId::new(((o - offset::SIZE_TABLE) / 4) as u8).unwrap();
                self.engine.write_size(len, value);
            }
            offset::OPCODE => {
                self.status = match Instruction::decode(value) {
                    Ok(instr) => self.engine.execute(instr).bits(),
                    Err(_) => Status::ILLEGAL_OPCODE.bits(),
                };
            }
            offset::CLK_ENABLE => {
                self.clock = value;
                if value == 0 {
                    self.engine.power_down();
                } else {
                    self.engine.power_up();
                }
            }
            offset::SRAM_ADDR => self.write_addr = value as usize,
            offset::SRAM_RADDR => self.read_addr = value as usize,
            offset::SRAM_WDATA => {
                self.engine.write_sram(self.write_addr, &[value]);
                self.write_addr += 1;
            }
            offset::SRAM_WR_CLR => self.engine.clear_sram(self.write_addr, value as usize),
            _ => {}
        }
    }
}

const MODULUS: [u8; 16] = hex_literal::hex!("f3a1c5e7092b4d6f8193a5b7c9dbedff");

fn mod_exp<A: Accelerator>(pka: &Pka<A>) -> [u8; 16] {
    let mut out = [0u8; 16];
    pka.mod_exp(
        &BeBytes(hex_literal::hex!("0123456789abcdeffedcba9876543210")),
        &BeBytes(hex_literal::hex!("1d")),
        &BeBytes(MODULUS),
        &mut BeBytes(&mut out),
    )
    .unwrap();
    out
}

#[test]
fn matches_software_engine() {
    let soft = Pka::new(SoftPka::new());
    let mmio = Pka::new(MmioPka::new(Registers::default()));

    assert_eq!(mod_exp(&mmio), mod_exp(&soft));

    let soft = soft.into_inner();
    let regs = mmio.into_inner().free();
    assert_eq!(regs.engine.executed(), soft.executed());
    assert_eq!(regs.engine.sequence_digest(), soft.sequence_digest());
}

#[test]
fn session_release_wipes_and_powers_down() {
    let pka = Pka::new(MmioPka::new(Registers::default()));
    mod_exp(&pka);

    let regs = pka.into_inner().free();
    assert_eq!(regs.clock, 0);
    assert!(!regs.engine.is_powered());
    assert!(regs.engine.sram().iter().all(|w| *w == 0));
}

#[test]
fn status_flags_reach_the_caller() {
    let pka = Pka::new(MmioPka::new(Registers::default()));
    let mut engine = pka.lock();
    engine.init(Default::default()).unwrap();

    let [a, b, q] = engine.pool().take_array().unwrap();
    engine.copy_into_register(a, &LeWords([5u32])).unwrap();
    engine.clear(LenId::MAX, b).unwrap();
    assert_eq!(engine.div(LenId::MAX, q, a, b), Err(pka::Error::DivideByZero));
}

#[test]
fn scratch_memory_limit() {
    let pka = Pka::new(MmioPka::with_sram_words(Registers::default(), 256));
    let mut engine = pka.lock();
    assert_eq!(
        engine.init(pka::SessionParams::new(4096)),
        Err(pka::Error::RegisterSizeExceeded)
    );
}
