//! Portable software accelerator.

mod alu;

use crate::{
    accelerator::Accelerator,
    opcode::{Instruction, Opcode, Operand, Status},
    regs::{LEN_COUNT, LenId, MAX_REG_WORDS, NP_WORDS, REG_COUNT, Reg, SRAM_WORDS, ext_words},
};

/// Operand widths served by the narrow and medium integer types; every
/// curve domain fits the narrow one.
const NARROW_WORDS: usize = 20;
const MEDIUM_WORDS: usize = 72;

const NARROW_LIMBS: usize = alu::limbs_for(2 * NARROW_WORDS + 4);
const MEDIUM_LIMBS: usize = alu::limbs_for(2 * MEDIUM_WORDS + 4);
const WIDE_LIMBS: usize = alu::limbs_for(2 * MAX_REG_WORDS + 4);

/// Instruction outcome; `Err` carries the error flags.
type Exec<T = Status> = Result<T, Status>;

/// Software implementation of the accelerator contract.
///
/// Models the scratch memory, the register map and the size table exactly
/// like the hardware does, and performs modular reduction with the Barrett
/// tag found in [`Reg::NP`]: a wrong tag shows up as [`Status::FATAL`].
/// The arithmetic itself runs on `crypto_bigint` integers.
///
/// It also counts executed instructions and folds their opcodes and size
/// classes into a running digest, which lets tests compare instruction
/// sequences.
#[derive(Clone, Debug)]
pub struct SoftPka {
    sram: [u32; SRAM_WORDS],
    map: [Option<usize>; REG_COUNT],
    sizes: [u32; LEN_COUNT],
    powered: bool,
    executed: u64,
    digest: u64,
}

impl Default for SoftPka {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftPka {
    /// Create a powered-down accelerator with cleared memory.
    pub const fn new() -> Self {
        Self {
            sram: [0; SRAM_WORDS],
            map: [None; REG_COUNT],
            sizes: [0; LEN_COUNT],
            powered: false,
            executed: 0,
            digest: DIGEST_INIT,
        }
    }

    /// Number of instructions executed since the last reset.
    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// Digest of the opcode and size class sequence since the last reset.
    ///
    /// Register operands are not part of the digest.
    pub fn sequence_digest(&self) -> u64 {
        self.digest
    }

    /// Reset the instruction counter and digest.
    pub fn reset_counters(&mut self) {
        self.executed = 0;
        self.digest = DIGEST_INIT;
    }

    /// Is the engine clock enabled?
    pub fn is_powered(&self) -> bool {
        self.powered
    }

    /// Raw scratch memory.
    pub fn sram(&self) -> &[u32] {
        &self.sram
    }

    fn run(&mut self, instr: Instruction) -> Exec {
        if !self.powered {
            return Err(Status::FATAL);
        }

        let w = self.op_words(instr.len)?;
        let reg_w = match self.sizes[LenId::MAX.index()] {
            0 => w,
            bits => ext_words(bits).max(w),
        };

        let shift = instr.opcode.is_shift();
        let mut a = [0u32; MAX_REG_WORDS];
        let mut b = [0u32; MAX_REG_WORDS];
        self.load(instr.a, false, &mut a[..w])?;
        self.load(instr.b, shift, &mut b[..w])?;

        if let Some(r) = instr.r {
            self.address(r, reg_w)?;
        }

        let dividend = match (instr.opcode, instr.a) {
            (Opcode::Div, Operand::Reg(reg)) => Some(reg),
            (Opcode::Div, Operand::Imm(_)) => return Err(Status::ILLEGAL_OPERAND),
            _ => None,
        };

        let mut n = [0u32; MAX_REG_WORDS];
        let mut np = [0u32; NP_WORDS];
        let mut acc = [0u32; MAX_REG_WORDS];
        let modular = instr.opcode.is_modular();
        if modular {
            self.read_reg(Reg::N, &mut n[..w])?;
            self.read_reg(Reg::NP, &mut np)?;
        }
        let accumulate = match (instr.opcode, instr.r) {
            (Opcode::ModMulAcc, Some(dst)) => {
                self.read_reg(dst, &mut acc[..w])?;
                true
            }
            (Opcode::ModMulAcc, None) => return Err(Status::ILLEGAL_OPERAND),
            _ => false,
        };

        let inputs = alu::Inputs {
            opcode: instr.opcode,
            a: &a[..w],
            b: &b[..w],
            count: if shift { shift_count(instr.b)? } else { 0 },
            modulus: modular.then_some((&n[..w], &np)),
            acc: accumulate.then_some(&acc[..w]),
        };

        let mut r = [0u32; MAX_REG_WORDS];
        let mut rem = [0u32; MAX_REG_WORDS];
        let carry = if w <= NARROW_WORDS {
            alu::execute::<NARROW_LIMBS>(&inputs, &mut r[..w], &mut rem[..w])
        } else if w <= MEDIUM_WORDS {
            alu::execute::<MEDIUM_LIMBS>(&inputs, &mut r[..w], &mut rem[..w])
        } else {
            alu::execute::<WIDE_LIMBS>(&inputs, &mut r[..w], &mut rem[..w])
        }?;

        let mut status = Status::empty();
        status.set(Status::CARRY, carry);
        status.set(Status::ZERO, r[..w].iter().all(|x| *x == 0));

        if let Some(dividend) = dividend {
            self.store(dividend, &rem[..w], reg_w)?;
        }
        if let Some(dst) = instr.r {
            self.store(dst, &r[..w], reg_w)?;
        }

        Ok(status)
    }

    fn op_words(&self, len: LenId) -> Exec<usize> {
        match self.sizes[len.index()] {
            0 => Err(Status::ILLEGAL_OPERAND),
            bits => match ext_words(bits) {
                w if w > MAX_REG_WORDS => Err(Status::ILLEGAL_OPERAND),
                w => Ok(w),
            },
        }
    }

    fn address(&self, reg: Reg, words: usize) -> Exec<usize> {
        match self.map[reg.index()] {
            Some(addr) if addr + words <= SRAM_WORDS => Ok(addr),
            _ => Err(Status::ILLEGAL_OPERAND),
        }
    }

    fn read_reg(&self, reg: Reg, out: &mut [u32]) -> Exec<()> {
        let addr = self.address(reg, out.len())?;
        out.copy_from_slice(&self.sram[addr..addr + out.len()]);
        Ok(())
    }

    fn load(&self, op: Operand, shift: bool, out: &mut [u32]) -> Exec<()> {
        match op {
            Operand::Reg(reg) => self.read_reg(reg, out),
            Operand::Imm(raw) if shift => {
                out.fill(0);
                if let Some(w) = out.first_mut() {
                    *w = Operand::shift_count(raw);
                }
                Ok(())
            }
            Operand::Imm(raw) => {
                let value = Operand::imm_value(raw);
                out.fill(if value < 0 { u32::MAX } else { 0 });
                if let Some(w) = out.first_mut() {
                    *w = value as u32;
                }
                Ok(())
            }
        }
    }

    fn store(&mut self, reg: Reg, value: &[u32], reg_w: usize) -> Exec<()> {
        let addr = self.address(reg, reg_w)?;
        let dst = &mut self.sram[addr..addr + reg_w];
        let (low, high) = dst.split_at_mut(value.len().min(reg_w));
        low.copy_from_slice(&value[..low.len()]);
        high.fill(0);
        Ok(())
    }
}

const DIGEST_INIT: u64 = 0xcbf2_9ce4_8422_2325;

fn shift_count(op: Operand) -> Exec<u32> {
    match op {
        Operand::Imm(raw) => Ok(Operand::shift_count(raw)),
        Operand::Reg(_) => Err(Status::ILLEGAL_OPERAND),
    }
}

impl Accelerator for SoftPka {
    fn power_up(&mut self) {
        self.powered = true;
    }

    fn power_down(&mut self) {
        self.powered = false;
    }

    fn wait_idle(&mut self) {}

    fn sram_words(&self) -> usize {
        SRAM_WORDS
    }

    fn write_map(&mut self, reg: Reg, addr: usize) {
        self.map[reg.index()] = Some(addr);
    }

    fn write_size(&mut self, len: LenId, bits: u32) {
        self.sizes[len.index()] = bits;
    }

    fn write_sram(&mut self, addr: usize, words: &[u32]) {
        for (dst, src) in self.sram.iter_mut().skip(addr).zip(words) {
            *dst = *src;
        }
    }

    fn read_sram(&mut self, addr: usize, words: &mut [u32]) {
        for (dst, src) in words.iter_mut().zip(self.sram.iter().skip(addr)) {
            *dst = *src;
        }
    }

    fn clear_sram(&mut self, addr: usize, count: usize) {
        for w in self.sram.iter_mut().skip(addr).take(count) {
            *w = 0;
        }
    }

    fn execute(&mut self, instr: Instruction) -> Status {
        self.executed += 1;
        let key = ((instr.opcode as u64) << 8) | instr.len.index() as u64;
        self.digest = (self.digest ^ key).wrapping_mul(0x0000_0100_0000_01b3);

        self.run(instr).unwrap_or_else(|flags| flags)
    }
}
