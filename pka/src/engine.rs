//! Exclusive accelerator sessions.

use crate::{
    Error, Result,
    accelerator::Accelerator,
    opcode::{Instruction, Status},
    regs::{
        LenId, MAX_MODULUS_BITS, MAX_REG_WORDS, REG_COUNT, Reg, RegPool, RegisterFile, SRAM_WORDS,
        ext_words,
    },
};
use spin::{Mutex, MutexGuard};

/// Register geometry of one session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionParams {
    /// Size of the modulus (size class [`LenId::N`]) in bits.
    pub modulus_bits: u32,

    /// Width every register must hold (size class [`LenId::MAX`]) in bits.
    ///
    /// Values below `modulus_bits` are raised to it.
    pub register_bits: u32,

    /// Registers requested, reserved ones included.
    pub reg_count: usize,
}

impl SessionParams {
    /// All registers, each as wide as the modulus.
    pub const fn new(modulus_bits: u32) -> Self {
        Self {
            modulus_bits,
            register_bits: modulus_bits,
            reg_count: REG_COUNT,
        }
    }

    /// Widen the registers beyond the modulus size.
    pub const fn with_register_bits(mut self, register_bits: u32) -> Self {
        self.register_bits = register_bits;
        self
    }

    /// Request a specific number of registers.
    pub const fn with_reg_count(mut self, reg_count: usize) -> Self {
        self.reg_count = reg_count;
        self
    }
}

impl Default for SessionParams {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Shared handle to a single accelerator.
///
/// Every operation runs inside an [`Engine`] session obtained from
/// [`Pka::lock`]; only one session exists at a time.
#[derive(Debug)]
pub struct Pka<A> {
    acc: Mutex<A>,
}

impl<A: Accelerator> Pka<A> {
    /// Wrap an accelerator.
    pub const fn new(acc: A) -> Self {
        Self {
            acc: Mutex::new(acc),
        }
    }

    /// Start a session, spinning until the accelerator is free.
    pub fn lock(&self) -> Engine<'_, A> {
        Engine::open(self.acc.lock())
    }

    /// Start a session if the accelerator is free.
    pub fn try_lock(&self) -> Option<Engine<'_, A>> {
        self.acc.try_lock().map(Engine::open)
    }

    /// Release the accelerator.
    pub fn into_inner(self) -> A {
        self.acc.into_inner()
    }

    /// Start a session and map registers for `params`.
    pub fn session(&self, params: SessionParams) -> Result<Engine<'_, A>> {
        let mut engine = self.lock();
        engine.init(params)?;
        Ok(engine)
    }
}

/// Exclusive session on the accelerator.
///
/// Dropping the session waits for the engine to go idle, wipes the whole
/// scratch memory, powers the engine down and releases the lock, on every
/// exit path.
pub struct Engine<'a, A: Accelerator> {
    acc: MutexGuard<'a, A>,
    regs: RegisterFile,
}

impl<'a, A: Accelerator> Engine<'a, A> {
    fn open(mut acc: MutexGuard<'a, A>) -> Self {
        acc.power_up();
        acc.wait_idle();
        let capacity = acc.sram_words().min(SRAM_WORDS);
        log::debug!("pka: session opened");

        Self {
            acc,
            regs: RegisterFile::new(capacity),
        }
    }

    /// Program size classes, map registers and clear them.
    ///
    /// Returns the number of registers actually mapped, which may be lower
    /// than requested when the registers are wide.
    pub fn init(&mut self, params: SessionParams) -> Result<usize> {
        let SessionParams {
            modulus_bits,
            register_bits,
            reg_count,
        } = params;

        if modulus_bits == 0 || modulus_bits > MAX_MODULUS_BITS {
            return Err(Error::UnsupportedModulusSize);
        }

        let register_bits = register_bits.max(modulus_bits);
        if register_bits > (MAX_REG_WORDS * 32) as u32 {
            return Err(Error::RegisterSizeExceeded);
        }

        let mut regs = RegisterFile::new(self.acc.sram_words().min(SRAM_WORDS));
        let count = regs.allocate(reg_count, ext_words(register_bits))?;
        regs.set_size_class(modulus_bits, LenId::N)?;
        regs.set_size_class(register_bits, LenId::MAX)?;

        self.acc.wait_idle();
        for (reg, addr) in regs.mapped() {
            self.acc.write_map(reg, addr);
        }
        for (len, bits) in regs.size_classes() {
            self.acc.write_size(len, bits);
        }
        let words = self.acc.sram_words();
        self.acc.clear_sram(0, words);

        self.regs = regs;
        log::debug!(
            "pka: session of {count} registers, modulus {modulus_bits} bits, \
             registers {register_bits} bits"
        );
        Ok(count)
    }

    /// Pool of the ordinary registers of this session.
    pub fn pool(&self) -> RegPool {
        self.regs.pool()
    }

    /// Register file of this session.
    pub fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    /// Size of the modulus size class in bits.
    pub fn modulus_bits(&self) -> Result<u32> {
        self.regs.size_class(LenId::N)
    }

    /// Width of each register in bits.
    pub fn register_bits(&self) -> u32 {
        (self.regs.reg_words() * 32) as u32
    }

    /// Set the operand width of an additional size class.
    pub fn set_size_class(&mut self, bits: u32, len: LenId) -> Result<()> {
        self.regs.set_size_class(bits, len)?;
        self.acc.wait_idle();
        self.acc.write_size(len, bits);
        Ok(())
    }

    /// Borrow the underlying accelerator.
    pub fn accelerator(&self) -> &A {
        &self.acc
    }

    /// Execute one instruction and map its error flags.
    pub fn exec(&mut self, instr: Instruction) -> Result<Status> {
        self.regs.size_class(instr.len)?;
        for reg in instr.registers() {
            self.regs.map_address(reg)?;
        }
        if instr.opcode.is_modular() {
            self.regs.map_address(Reg::N)?;
            self.regs.map_address(Reg::NP)?;
        }

        self.acc.wait_idle();
        let status = self.acc.execute(instr);
        log::trace!(
            "pka: {:?} len={} -> {:?}",
            instr.opcode,
            instr.len.index(),
            status
        );

        status.check().inspect_err(|err| {
            if *err == Error::FatalDevice {
                log::warn!("pka: device fault on {:?}", instr.opcode);
            }
        })
    }

    /// Write raw words into a register, zero-extending to its full width.
    pub fn write_words(&mut self, reg: Reg, words: &[u32]) -> Result<()> {
        let reg_words = self.regs.reg_words();
        if words.len() > reg_words {
            return Err(Error::InvalidBufferSize);
        }

        let addr = self.regs.map_address(reg)?;
        self.acc.wait_idle();
        self.acc.write_sram(addr, words);
        self.acc.clear_sram(addr + words.len(), reg_words - words.len());
        Ok(())
    }

    /// Read the low words of a register.
    pub fn read_words(&mut self, reg: Reg, words: &mut [u32]) -> Result<()> {
        if words.len() > self.regs.reg_words() {
            return Err(Error::InvalidBufferSize);
        }

        let addr = self.regs.map_address(reg)?;
        self.acc.wait_idle();
        self.acc.read_sram(addr, words);
        Ok(())
    }

    /// Zero a register without going through the opcode pipeline.
    pub fn wipe(&mut self, reg: Reg) -> Result<()> {
        let addr = self.regs.map_address(reg)?;
        self.acc.wait_idle();
        self.acc.clear_sram(addr, self.regs.reg_words());
        Ok(())
    }
}

impl<A: Accelerator> Drop for Engine<'_, A> {
    fn drop(&mut self) {
        self.acc.wait_idle();
        let words = self.acc.sram_words();
        self.acc.clear_sram(0, words);
        self.acc.power_down();
        log::debug!("pka: session closed");
    }
}

impl<A: Accelerator> core::fmt::Debug for Engine<'_, A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Engine")
            .field("regs", &self.regs)
            .finish_non_exhaustive()
    }
}
