//! Memory-mapped accelerator backend.
//!
//! Instructions are written as encoded opcode words to the `OPCODE`
//! register; the scratch memory is reached through an auto-incrementing
//! address/data register pair.

use crate::{
    accelerator::Accelerator,
    opcode::{Instruction, Status},
    regs::{LenId, Reg, SRAM_WORDS},
};
use core::sync::atomic::{Ordering::SeqCst, compiler_fence};

/// Register offsets in bytes from the base of the register block.
pub mod offset {
    /// Virtual register map, one word per register.
    pub const MEMORY_MAP: usize = 0x000;
    /// Opcode word; writing starts the instruction.
    pub const OPCODE: usize = 0x080;
    /// Status flags of the last instruction.
    pub const STATUS: usize = 0x088;
    /// Size table, one word per size class.
    pub const SIZE_TABLE: usize = 0x090;
    /// Non-zero when a new opcode can be accepted.
    pub const PIPE_RDY: usize = 0x0B0;
    /// Non-zero when the last opcode completed.
    pub const DONE: usize = 0x0B4;
    /// Engine clock enable.
    pub const CLK_ENABLE: usize = 0x0BC;
    /// Scratch write address, in words.
    pub const SRAM_ADDR: usize = 0x0C0;
    /// Scratch write data; increments the write address.
    pub const SRAM_WDATA: usize = 0x0C4;
    /// Scratch read data; increments the read address.
    pub const SRAM_RDATA: usize = 0x0C8;
    /// Writing `n` zeroes `n` words from the write address.
    pub const SRAM_WR_CLR: usize = 0x0CC;
    /// Scratch read address, in words.
    pub const SRAM_RADDR: usize = 0x0D0;
}

/// Access to the accelerator's register block.
pub trait PkaRegisters {
    /// Read the register at `offset`.
    fn read(&mut self, offset: usize) -> u32;

    /// Write the register at `offset`.
    fn write(&mut self, offset: usize, value: u32);
}

/// Accelerator driven through its register block.
#[derive(Debug)]
pub struct MmioPka<R> {
    regs: R,
    sram_words: usize,
}

impl<R: PkaRegisters> MmioPka<R> {
    /// Drive the accelerator behind `regs` with the default scratch size.
    pub fn new(regs: R) -> Self {
        Self::with_sram_words(regs, SRAM_WORDS)
    }

    /// Drive an accelerator with a smaller scratch memory.
    pub fn with_sram_words(regs: R, sram_words: usize) -> Self {
        Self {
            regs,
            sram_words: sram_words.min(SRAM_WORDS),
        }
    }

    /// Release the register block.
    pub fn free(self) -> R {
        self.regs
    }

    fn poll(&mut self, offset: usize) {
        while self.regs.read(offset) == 0 {
            core::hint::spin_loop();
        }
    }
}

impl<R: PkaRegisters> Accelerator for MmioPka<R> {
    fn power_up(&mut self) {
        self.regs.write(offset::CLK_ENABLE, 1);
    }

    fn power_down(&mut self) {
        self.regs.write(offset::CLK_ENABLE, 0);
    }

    fn wait_idle(&mut self) {
        self.poll(offset::PIPE_RDY);
        self.poll(offset::DONE);
    }

    fn sram_words(&self) -> usize {
        self.sram_words
    }

    fn write_map(&mut self, reg: Reg, addr: usize) {
        self.regs
            .write(offset::MEMORY_MAP + 4 * reg.index(), addr as u32);
    }

    fn write_size(&mut self, len: LenId, bits: u32) {
        self.regs.write(offset::SIZE_TABLE + 4 * len.index(), bits);
    }

    fn write_sram(&mut self, addr: usize, words: &[u32]) {
        compiler_fence(SeqCst);
        self.regs.write(offset::SRAM_ADDR, addr as u32);
        for w in words {
            self.regs.write(offset::SRAM_WDATA, *w);
        }
        compiler_fence(SeqCst);
    }

    fn read_sram(&mut self, addr: usize, words: &mut [u32]) {
        compiler_fence(SeqCst);
        self.regs.write(offset::SRAM_RADDR, addr as u32);
        for w in words.iter_mut() {
            *w = self.regs.read(offset::SRAM_RDATA);
        }
        compiler_fence(SeqCst);
    }

    fn clear_sram(&mut self, addr: usize, count: usize) {
        self.regs.write(offset::SRAM_ADDR, addr as u32);
        self.regs.write(offset::SRAM_WR_CLR, count as u32);
    }

    fn execute(&mut self, instr: Instruction) -> Status {
        self.poll(offset::PIPE_RDY);
        self.regs.write(offset::OPCODE, instr.encode());
        self.poll(offset::DONE);
        Status::from_bits_truncate(self.regs.read(offset::STATUS))
    }
}

#[allow(unsafe_code)]
mod volatile {
    use super::PkaRegisters;
    use core::ptr::{read_volatile, write_volatile};

    /// Register block at a fixed physical address.
    #[derive(Debug)]
    pub struct VolatileRegisters {
        base: usize,
    }

    impl VolatileRegisters {
        /// Access the register block at `base`.
        ///
        /// # Safety
        ///
        /// `base` must be the address of an accelerator register block that
        /// nothing else accesses while this value is alive.
        pub const unsafe fn new(base: usize) -> Self {
            Self { base }
        }
    }

    impl PkaRegisters for VolatileRegisters {
        fn read(&mut self, offset: usize) -> u32 {
            // SAFETY: the caller of `new` vouched for the register block.
            unsafe { read_volatile((self.base + offset) as *const u32) }
        }

        fn write(&mut self, offset: usize, value: u32) {
            // SAFETY: the caller of `new` vouched for the register block.
            unsafe { write_volatile((self.base + offset) as *mut u32, value) }
        }
    }
}

pub use volatile::VolatileRegisters;
