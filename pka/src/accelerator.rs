//! Abstract accelerator device.

use crate::{
    opcode::{Instruction, Status},
    regs::{LenId, Reg},
};

/// Contract every accelerator backend satisfies.
///
/// The device owns a scratch memory of [`Accelerator::sram_words`] 32-bit
/// words, a table mapping virtual registers onto scratch addresses and a
/// table of operand sizes. Instructions execute atomically and report their
/// outcome through [`Status`].
///
/// Addresses and lengths passed to the memory accessors are validated by
/// [`Engine`](crate::Engine); backends may ignore out-of-range accesses.
pub trait Accelerator {
    /// Enable the engine clock.
    fn power_up(&mut self);

    /// Disable the engine clock.
    fn power_down(&mut self);

    /// Busy-wait until the engine is idle.
    fn wait_idle(&mut self);

    /// Size of the scratch memory in 32-bit words.
    fn sram_words(&self) -> usize;

    /// Map a virtual register onto a scratch address.
    fn write_map(&mut self, reg: Reg, addr: usize);

    /// Set the exact operand width of a size class.
    fn write_size(&mut self, len: LenId, bits: u32);

    /// Write words into scratch memory.
    fn write_sram(&mut self, addr: usize, words: &[u32]);

    /// Read words from scratch memory.
    fn read_sram(&mut self, addr: usize, words: &mut [u32]);

    /// Zero `count` words of scratch memory.
    fn clear_sram(&mut self, addr: usize, count: usize);

    /// Execute one instruction to completion.
    fn execute(&mut self, instr: Instruction) -> Status;
}

impl<A: Accelerator + ?Sized> Accelerator for &mut A {
    fn power_up(&mut self) {
        (**self).power_up()
    }

    fn power_down(&mut self) {
        (**self).power_down()
    }

    fn wait_idle(&mut self) {
        (**self).wait_idle()
    }

    fn sram_words(&self) -> usize {
        (**self).sram_words()
    }

    fn write_map(&mut self, reg: Reg, addr: usize) {
        (**self).write_map(reg, addr)
    }

    fn write_size(&mut self, len: LenId, bits: u32) {
        (**self).write_size(len, bits)
    }

    fn write_sram(&mut self, addr: usize, words: &[u32]) {
        (**self).write_sram(addr, words)
    }

    fn read_sram(&mut self, addr: usize, words: &mut [u32]) {
        (**self).read_sram(addr, words)
    }

    fn clear_sram(&mut self, addr: usize, count: usize) {
        (**self).clear_sram(addr, count)
    }

    fn execute(&mut self, instr: Instruction) -> Status {
        (**self).execute(instr)
    }
}
