//! Virtual register file.
//!
//! The accelerator works on a fixed scratch memory. Operands are addressed
//! through 32 virtual registers which are mapped onto equally sized slices of
//! that memory, and every opcode reads its operand width from one of eight
//! size classes.

use crate::{Error, Result};
use subtle::{Choice, ConditionallySelectable};

/// Number of virtual registers.
pub const REG_COUNT: usize = 32;

/// Number of operand size classes.
pub const LEN_COUNT: usize = 8;

/// Size of the accelerator's internal word in bits (`A`).
pub const PKA_WORD_BITS: u32 = 64;

/// Extra bits kept above the modulus size for partial reduction (`X`).
pub const EXTRA_BITS: u32 = 8;

/// Scratch memory size in 32-bit words (6 KiB).
pub const SRAM_WORDS: usize = 1536;

/// Largest register supported, in 32-bit words.
pub const MAX_REG_WORDS: usize = 136;

/// Largest modulus supported, in bits.
pub const MAX_MODULUS_BITS: u32 = 4096;

/// Size of a Barrett tag in 32-bit words.
pub const NP_WORDS: usize = 3;

/// Smallest register file that still leaves one ordinary register.
const MIN_REGS: usize = 5;

/// Register width in bits needed to process `bits`-bit operands.
///
/// The operand is extended by [`EXTRA_BITS`], rounded up to whole
/// accelerator words and then extended by one more word.
pub const fn ext_bits(bits: u32) -> u32 {
    (bits + EXTRA_BITS).div_ceil(PKA_WORD_BITS) * PKA_WORD_BITS + PKA_WORD_BITS
}

/// Register width in 32-bit words needed to process `bits`-bit operands.
pub const fn ext_words(bits: u32) -> usize {
    (ext_bits(bits) / u32::BITS) as usize
}

/// Virtual register handle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Reg(u8);

impl Reg {
    /// Register holding the active modulus.
    pub const N: Reg = Reg(0);

    /// Register holding the Barrett tag of the active modulus.
    pub const NP: Reg = Reg(1);

    /// First accelerator temporary.
    pub const T0: Reg = Reg(30);

    /// Second accelerator temporary.
    pub const T1: Reg = Reg(31);

    /// Create a register handle from its index.
    pub const fn new(index: u8) -> Result<Self> {
        if (index as usize) < REG_COUNT {
            Ok(Reg(index))
        } else {
            Err(Error::IllegalOperand)
        }
    }

    /// Index of this register.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Is this one of `N`, `NP`, `T0` or `T1`?
    pub const fn is_reserved(self) -> bool {
        matches!(self.0, 0 | 1 | 30 | 31)
    }
}

impl ConditionallySelectable for Reg {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Reg(u8::conditional_select(&a.0, &b.0, choice))
    }
}

/// Operand size class handle (`lenId`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LenId(u8);

impl LenId {
    /// Size class of the active modulus.
    pub const N: LenId = LenId(0);

    /// Size class spanning a whole register.
    ///
    /// Every opcode zero-extends its result to this width.
    pub const MAX: LenId = LenId(1);

    /// Create a size class handle from its index.
    pub const fn new(index: u8) -> Result<Self> {
        if (index as usize) < LEN_COUNT {
            Ok(LenId(index))
        } else {
            Err(Error::IllegalOperand)
        }
    }

    /// Index of this size class.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Host-side shadow of the accelerator's memory map and size table.
#[derive(Clone, Debug)]
pub struct RegisterFile {
    map: [Option<usize>; REG_COUNT],
    sizes: [Option<u32>; LEN_COUNT],
    reg_words: usize,
    count: usize,
    capacity: usize,
}

impl RegisterFile {
    /// Create an empty register file over `capacity` words of scratch memory.
    pub const fn new(capacity: usize) -> Self {
        Self {
            map: [None; REG_COUNT],
            sizes: [None; LEN_COUNT],
            reg_words: 0,
            count: 0,
            capacity,
        }
    }

    /// Map `count` registers of `reg_words` words each.
    ///
    /// `count` includes the reserved registers. When the scratch memory cannot
    /// hold all of them, as many as fit are mapped. Returns the number of
    /// registers actually mapped.
    pub fn allocate(&mut self, count: usize, reg_words: usize) -> Result<usize> {
        if !(MIN_REGS..=REG_COUNT).contains(&count) {
            return Err(Error::RegsCountExceeded);
        }

        if reg_words == 0 || reg_words > MAX_REG_WORDS || self.capacity / reg_words < MIN_REGS {
            return Err(Error::RegisterSizeExceeded);
        }

        let actual = count.min(self.capacity / reg_words);
        let ordinary = actual - 2;

        self.map = [None; REG_COUNT];
        for (index, slot) in self.map.iter_mut().enumerate().take(ordinary) {
            *slot = Some(index * reg_words);
        }
        self.map[Reg::T0.index()] = Some(ordinary * reg_words);
        self.map[Reg::T1.index()] = Some((ordinary + 1) * reg_words);

        self.reg_words = reg_words;
        self.count = actual;
        log::debug!("pka: mapped {actual} registers of {reg_words} words");
        Ok(actual)
    }

    /// Physical word address of a virtual register.
    pub fn map_address(&self, reg: Reg) -> Result<usize> {
        self.map[reg.index()].ok_or(Error::IllegalOperand)
    }

    /// Is `reg` mapped onto scratch memory?
    pub fn is_mapped(&self, reg: Reg) -> bool {
        self.map[reg.index()].is_some()
    }

    /// Set the operand width of a size class.
    pub fn set_size_class(&mut self, bits: u32, len: LenId) -> Result<()> {
        if bits == 0 {
            return Err(Error::InvalidInputValue);
        }

        if self.reg_words != 0 && ext_words(bits) > self.reg_words {
            return Err(Error::RegisterSizeExceeded);
        }

        self.sizes[len.index()] = Some(bits);
        Ok(())
    }

    /// Exact operand width in bits of a size class.
    pub fn size_class(&self, len: LenId) -> Result<u32> {
        self.sizes[len.index()].ok_or(Error::IllegalOperand)
    }

    /// Word-extended operand width of a size class.
    pub fn op_words(&self, len: LenId) -> Result<usize> {
        Ok(ext_words(self.size_class(len)?))
    }

    /// Width of every mapped register in words.
    pub fn reg_words(&self) -> usize {
        self.reg_words
    }

    /// Number of mapped registers.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Iterate over mapped registers and their addresses.
    pub fn mapped(&self) -> impl Iterator<Item = (Reg, usize)> + '_ {
        self.map
            .iter()
            .enumerate()
            .filter_map(|(index, addr)| addr.map(|addr| (Reg(index as u8), addr)))
    }

    /// Iterate over the configured size classes.
    pub fn size_classes(&self) -> impl Iterator<Item = (LenId, u32)> + '_ {
        self.sizes
            .iter()
            .enumerate()
            .filter_map(|(index, bits)| bits.map(|bits| (LenId(index as u8), bits)))
    }

    /// Pool of the ordinary (non-reserved) registers.
    pub fn pool(&self) -> RegPool {
        RegPool {
            next: 2,
            end: self.count.saturating_sub(2) as u8,
        }
    }
}

/// Hands out the ordinary registers of a session.
#[derive(Clone, Debug)]
pub struct RegPool {
    next: u8,
    end: u8,
}

impl RegPool {
    /// Take the next free register.
    pub fn take(&mut self) -> Result<Reg> {
        if self.next >= self.end {
            return Err(Error::RegsCountExceeded);
        }

        let reg = Reg(self.next);
        self.next += 1;
        Ok(reg)
    }

    /// Take `K` registers at once.
    pub fn take_array<const K: usize>(&mut self) -> Result<[Reg; K]> {
        if self.remaining() < K {
            return Err(Error::RegsCountExceeded);
        }

        let mut regs = [Reg::N; K];
        for reg in regs.iter_mut() {
            *reg = self.take()?;
        }
        Ok(regs)
    }

    /// Number of registers left.
    pub fn remaining(&self) -> usize {
        self.end.saturating_sub(self.next) as usize
    }
}
