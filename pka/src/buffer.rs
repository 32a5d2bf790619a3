//! Register transfer through typed buffers.
//!
//! Buffers carry their byte order in their type: [`LeWords`] for
//! little-endian 32-bit words, [`BeBytes`] and [`LeBytes`] for byte strings.

use crate::{
    Error, Result,
    accelerator::Accelerator,
    engine::Engine,
    regs::{MAX_REG_WORDS, Reg},
};
use zeroize::Zeroizing;

/// Source of little-endian 32-bit words.
pub trait WordSource {
    /// Number of words available.
    fn word_len(&self) -> usize;

    /// Word at `index`, zero past the end.
    fn word(&self, index: usize) -> u32;

    /// Bit length of the value held.
    fn bit_length(&self) -> usize {
        (0..self.word_len())
            .rev()
            .find_map(|i| match self.word(i) {
                0 => None,
                w => Some(i * 32 + (32 - w.leading_zeros() as usize)),
            })
            .unwrap_or(0)
    }
}

/// Destination of little-endian 32-bit words.
pub trait WordSink {
    /// Number of words the sink spans.
    fn capacity_words(&self) -> usize;

    /// Largest value size the sink can hold, in bits.
    fn bit_capacity(&self) -> usize;

    /// Store the word at `index`. Bits beyond the capacity are dropped.
    fn set_word(&mut self, index: usize, word: u32);

    /// Zero the whole sink.
    fn wipe(&mut self) {
        for i in 0..self.capacity_words() {
            self.set_word(i, 0);
        }
    }
}

/// Little-endian 32-bit words.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeWords<T>(pub T);

/// Big-endian bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BeBytes<T>(pub T);

/// Little-endian bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeBytes<T>(pub T);

impl<T: AsRef<[u32]>> WordSource for LeWords<T> {
    fn word_len(&self) -> usize {
        self.0.as_ref().len()
    }

    fn word(&self, index: usize) -> u32 {
        self.0.as_ref().get(index).copied().unwrap_or(0)
    }
}

impl<T: AsRef<[u32]> + AsMut<[u32]>> WordSink for LeWords<T> {
    fn capacity_words(&self) -> usize {
        self.0.as_ref().len()
    }

    fn bit_capacity(&self) -> usize {
        self.0.as_ref().len() * 32
    }

    fn set_word(&mut self, index: usize, word: u32) {
        if let Some(w) = self.0.as_mut().get_mut(index) {
            *w = word;
        }
    }
}

impl<T: AsRef<[u8]>> WordSource for BeBytes<T> {
    fn word_len(&self) -> usize {
        self.0.as_ref().len().div_ceil(4)
    }

    fn word(&self, index: usize) -> u32 {
        let bytes = self.0.as_ref();
        (0..4).fold(0, |acc, k| {
            let pos = index * 4 + k;
            let byte = match bytes.len().checked_sub(pos + 1) {
                Some(i) => bytes[i],
                None => 0,
            };
            acc | (byte as u32) << (8 * k)
        })
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> WordSink for BeBytes<T> {
    fn capacity_words(&self) -> usize {
        self.0.as_ref().len().div_ceil(4)
    }

    fn bit_capacity(&self) -> usize {
        self.0.as_ref().len() * 8
    }

    fn set_word(&mut self, index: usize, word: u32) {
        let bytes = self.0.as_mut();
        let len = bytes.len();
        for (k, byte) in word.to_le_bytes().into_iter().enumerate() {
            if let Some(i) = len.checked_sub(index * 4 + k + 1) {
                bytes[i] = byte;
            }
        }
    }
}

impl<T: AsRef<[u8]>> WordSource for LeBytes<T> {
    fn word_len(&self) -> usize {
        self.0.as_ref().len().div_ceil(4)
    }

    fn word(&self, index: usize) -> u32 {
        let bytes = self.0.as_ref();
        (0..4).fold(0, |acc, k| {
            let byte = bytes.get(index * 4 + k).copied().unwrap_or(0);
            acc | (byte as u32) << (8 * k)
        })
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> WordSink for LeBytes<T> {
    fn capacity_words(&self) -> usize {
        self.0.as_ref().len().div_ceil(4)
    }

    fn bit_capacity(&self) -> usize {
        self.0.as_ref().len() * 8
    }

    fn set_word(&mut self, index: usize, word: u32) {
        let bytes = self.0.as_mut();
        for (k, byte) in word.to_le_bytes().into_iter().enumerate() {
            if let Some(b) = bytes.get_mut(index * 4 + k) {
                *b = byte;
            }
        }
    }
}

/// Position of the highest set bit plus one; zero for an all-zero buffer.
pub fn effective_bit_length(words: &[u32]) -> usize {
    LeWords(words).bit_length()
}

impl<A: Accelerator> Engine<'_, A> {
    /// Load a buffer into a register.
    ///
    /// Fails with [`Error::InvalidBufferSize`] if the value does not fit the
    /// register.
    pub fn copy_into_register(&mut self, dst: Reg, src: &impl WordSource) -> Result<()> {
        let reg_words = self.registers().reg_words();
        if src.bit_length() > reg_words * 32 {
            return Err(Error::InvalidBufferSize);
        }

        let mut words = Zeroizing::new([0u32; MAX_REG_WORDS]);
        for (i, w) in words[..reg_words].iter_mut().enumerate() {
            *w = src.word(i);
        }
        self.write_words(dst, &words[..reg_words])
    }

    /// Store a register into a buffer.
    ///
    /// Fails with [`Error::InvalidBufferSize`] if the value does not fit the
    /// buffer; the buffer is wiped in that case.
    pub fn copy_from_register(&mut self, dst: &mut impl WordSink, src: Reg) -> Result<()> {
        let reg_words = self.registers().reg_words();
        let mut words = Zeroizing::new([0u32; MAX_REG_WORDS]);
        self.read_words(src, &mut words[..reg_words])?;

        if effective_bit_length(&words[..reg_words]) > dst.bit_capacity() {
            dst.wipe();
            return Err(Error::InvalidBufferSize);
        }

        for i in 0..dst.capacity_words() {
            dst.set_word(i, words.get(i).copied().unwrap_or(0));
        }
        Ok(())
    }

    /// Bit length of the value held in a register.
    pub fn bit_length(&mut self, src: Reg) -> Result<usize> {
        let reg_words = self.registers().reg_words();
        let mut words = Zeroizing::new([0u32; MAX_REG_WORDS]);
        self.read_words(src, &mut words[..reg_words])?;
        Ok(effective_bit_length(&words[..reg_words]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn be_bytes_words() {
        let src = BeBytes(hex!("0102030405"));
        assert_eq!(src.word_len(), 2);
        assert_eq!(src.word(0), 0x0203_0405);
        assert_eq!(src.word(1), 0x01);
        assert_eq!(src.word(2), 0);
        assert_eq!(src.bit_length(), 33);

        let mut out = BeBytes([0u8; 5]);
        out.set_word(0, 0x0203_0405);
        out.set_word(1, 0xffff_ff01);
        assert_eq!(out.0, hex!("0102030405"));

        // a byte string is both a source and a sink
        assert_eq!(out.capacity_words(), 2);
        assert_eq!(out.word_len(), 2);
        assert_eq!(out.word(1), 0x01);
        out.wipe();
        assert_eq!(out.bit_length(), 0);
    }

    #[test]
    fn le_bytes_words() {
        let src = LeBytes(hex!("0504030201"));
        assert_eq!(src.word(0), 0x0203_0405);
        assert_eq!(src.word(1), 0x01);

        let mut out = LeBytes([0u8; 5]);
        out.set_word(0, 0x0203_0405);
        out.set_word(1, 0x01);
        assert_eq!(out.0, hex!("0504030201"));
    }

    #[test]
    fn effective_bits() {
        assert_eq!(effective_bit_length(&[]), 0);
        assert_eq!(effective_bit_length(&[0, 0, 0]), 0);
        assert_eq!(effective_bit_length(&[0xffff_ffff, 1, 0]), 33);
        assert_eq!(effective_bit_length(&[0, 0, 0x8000_0000]), 96);
    }
}
