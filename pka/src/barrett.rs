//! Barrett tag computation.
//!
//! Modular opcodes reduce with the tag `Np = floor(2^(N+A+X-1) / n)` held
//! in [`Reg::NP`], where `N` is the bit length of the modulus `n`. For large
//! moduli a truncated tag computed from the top `K = 2(A+X)` bits of the
//! modulus is used instead; it never exceeds the full tag.

use crate::{
    Error, Result,
    accelerator::Accelerator,
    buffer::WordSource,
    engine::Engine,
    opcode::Operand,
    regs::{EXTRA_BITS, LenId, NP_WORDS, PKA_WORD_BITS, Reg},
};

/// `A + X - 1`
pub(crate) const NP_SHIFT_BITS: u32 = PKA_WORD_BITS + EXTRA_BITS - 1;

/// Modulus bits kept by the truncated tag (`K`).
pub const TRUNCATED_NP_BITS: u32 = 2 * (PKA_WORD_BITS + EXTRA_BITS);

/// Moduli above this size get a truncated tag in [`NpMode::Auto`].
pub const AUTO_TRUNCATE_ABOVE: u32 = 2048;

/// Form of the Barrett tag to compute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NpMode {
    /// `floor(2^(N+A+X-1) / n)`
    Full,

    /// `floor(2^(K+A+X-1) / (floor(n / 2^(N-K)) + 1))`; moduli of at most
    /// `K` bits get the full tag.
    Truncated,

    /// Truncated above [`AUTO_TRUNCATE_ABOVE`] bits, full otherwise.
    #[default]
    Auto,
}

impl NpMode {
    fn truncates(self, bits: u32) -> bool {
        bits > TRUNCATED_NP_BITS
            && match self {
                NpMode::Full => false,
                NpMode::Truncated => true,
                NpMode::Auto => bits > AUTO_TRUNCATE_ABOVE,
            }
    }
}

impl<A: Accelerator> Engine<'_, A> {
    /// Load the active modulus into [`Reg::N`] and its tag into [`Reg::NP`].
    ///
    /// A precomputed tag must be exactly [`NP_WORDS`] long; otherwise the
    /// tag is computed on the accelerator in the form selected by `mode`.
    pub fn set_modulus(
        &mut self,
        src: &impl WordSource,
        np: Option<&[u32]>,
        mode: NpMode,
    ) -> Result<()> {
        let bits = src.bit_length() as u32;
        if bits == 0 {
            return Err(Error::InvalidInputValue);
        }
        if bits > self.modulus_bits()? {
            return Err(Error::UnsupportedModulusSize);
        }

        self.copy_into_register(Reg::N, src)?;

        match np {
            Some(tag) if tag.len() == NP_WORDS => self.write_words(Reg::NP, tag),
            Some(_) => Err(Error::InvalidBufferSize),
            None if mode.truncates(bits) => {
                self.shift_right(
                    LenId::MAX,
                    Reg::N,
                    Reg::N,
                    bits - TRUNCATED_NP_BITS,
                    false,
                )?;
                self.add(LenId::MAX, Reg::N, Reg::N, Operand::Imm(1))?;
                let computed = self.compute_np(TRUNCATED_NP_BITS + NP_SHIFT_BITS);
                self.copy_into_register(Reg::N, src)?;
                computed
            }
            None => self.compute_np(bits + NP_SHIFT_BITS),
        }
    }

    /// `NP = floor(2^shift / N)` for the modulus currently resident in `N`.
    ///
    /// Clobbers [`Reg::T0`] and [`Reg::T1`].
    pub(crate) fn compute_np(&mut self, shift: u32) -> Result<()> {
        self.set_value(LenId::MAX, Reg::T1, 1)?;
        self.div_long_num(Reg::T1, shift, Reg::N, Reg::NP)?;
        self.clear(LenId::MAX, Reg::T1)
    }

    /// Read the tag of the active modulus.
    pub fn read_np(&mut self) -> Result<[u32; NP_WORDS]> {
        let mut np = [0u32; NP_WORDS];
        self.read_words(Reg::NP, &mut np)?;
        Ok(np)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BeBytes, LeWords, Pka, SessionParams, SoftPka};
    use hex_literal::hex;

    const P256: [u8; 32] = hex!("ffffffff00000001000000000000000000000000ffffffffffffffffffffffff");

    #[test]
    fn p256_full_tag() {
        let pka = Pka::new(SoftPka::new());
        let mut engine = pka.session(SessionParams::new(256)).unwrap();
        engine
            .set_modulus(&BeBytes(P256), None, NpMode::Full)
            .unwrap();
        // floor(2^327 / p)
        assert_eq!(engine.read_np().unwrap(), [0xffff_ffff, 0x7f, 0x80]);
    }

    #[test]
    fn precomputed_tag_length() {
        let pka = Pka::new(SoftPka::new());
        let mut engine = pka.session(SessionParams::new(256)).unwrap();
        assert_eq!(
            engine.set_modulus(&BeBytes(P256), Some(&[1, 2]), NpMode::Full),
            Err(Error::InvalidBufferSize)
        );
        assert_eq!(
            engine.set_modulus(&LeWords([0u32; 8]), None, NpMode::Full),
            Err(Error::InvalidInputValue)
        );
    }

    #[test]
    fn truncated_tag_never_exceeds_full() {
        // 2^1000 - 1 is odd and large enough to take the truncated path.
        let mut n = [u32::MAX; 1000 / 32 + 1];
        n[1000 / 32] = (1 << (1000 % 32)) - 1;

        let pka = Pka::new(SoftPka::new());
        let mut engine = pka.session(SessionParams::new(1000)).unwrap();
        engine.set_modulus(&LeWords(n), None, NpMode::Full).unwrap();
        let full = engine.read_np().unwrap();
        engine
            .set_modulus(&LeWords(n), None, NpMode::Truncated)
            .unwrap();
        let truncated = engine.read_np().unwrap();

        let value = |np: [u32; NP_WORDS]| {
            np.iter()
                .rev()
                .fold(0u128, |acc, w| (acc << 32) | *w as u128)
        };
        assert!(value(truncated) <= value(full));
        assert!(value(full) - value(truncated) <= 2);
    }
}
