//! Buffer-level long-integer services.
//!
//! Each call runs in its own session: buffers are loaded, the opcodes run,
//! results are stored and the scratch memory is wiped on release. Output
//! buffers are wiped when a call fails.

use crate::{
    Error, Result,
    accelerator::Accelerator,
    barrett::NpMode,
    buffer::{WordSink, WordSource, effective_bit_length},
    engine::{Pka, SessionParams},
    regs::{LenId, MAX_REG_WORDS},
};
use zeroize::Zeroizing;

/// Widest of the given bit lengths, at least one bit.
fn widest(bits: &[usize]) -> u32 {
    bits.iter().copied().max().unwrap_or(0).max(1) as u32
}

impl<A: Accelerator> Pka<A> {
    /// `quotient = a / b`, `remainder = a mod b`.
    pub fn long_divide(
        &self,
        a: &impl WordSource,
        b: &impl WordSource,
        quotient: &mut impl WordSink,
        remainder: &mut impl WordSink,
    ) -> Result<()> {
        let result = self.divide(a, b, quotient, remainder);
        if result.is_err() {
            quotient.wipe();
            remainder.wipe();
        }
        result
    }

    /// Low words of `a * b`: the product modulo `2^(32·w)` where `w` is the
    /// longer of the two operands in words.
    pub fn long_multiply_low(
        &self,
        a: &impl WordSource,
        b: &impl WordSource,
        out: &mut impl WordSink,
    ) -> Result<()> {
        let result = self.multiply_low(a, b, out);
        if result.is_err() {
            out.wipe();
        }
        result
    }

    /// `out = base ^ exp mod modulus`.
    pub fn mod_exp(
        &self,
        base: &impl WordSource,
        exp: &impl WordSource,
        modulus: &impl WordSource,
        out: &mut impl WordSink,
    ) -> Result<()> {
        let result = self.exponentiate(base, exp, modulus, out);
        if result.is_err() {
            out.wipe();
        }
        result
    }

    /// `out = a^-1 mod modulus`; even moduli are supported.
    pub fn mod_inverse(
        &self,
        a: &impl WordSource,
        modulus: &impl WordSource,
        out: &mut impl WordSink,
    ) -> Result<()> {
        let result = self.invert(a, modulus, out);
        if result.is_err() {
            out.wipe();
        }
        result
    }

    fn divide(
        &self,
        a: &impl WordSource,
        b: &impl WordSource,
        quotient: &mut impl WordSink,
        remainder: &mut impl WordSink,
    ) -> Result<()> {
        if b.bit_length() == 0 {
            return Err(Error::DivideByZero);
        }

        let bits = widest(&[a.bit_length(), b.bit_length()]);
        let mut engine = self.session(SessionParams::new(bits).with_reg_count(7))?;
        let [ra, rb, rq] = engine.pool().take_array()?;
        engine.copy_into_register(ra, a)?;
        engine.copy_into_register(rb, b)?;
        engine.div(LenId::MAX, rq, ra, rb)?;
        engine.copy_from_register(quotient, rq)?;
        engine.copy_from_register(remainder, ra)
    }

    fn multiply_low(
        &self,
        a: &impl WordSource,
        b: &impl WordSource,
        out: &mut impl WordSink,
    ) -> Result<()> {
        let words = a.word_len().max(b.word_len()).max(1);
        if words > MAX_REG_WORDS {
            return Err(Error::InvalidBufferSize);
        }

        let mut engine = self.session(SessionParams::new(32 * words as u32).with_reg_count(7))?;
        let [ra, rb, rp] = engine.pool().take_array()?;
        engine.copy_into_register(ra, a)?;
        engine.copy_into_register(rb, b)?;
        engine.mul_low(LenId::MAX, rp, ra, rb)?;

        let mut low = Zeroizing::new([0u32; MAX_REG_WORDS]);
        engine.read_words(rp, &mut low[..words])?;
        if effective_bit_length(&low[..words]) > out.bit_capacity() {
            return Err(Error::InvalidBufferSize);
        }

        for i in 0..out.capacity_words() {
            out.set_word(i, if i < words { low[i] } else { 0 });
        }
        Ok(())
    }

    fn exponentiate(
        &self,
        base: &impl WordSource,
        exp: &impl WordSource,
        modulus: &impl WordSource,
        out: &mut impl WordSink,
    ) -> Result<()> {
        let bits = widest(&[modulus.bit_length()]);
        let params = SessionParams::new(bits)
            .with_register_bits(widest(&[
                base.bit_length(),
                exp.bit_length(),
                modulus.bit_length(),
            ]))
            .with_reg_count(7);
        let mut engine = self.session(params)?;
        engine.set_modulus(modulus, None, NpMode::Auto)?;

        let [rb, re, rr] = engine.pool().take_array()?;
        engine.copy_into_register(rb, base)?;
        engine.copy_into_register(re, exp)?;
        engine.reduce(LenId::MAX, rb, rb)?;
        engine.mod_exp(rr, rb, re)?;
        engine.copy_from_register(out, rr)
    }

    fn invert(
        &self,
        a: &impl WordSource,
        modulus: &impl WordSource,
        out: &mut impl WordSink,
    ) -> Result<()> {
        let bits = widest(&[modulus.bit_length()]);
        let operands = widest(&[a.bit_length(), modulus.bit_length()]);

        // An even modulus needs room for `N·y` with `y < a`.
        let register_bits = if modulus.word(0) & 1 == 1 {
            operands
        } else {
            2 * operands + 1
        };

        let params = SessionParams::new(bits)
            .with_register_bits(register_bits)
            .with_reg_count(8);
        let mut engine = self.session(params)?;
        engine.set_modulus(modulus, None, NpMode::Auto)?;

        let [ra, rr, t0, t1] = engine.pool().take_array()?;
        engine.copy_into_register(ra, a)?;
        engine.reduce(LenId::MAX, ra, ra)?;
        if engine.is_zero(LenId::MAX, ra)? {
            return Err(Error::ModInverseNotExist);
        }

        engine.full_mod_inv(rr, ra, [t0, t1])?;
        engine.copy_from_register(out, rr)
    }
}

#[cfg(test)]
mod tests {
    use crate::{BeBytes, Error, LeWords, Pka, SoftPka};
    use hex_literal::hex;

    #[test]
    fn divide_words() {
        let pka = Pka::new(SoftPka::new());
        let a = LeWords([0x89ab_cdef, 0x0123_4567, 0x1]);
        let b = LeWords([0x1_0001]);
        let mut q = [0u32; 3];
        let mut r = [0u32; 1];
        pka.long_divide(&a, &b, &mut LeWords(&mut q), &mut LeWords(&mut r))
            .unwrap();

        let value = 0x1_0123_4567_89ab_cdefu128;
        let quotient = value / 0x1_0001;
        assert_eq!(q, [quotient as u32, (quotient >> 32) as u32, (quotient >> 64) as u32]);
        assert_eq!(r, [(value % 0x1_0001) as u32]);
    }

    #[test]
    fn divide_by_zero_wipes_outputs() {
        let pka = Pka::new(SoftPka::new());
        let mut q = [7u32; 2];
        let mut r = [7u32; 2];
        assert_eq!(
            pka.long_divide(
                &LeWords([5u32]),
                &LeWords([0u32]),
                &mut LeWords(&mut q),
                &mut LeWords(&mut r)
            ),
            Err(Error::DivideByZero)
        );
        assert_eq!(q, [0, 0]);
        assert_eq!(r, [0, 0]);
    }

    #[test]
    fn multiply_low_truncates() {
        let pka = Pka::new(SoftPka::new());
        let mut out = [0u32; 2];
        pka.long_multiply_low(
            &LeWords([u32::MAX, u32::MAX]),
            &LeWords([u32::MAX, u32::MAX]),
            &mut LeWords(&mut out),
        )
        .unwrap();
        // (2^64 - 1)^2 mod 2^64 = 1
        assert_eq!(out, [1, 0]);
    }

    #[test]
    fn exponent_and_inverse() {
        let pka = Pka::new(SoftPka::new());
        let n = hex!("c3f8a7d2b91e44f3");
        let mut out = [0u8; 8];
        pka.mod_exp(
            &BeBytes(hex!("0123456789abcdef")),
            &BeBytes(hex!("03")),
            &BeBytes(n),
            &mut BeBytes(&mut out),
        )
        .unwrap();
        let n_int = u64::from_be_bytes(n) as u128;
        let x = 0x0123_4567_89ab_cdefu128;
        assert_eq!(u64::from_be_bytes(out) as u128, x * x % n_int * x % n_int);

        pka.mod_inverse(&BeBytes(hex!("0123456789abcdef")), &BeBytes(n), &mut BeBytes(&mut out))
            .unwrap();
        assert_eq!(u64::from_be_bytes(out) as u128 * x % n_int, 1);
    }

    #[test]
    fn inverse_of_zero() {
        let pka = Pka::new(SoftPka::new());
        let mut out = [1u32; 2];
        assert_eq!(
            pka.mod_inverse(&LeWords([0u32]), &LeWords([97u32]), &mut LeWords(&mut out)),
            Err(Error::ModInverseNotExist)
        );
        assert_eq!(out, [0, 0]);
    }
}
