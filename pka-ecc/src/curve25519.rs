//! Field arithmetic shared by X25519 and Ed25519: `GF(2^255 - 19)`.

use pka::{
    Accelerator, Engine, LeBytes, LeWords, LenId, NpMode, Operand, Reg, Result, regs::NP_WORDS,
};

/// Size of field elements, scalars and encodings in bytes.
pub(crate) const ENCODED_SIZE: usize = 32;

/// Bit length of `p`.
pub(crate) const FIELD_BITS: u32 = 255;

/// `p = 2^255 - 19`
pub(crate) const P: [u32; 8] = [
    0xffff_ffed,
    0xffff_ffff,
    0xffff_ffff,
    0xffff_ffff,
    0xffff_ffff,
    0xffff_ffff,
    0xffff_ffff,
    0x7fff_ffff,
];

/// Barrett tag of `p`.
pub(crate) const P_NP: [u32; NP_WORDS] = [0x0000_0000, 0x0000_0000, 0x80];

/// Make `p` the active modulus.
pub(crate) fn use_field<A: Accelerator>(engine: &mut Engine<'_, A>) -> Result<()> {
    engine.set_modulus(&LeWords(P), Some(&P_NP[..]), NpMode::Full)
}

/// `r = a^(p-2)`; `e` is overwritten.
pub(crate) fn invert<A: Accelerator>(
    engine: &mut Engine<'_, A>,
    r: Reg,
    a: Reg,
    e: Reg,
) -> Result<()> {
    engine.copy(LenId::MAX, e, Reg::N)?;
    engine.sub(LenId::MAX, e, e, Operand::Imm(2))?;
    engine.mod_exp(r, a, e)
}

/// Store the reduced value of `reg` as 32 little-endian bytes.
pub(crate) fn read_le<A: Accelerator>(
    engine: &mut Engine<'_, A>,
    reg: Reg,
    out: &mut [u8; ENCODED_SIZE],
) -> Result<()> {
    engine.copy_from_register(&mut LeBytes(&mut out[..]), reg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pka::{Pka, SessionParams, SoftPka};

    #[test]
    fn precomputed_tag_matches_engine() {
        let pka = Pka::new(SoftPka::new());
        let mut engine = pka.session(SessionParams::new(FIELD_BITS)).unwrap();
        engine.set_modulus(&LeWords(P), None, NpMode::Full).unwrap();

        assert_eq!(engine.read_np().unwrap(), P_NP);
    }

    #[test]
    fn inverse() {
        let pka = Pka::new(SoftPka::new());
        let mut engine = pka.session(SessionParams::new(FIELD_BITS)).unwrap();
        use_field(&mut engine).unwrap();

        let [a, r, e] = engine.pool().take_array().unwrap();
        engine.set_value(LenId::MAX, a, 9).unwrap();
        invert(&mut engine, r, a, e).unwrap();
        engine.mod_mul(r, r, a).unwrap();

        let mut out = [0u8; ENCODED_SIZE];
        read_le(&mut engine, r, &mut out).unwrap();
        assert_eq!(out[0], 1);
        assert!(out[1..].iter().all(|b| *b == 0));
    }
}
