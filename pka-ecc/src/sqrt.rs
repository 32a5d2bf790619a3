//! Square roots and Jacobi symbols modulo the active prime.
//!
//! Everything here is composed from ordinary opcodes against the modulus
//! resident in [`Reg::N`].

use core::{cmp::Ordering, mem};
use pka::{Accelerator, Engine, Error, LenId, Operand, Reg, Result};

/// Low word of a register.
fn low_word<A: Accelerator>(engine: &mut Engine<'_, A>, reg: Reg) -> Result<u32> {
    let mut word = [0u32; 1];
    engine.read_words(reg, &mut word)?;
    Ok(word[0])
}

/// `r = √v mod N`, one of the two roots.
///
/// `v` must be reduced and `r` distinct from `v` and `scratch`. Fails with
/// [`Error::ModSquareRootNotExist`] for a quadratic non-residue. Uses
/// [`Reg::T0`].
pub(crate) fn mod_sqrt<A: Accelerator>(
    engine: &mut Engine<'_, A>,
    r: Reg,
    v: Reg,
    scratch: [Reg; 6],
) -> Result<()> {
    if engine.is_zero(LenId::N, v)? {
        return engine.clear(LenId::MAX, r);
    }

    match low_word(engine, Reg::N)? & 7 {
        3 | 7 => sqrt_3_mod_4(engine, r, v, scratch[0])?,
        5 => sqrt_5_mod_8(engine, r, v, scratch)?,
        _ => tonelli_shanks(engine, r, v, scratch)?,
    }

    let square = scratch[0];
    engine.mod_mul(square, r, r)?;
    if engine.compare(LenId::N, square, v)? != Ordering::Equal {
        return Err(Error::ModSquareRootNotExist);
    }
    Ok(())
}

/// `r = v^((p+1)/4)`
fn sqrt_3_mod_4<A: Accelerator>(engine: &mut Engine<'_, A>, r: Reg, v: Reg, e: Reg) -> Result<()> {
    engine.copy(LenId::MAX, e, Reg::N)?;
    engine.add(LenId::MAX, e, e, Operand::Imm(1))?;
    engine.shift_right(LenId::MAX, e, e, 2, false)?;
    engine.mod_exp(r, v, e)
}

/// Atkin's formula: with `w = (2v)^((p-5)/8)` and `i = 2v·w²`,
/// `r = v·w·(i - 1)`.
fn sqrt_5_mod_8<A: Accelerator>(
    engine: &mut Engine<'_, A>,
    r: Reg,
    v: Reg,
    scratch: [Reg; 6],
) -> Result<()> {
    let [e, v2, w, i, ..] = scratch;

    engine.copy(LenId::MAX, e, Reg::N)?;
    engine.sub(LenId::MAX, e, e, Operand::imm(5)?)?;
    engine.shift_right(LenId::MAX, e, e, 3, false)?;

    engine.mod_add(v2, v, v)?;
    engine.mod_exp(w, v2, e)?;
    engine.mod_mul(i, w, w)?;
    engine.mod_mul(i, i, v2)?;
    engine.mod_sub(i, i, Operand::Imm(1))?;
    engine.mod_mul(r, v, w)?;
    engine.mod_mul(r, r, i)
}

/// Tonelli–Shanks for `p ≡ 1 (mod 8)`.
fn tonelli_shanks<A: Accelerator>(
    engine: &mut Engine<'_, A>,
    r: Reg,
    v: Reg,
    scratch: [Reg; 6],
) -> Result<()> {
    let [q, z, c, t, b, _] = scratch;

    // p - 1 = q·2^s with q odd
    engine.copy(LenId::MAX, q, Reg::N)?;
    engine.sub(LenId::MAX, q, q, Operand::Imm(1))?;
    let mut s = 0u32;
    while !engine.test_bit(LenId::MAX, q, 0)? {
        engine.shift_right(LenId::MAX, q, q, 1, false)?;
        s += 1;
    }

    // smallest quadratic non-residue
    engine.set_value(LenId::MAX, z, 2)?;
    while jacobi(engine, z, [c, t, b])? != -1 {
        engine.add(LenId::MAX, z, z, Operand::Imm(1))?;
    }

    engine.mod_exp(c, z, q)?;
    engine.mod_exp(t, v, q)?;
    engine.add(LenId::MAX, q, q, Operand::Imm(1))?;
    engine.shift_right(LenId::MAX, q, q, 1, false)?;
    engine.mod_exp(r, v, q)?;

    let mut m = s;
    while engine.compare(LenId::N, t, Operand::Imm(1))? != Ordering::Equal {
        // least i with t^(2^i) = 1
        engine.copy(LenId::MAX, b, t)?;
        let mut i = 0;
        while engine.compare(LenId::N, b, Operand::Imm(1))? != Ordering::Equal {
            engine.mod_mul(b, b, b)?;
            i += 1;
            if i == m {
                return Err(Error::ModSquareRootNotExist);
            }
        }

        // b = c^(2^(m-i-1))
        engine.copy(LenId::MAX, b, c)?;
        for _ in 0..m - i - 1 {
            engine.mod_mul(b, b, b)?;
        }

        m = i;
        engine.mod_mul(c, b, b)?;
        engine.mod_mul(t, t, c)?;
        engine.mod_mul(r, r, b)?;
    }
    Ok(())
}

/// Jacobi symbol `(a / N)` for an odd modulus.
pub(crate) fn jacobi<A: Accelerator>(
    engine: &mut Engine<'_, A>,
    a: Reg,
    scratch: [Reg; 3],
) -> Result<i8> {
    let [mut x, mut y, q] = scratch;
    engine.copy(LenId::MAX, x, a)?;
    engine.copy(LenId::MAX, y, Reg::N)?;
    engine.div(LenId::MAX, q, x, y)?;

    let mut symbol = 1i8;
    while !engine.is_zero(LenId::MAX, x)? {
        while !engine.test_bit(LenId::MAX, x, 0)? {
            engine.shift_right(LenId::MAX, x, x, 1, false)?;
            if matches!(low_word(engine, y)? & 7, 3 | 5) {
                symbol = -symbol;
            }
        }

        mem::swap(&mut x, &mut y);
        if low_word(engine, x)? & 3 == 3 && low_word(engine, y)? & 3 == 3 {
            symbol = -symbol;
        }
        engine.div(LenId::MAX, q, x, y)?;
    }

    Ok(
        if engine.compare(LenId::MAX, y, Operand::Imm(1))? == Ordering::Equal {
            symbol
        } else {
            0
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pka::{LeWords, NpMode, Pka, SessionParams, SoftPka};

    fn session_with<R>(
        modulus: u64,
        f: impl FnOnce(&mut Engine<'_, SoftPka>, [Reg; 9]) -> R,
    ) -> R {
        let pka = Pka::new(SoftPka::new());
        let mut engine = pka.session(SessionParams::new(64)).unwrap();
        let m = [modulus as u32, (modulus >> 32) as u32];
        engine.set_modulus(&LeWords(m), None, NpMode::Full).unwrap();
        let regs = engine.pool().take_array().unwrap();
        f(&mut engine, regs)
    }

    fn load(engine: &mut Engine<'_, SoftPka>, reg: Reg, value: u64) {
        engine
            .copy_into_register(reg, &LeWords([value as u32, (value >> 32) as u32]))
            .unwrap();
    }

    fn read(engine: &mut Engine<'_, SoftPka>, reg: Reg) -> u64 {
        let mut w = [0u32; 2];
        engine.read_words(reg, &mut w).unwrap();
        w[0] as u64 | (w[1] as u64) << 32
    }

    fn pow_mod(mut b: u128, mut e: u128, m: u128) -> u128 {
        let mut acc = 1;
        b %= m;
        while e > 0 {
            if e & 1 == 1 {
                acc = acc * b % m;
            }
            b = b * b % m;
            e >>= 1;
        }
        acc
    }

    fn check_roots(p: u64) {
        session_with(p, |engine, [r, v, s0, s1, s2, s3, s4, s5, _]| {
            for x in [1u64, 2, 3, 10, 12345, p - 1] {
                let square = (x as u128 * x as u128 % p as u128) as u64;
                load(engine, v, square);
                mod_sqrt(engine, r, v, [s0, s1, s2, s3, s4, s5]).unwrap();
                let root = read(engine, r);
                assert!(root == x || root == p - x, "p = {p:#x}, x = {x}");
            }
        });
    }

    #[test]
    fn roots_for_each_residue_class() {
        // 3 mod 4, 5 mod 8, 1 mod 8 (with a large power of two in p - 1)
        check_roots(0xffff_ffff_ffff_ff43);
        check_roots(0xffff_ffff_ffff_ffc5);
        check_roots(0x7fff_fff9_0000_0001);
    }

    #[test]
    fn non_residue_has_no_root() {
        let p = 0x7fff_fff9_0000_0001u64;
        session_with(p, |engine, [r, v, s0, s1, s2, s3, s4, s5, _]| {
            let mut n = 2u64;
            while pow_mod(n as u128, (p as u128 - 1) / 2, p as u128) == 1 {
                n += 1;
            }
            load(engine, v, n);
            assert_eq!(
                mod_sqrt(engine, r, v, [s0, s1, s2, s3, s4, s5]),
                Err(Error::ModSquareRootNotExist)
            );
        });
    }

    #[test]
    fn jacobi_matches_euler() {
        let p = 0xffff_ffff_ffff_ffc5u64;
        session_with(p, |engine, [a, s0, s1, s2, ..]| {
            for x in [0u64, 1, 2, 5, 7, 1 << 40, p - 2] {
                load(engine, a, x);
                let expected = match pow_mod(x as u128, (p as u128 - 1) / 2, p as u128) {
                    0 => 0,
                    1 => 1,
                    _ => -1,
                };
                assert_eq!(jacobi(engine, a, [s0, s1, s2]).unwrap(), expected, "x = {x}");
            }
        });
    }
}
