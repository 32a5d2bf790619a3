//! Opcode arithmetic on fixed-width [`Uint`]s.
//!
//! Operands arrive as `w` little-endian 32-bit words and are widened into a
//! `Uint<L>` of at least `2w + 4` words, so sums, products and Barrett
//! estimates never wrap. Results are truncated back to `w` words.

use crate::{
    opcode::{Opcode, Status},
    regs::NP_WORDS,
};
use crypto_bigint::{Limb, NonZero, Uint, Word};

/// Bits of the Barrett estimate shift (`A + X`).
const NP_SHIFT: u32 = 72;

/// Reduction steps tolerated before the tag is considered broken.
const MAX_CORRECTIONS: usize = 8;

/// 32-bit words per limb.
const PER_LIMB: usize = Limb::BITS as usize / 32;

/// Limbs of an integer holding at least `words` 32-bit words.
pub(super) const fn limbs_for(words: usize) -> usize {
    (words * 32).div_ceil(Limb::BITS as usize)
}

/// Decoded operand values of one instruction.
pub(super) struct Inputs<'a> {
    pub(super) opcode: Opcode,
    pub(super) a: &'a [u32],
    pub(super) b: &'a [u32],
    /// Shift count for shift opcodes.
    pub(super) count: u32,
    /// `N` and `NP` for modular opcodes.
    pub(super) modulus: Option<(&'a [u32], &'a [u32; NP_WORDS])>,
    /// Previous destination value for `ModMulAcc`.
    pub(super) acc: Option<&'a [u32]>,
}

/// Execute `op` on `L`-limb integers. `r` receives the result and `rem` the
/// remainder of a division; the returned flag is the carry or borrow.
pub(super) fn execute<const L: usize>(
    op: &Inputs<'_>,
    r: &mut [u32],
    rem: &mut [u32],
) -> Result<bool, Status> {
    let w = op.a.len();
    let bits = 32 * w as u32;
    let a = widen::<L>(op.a);
    let b = widen::<L>(op.b);
    let mut carry = false;

    let x = match op.opcode {
        Opcode::Add => {
            let sum = a.wrapping_add(&b);
            carry = sum.bit_vartime(bits);
            sum
        }
        Opcode::Sub => {
            carry = a < b;
            a.wrapping_sub(&b)
        }
        Opcode::And => a & b,
        Opcode::Or => a | b,
        Opcode::Xor => a ^ b,
        Opcode::Shr0 => a.shr_vartime(op.count),
        Opcode::Shr1 => a.shr_vartime(op.count) | ones::<L>(op.count).shl_vartime(bits - op.count),
        Opcode::Shl0 => a.shl_vartime(op.count),
        Opcode::Shl1 => a.shl_vartime(op.count) | ones::<L>(op.count),
        Opcode::MulLow => a.wrapping_mul(&b),
        Opcode::MulHigh => a.wrapping_mul(&b).shr_vartime(bits),
        Opcode::Div => {
            let divisor = Option::<NonZero<Uint<L>>>::from(NonZero::new(b))
                .ok_or(Status::DIV_BY_ZERO)?;
            let (q, remainder) = a.div_rem(&divisor);
            narrow(&remainder, rem);
            q
        }
        opcode => {
            let (n, np) = op.modulus.ok_or(Status::ILLEGAL_OPERAND)?;
            let barrett = Barrett::<L>::new(n, np)?;
            let acc = op.acc.map(widen::<L>);
            barrett.execute(opcode, w, a, b, acc)?
        }
    };

    narrow(&x, r);
    Ok(carry)
}

fn widen<const L: usize>(words: &[u32]) -> Uint<L> {
    let mut x = Uint::<L>::ZERO;
    let limbs = x.as_words_mut();
    for (i, w) in words.iter().enumerate() {
        if let Some(limb) = limbs.get_mut(i / PER_LIMB) {
            *limb |= Word::from(*w) << (32 * (i % PER_LIMB));
        }
    }
    x
}

fn narrow<const L: usize>(x: &Uint<L>, out: &mut [u32]) {
    let limbs = x.as_words();
    for (i, w) in out.iter_mut().enumerate() {
        *w = limbs
            .get(i / PER_LIMB)
            .map_or(0, |limb| (limb >> (32 * (i % PER_LIMB))) as u32);
    }
}

/// `2^count - 1`.
fn ones<const L: usize>(count: u32) -> Uint<L> {
    Uint::<L>::ONE.shl_vartime(count).wrapping_sub(&Uint::ONE)
}

/// Modulus and its Barrett tag as seen by the modular opcodes.
struct Barrett<const L: usize> {
    n: Uint<L>,
    np: Uint<L>,
    bits: u32,
}

impl<const L: usize> Barrett<L> {
    fn new(n: &[u32], np: &[u32; NP_WORDS]) -> Result<Self, Status> {
        let n = widen::<L>(n);
        match n.bits() {
            0 => Err(Status::DIV_BY_ZERO),
            bits => Ok(Self {
                n,
                np: widen(np),
                bits,
            }),
        }
    }

    /// Run a modular opcode on `w`-word operands.
    fn execute(
        &self,
        opcode: Opcode,
        w: usize,
        a: Uint<L>,
        b: Uint<L>,
        acc: Option<Uint<L>>,
    ) -> Result<Uint<L>, Status> {
        match opcode {
            Opcode::ModAdd => self.reduce(a.wrapping_add(&b), w + 1, true),
            Opcode::ModSub => {
                let x = self.reduce(a, w + 1, true)?;
                let y = self.reduce(b, w + 1, true)?;
                let x = if x < y { x.wrapping_add(&self.n) } else { x };
                Ok(x.wrapping_sub(&y))
            }
            Opcode::ModMul | Opcode::ModMulNr | Opcode::ModMulAcc => {
                let mut x = a.wrapping_mul(&b);
                if let Some(acc) = acc {
                    x = x.wrapping_add(&acc);
                }
                self.reduce(x, 2 * w + 1, opcode != Opcode::ModMulNr)
            }
            Opcode::ModExp => self.pow(a, &b, w),
            Opcode::ModInv => self.invert(a, w),
            Opcode::Reduce => self.reduce(a, w, true),
            _ => Err(Status::ILLEGAL_OPCODE),
        }
    }

    /// Barrett reduction of `x`, a value of at most `cap` words.
    ///
    /// Each step estimates the quotient of the top bits of `x` from a 65-bit
    /// window and the tag, and never overshoots for a correct tag. With
    /// `full` unset the result is only brought below `2n`.
    fn reduce(&self, mut x: Uint<L>, cap: usize, full: bool) -> Result<Uint<L>, Status> {
        let cap_bits = 32 * cap as u32;
        let mut budget = 2 * cap + 16;

        loop {
            let len = x.bits();
            if len < self.bits {
                return Ok(x);
            }

            let s = len.saturating_sub(self.bits + 64);
            let t = x.shr_vartime(self.bits - 1 + s);
            let q = t.wrapping_mul(&self.np).shr_vartime(NP_SHIFT);

            if q == Uint::ZERO {
                if s > 0 {
                    return Err(Status::FATAL);
                }
                break;
            }

            let qn = q.wrapping_mul(&self.n);
            if qn.bits() + s > cap_bits {
                return Err(Status::FATAL);
            }

            let sub = qn.shl_vartime(s);
            if sub > x {
                return Err(Status::FATAL);
            }
            x = x.wrapping_sub(&sub);

            budget -= 1;
            if budget == 0 {
                return Err(Status::FATAL);
            }

            if s == 0 {
                break;
            }
        }

        let bound = if full { self.n } else { self.n.shl_vartime(1) };
        for _ in 0..MAX_CORRECTIONS {
            if x < bound {
                return Ok(x);
            }
            x = x.wrapping_sub(&self.n);
        }

        Err(Status::FATAL)
    }

    /// `a * b mod n` for reduced `w`-word operands.
    fn mul(&self, a: &Uint<L>, b: &Uint<L>, w: usize) -> Result<Uint<L>, Status> {
        self.reduce(a.wrapping_mul(b), 2 * w, true)
    }

    /// Left-to-right square and multiply.
    fn pow(&self, a: Uint<L>, e: &Uint<L>, w: usize) -> Result<Uint<L>, Status> {
        let base = self.reduce(a, w, true)?;
        let mut acc = self.reduce(Uint::ONE, w, true)?;

        for index in (0..e.bits()).rev() {
            acc = self.mul(&acc, &acc, w)?;
            if e.bit_vartime(index) {
                acc = self.mul(&acc, &base, w)?;
            }
        }

        Ok(acc)
    }

    /// Binary extended Euclid, odd modulus only.
    fn invert(&self, a: Uint<L>, w: usize) -> Result<Uint<L>, Status> {
        let n = &self.n;
        if !n.bit_vartime(0) {
            return Err(Status::INVERSE_NOT_EXIST);
        }

        let halve = |x: Uint<L>| match x.bit_vartime(0) {
            true => x.wrapping_add(n).shr_vartime(1),
            false => x.shr_vartime(1),
        };
        let sub_mod = |x: Uint<L>, y: &Uint<L>| match x < *y {
            true => x.wrapping_add(n).wrapping_sub(y),
            false => x.wrapping_sub(y),
        };

        let mut u = self.reduce(a, w + 1, true)?;
        let mut v = *n;
        let mut x1 = Uint::<L>::ONE;
        let mut x2 = Uint::<L>::ZERO;

        loop {
            if u == Uint::ONE {
                return Ok(x1);
            }
            if v == Uint::ONE {
                return Ok(x2);
            }
            if u == Uint::ZERO || v == Uint::ZERO {
                return Err(Status::INVERSE_NOT_EXIST);
            }

            while !u.bit_vartime(0) {
                u = u.shr_vartime(1);
                x1 = halve(x1);
            }
            while !v.bit_vartime(0) {
                v = v.shr_vartime(1);
                x2 = halve(x2);
            }

            if u >= v {
                u = u.wrapping_sub(&v);
                x1 = sub_mod(x1, &x2);
            } else {
                v = v.wrapping_sub(&u);
                x2 = sub_mod(x2, &x1);
            }
        }
    }
}
