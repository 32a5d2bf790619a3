//! Non-adjacent form recoding.

use crate::domain::FIELD_WORDS;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Maximum number of digits: one more than the widest scalar.
pub(crate) const NAF_CAPACITY: usize = 32 * FIELD_WORDS + 1;

/// Signed binary digits in `{-1, 0, 1}` with no two adjacent non-zero
/// digits, least significant first.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub(crate) struct Naf {
    digits: [i8; NAF_CAPACITY],
    len: usize,
}

impl Naf {
    /// Recode the little-endian words of `k`.
    pub(crate) fn new(k: &[u32]) -> Self {
        let bit = |i: usize| -> u8 {
            k.get(i / 32).map_or(0, |w| ((w >> (i % 32)) & 1) as u8)
        };

        let mut naf = Naf {
            digits: [0; NAF_CAPACITY],
            len: 0,
        };

        let bits = (32 * k.len()).min(NAF_CAPACITY - 1);
        let mut carry = 0u8;
        for i in 0..=bits {
            let digit = match bit(i) + carry {
                1 if bit(i + 1) == 1 => {
                    carry = 1;
                    -1
                }
                1 => {
                    carry = 0;
                    1
                }
                2 => {
                    carry = 1;
                    0
                }
                _ => 0,
            };

            naf.digits[i] = digit;
            if digit != 0 {
                naf.len = i + 1;
            }
        }

        naf
    }

    /// Number of digits up to and including the leading non-zero one.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Digits from the most significant one down.
    pub(crate) fn msb_first(&self) -> impl Iterator<Item = i8> + '_ {
        self.digits[..self.len].iter().rev().copied()
    }
}
