//! Constant-time buffer helpers.
//!
//! None of these branch on buffer contents or exit early; only lengths are
//! public.

use crate::{Error, Result};
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq, ConstantTimeLess};

/// Swap `x` and `y` when `choice` is set.
pub fn swap<T: ConditionallySelectable>(x: &mut [T], y: &mut [T], choice: Choice) -> Result<()> {
    if x.len() != y.len() {
        return Err(Error::InvalidBufferSize);
    }

    for (a, b) in x.iter_mut().zip(y.iter_mut()) {
        T::conditional_swap(a, b, choice);
    }
    Ok(())
}

/// Are both buffers equal? Buffers of different lengths never are.
pub fn buffers_equal(x: &[u8], y: &[u8]) -> Choice {
    x.ct_eq(y)
}

/// Is the little-endian word string `x` below `y`?
///
/// The shorter operand is zero-extended.
pub fn less_than(x: &[u32], y: &[u32]) -> Choice {
    let mut lt = Choice::from(0);
    let mut eq = Choice::from(1);

    for i in (0..x.len().max(y.len())).rev() {
        let a = x.get(i).copied().unwrap_or(0);
        let b = y.get(i).copied().unwrap_or(0);
        lt |= eq & a.ct_lt(&b);
        eq &= a.ct_eq(&b);
    }

    lt
}

/// Is the big-endian byte string `x` below `y`? Both must have equal length.
pub fn less_than_be(x: &[u8], y: &[u8]) -> Choice {
    let mut lt = Choice::from(0);
    let mut eq = Choice::from((x.len() == y.len()) as u8);

    for (a, b) in x.iter().zip(y) {
        lt |= eq & a.ct_lt(b);
        eq &= a.ct_eq(b);
    }

    lt
}

/// Is every byte zero?
pub fn is_zero(x: &[u8]) -> Choice {
    let acc = x.iter().fold(0u8, |acc, b| acc | b);
    acc.ct_eq(&0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn swap_lengths() {
        let mut a = [1u8, 2];
        let mut b = [3u8, 4, 5];
        assert_eq!(swap(&mut a, &mut b, Choice::from(1)), Err(Error::InvalidBufferSize));
    }

    #[test]
    fn equality() {
        assert!(bool::from(buffers_equal(b"abc", b"abc")));
        assert!(!bool::from(buffers_equal(b"abc", b"abd")));
        assert!(!bool::from(buffers_equal(b"abc", b"ab")));
        assert!(bool::from(is_zero(&[0, 0, 0])));
        assert!(!bool::from(is_zero(&[0, 1, 0])));
    }

    #[test]
    fn be_ordering() {
        assert!(bool::from(less_than_be(&[0, 1, 2], &[0, 2, 0])));
        assert!(!bool::from(less_than_be(&[0, 2, 0], &[0, 2, 0])));
        assert!(!bool::from(less_than_be(&[1, 0], &[0, 1])));
    }

    proptest! {
        #[test]
        fn less_than_matches_integers(a in any::<u64>(), b in any::<u64>()) {
            let x = [a as u32, (a >> 32) as u32];
            let y = [b as u32, (b >> 32) as u32, 0];
            prop_assert_eq!(bool::from(less_than(&x, &y)), a < b);
        }

        #[test]
        fn swap_exchanges(a in any::<[u32; 4]>(), b in any::<[u32; 4]>(), c in any::<bool>()) {
            let (mut x, mut y) = (a, b);
            swap(&mut x, &mut y, Choice::from(c as u8)).unwrap();
            if c {
                prop_assert_eq!((x, y), (b, a));
            } else {
                prop_assert_eq!((x, y), (a, b));
            }
        }
    }
}
