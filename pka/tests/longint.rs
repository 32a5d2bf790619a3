//! Long-integer services checked against native arithmetic.

use pka::{Error, LeWords, Pka, SoftPka};
use proptest::prelude::*;

fn words(x: u128) -> [u32; 4] {
    [x as u32, (x >> 32) as u32, (x >> 64) as u32, (x >> 96) as u32]
}

fn value(w: [u32; 4]) -> u128 {
    w.iter().rev().fold(0, |acc, w| (acc << 32) | *w as u128)
}

fn pow_mod(base: u64, exp: u64, n: u64) -> u64 {
    let n = n as u128;
    let mut acc = 1 % n;
    let mut base = base as u128 % n;
    let mut exp = exp;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = acc * base % n;
        }
        base = base * base % n;
        exp >>= 1;
    }
    acc as u64
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

proptest! {
    #[test]
    fn divide(a in any::<u128>(), b in 1..=u64::MAX) {
        let pka = Pka::new(SoftPka::new());
        let mut q = [0u32; 4];
        let mut r = [0u32; 4];
        pka.long_divide(
            &LeWords(words(a)),
            &LeWords(words(b as u128)),
            &mut LeWords(&mut q),
            &mut LeWords(&mut r),
        )
        .unwrap();

        prop_assert_eq!(value(q), a / b as u128);
        prop_assert_eq!(value(r), a % b as u128);
    }

    #[test]
    fn multiply_low(a in any::<u64>(), b in any::<u64>()) {
        let pka = Pka::new(SoftPka::new());
        let mut out = [0u32; 4];
        pka.long_multiply_low(
            &LeWords(words(a as u128)),
            &LeWords(words(b as u128)),
            &mut LeWords(&mut out),
        )
        .unwrap();
        prop_assert_eq!(value(out), a as u128 * b as u128);
    }

    #[test]
    fn exponentiate(base in any::<u64>(), exp in any::<u64>(), n in 2..=u64::MAX) {
        let pka = Pka::new(SoftPka::new());
        let mut out = [0u32; 2];
        pka.mod_exp(
            &LeWords([base as u32, (base >> 32) as u32]),
            &LeWords([exp as u32, (exp >> 32) as u32]),
            &LeWords([n as u32, (n >> 32) as u32]),
            &mut LeWords(&mut out),
        )
        .unwrap();
        prop_assert_eq!(out[0] as u64 | (out[1] as u64) << 32, pow_mod(base, exp, n));
    }

    #[test]
    fn invert_odd_and_even(a in 1..=u64::MAX, n in 3..=u64::MAX) {
        let pka = Pka::new(SoftPka::new());
        let mut out = [0u32; 2];
        let result = pka.mod_inverse(
            &LeWords([a as u32, (a >> 32) as u32]),
            &LeWords([n as u32, (n >> 32) as u32]),
            &mut LeWords(&mut out),
        );

        if gcd(a % n, n) == 1 {
            prop_assert_eq!(result, Ok(()));
            let inv = out[0] as u64 | (out[1] as u64) << 32;
            prop_assert!(inv < n);
            prop_assert_eq!(inv as u128 * a as u128 % n as u128, 1);
        } else {
            prop_assert_eq!(result, Err(Error::ModInverseNotExist));
            prop_assert_eq!(out, [0, 0]);
        }
    }
}
