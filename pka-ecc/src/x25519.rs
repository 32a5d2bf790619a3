//! X25519 Diffie-Hellman over the Montgomery form of Curve25519 (RFC 7748).

use crate::{
    Ecc,
    curve25519::{self, ENCODED_SIZE, FIELD_BITS},
};
use pka::{Accelerator, Engine, Error, LeBytes, LeWords, LenId, Reg, Result, SessionParams, ct};
use rand_core::CryptoRng;
use subtle::{Choice, ConditionallySelectable};
use zeroize::Zeroizing;

/// X25519 secret scalar or public u-coordinate.
pub type X25519Key = [u8; ENCODED_SIZE];

/// u-coordinate of the base point.
pub const X25519_BASEPOINT: X25519Key = {
    let mut u = [0u8; ENCODED_SIZE];
    u[0] = 9;
    u
};

/// `(A + 2) / 4` for `A = 486662`.
const A24: [u32; 1] = [121_665];

/// Scalar bits consumed by the ladder.
const LADDER_BITS: usize = 255;

/// Clear the three low bits and the top bit, set bit 254.
fn clamp(scalar: &X25519Key) -> Zeroizing<X25519Key> {
    let mut k = Zeroizing::new(*scalar);
    k[0] &= 248;
    k[31] &= 127;
    k[31] |= 64;
    k
}

/// Working registers of the ladder.
struct Ladder {
    x1: Reg,
    x2: Reg,
    z2: Reg,
    x3: Reg,
    z3: Reg,
    a24: Reg,
    t: [Reg; 6],
}

impl Ladder {
    /// `x2·z2⁻¹` of `k·u` for the clamped scalar `k`, as little-endian bytes.
    fn run<A: Accelerator>(
        engine: &mut Engine<'_, A>,
        k: &X25519Key,
        u: &X25519Key,
        out: &mut X25519Key,
    ) -> Result<()> {
        curve25519::use_field(engine)?;

        let mut pool = engine.pool();
        let [x1, x2, z2, x3, z3, a24] = pool.take_array()?;
        let mut ladder = Self {
            x1,
            x2,
            z2,
            x3,
            z3,
            a24,
            t: pool.take_array()?,
        };

        let mut u = *u;
        u[31] &= 127;
        engine.copy_into_register(ladder.x1, &LeBytes(&u[..]))?;
        engine.reduce(LenId::MAX, ladder.x1, ladder.x1)?;
        engine.copy_into_register(ladder.a24, &LeWords(A24))?;

        engine.set_value(LenId::MAX, ladder.x2, 1)?;
        engine.clear(LenId::MAX, ladder.z2)?;
        engine.copy(LenId::MAX, ladder.x3, ladder.x1)?;
        engine.set_value(LenId::MAX, ladder.z3, 1)?;

        let mut swap = Choice::from(0);
        for i in (0..LADDER_BITS).rev() {
            let bit = Choice::from((k[i / 8] >> (i % 8)) & 1);
            ladder.swap(swap ^ bit);
            swap = bit;
            ladder.step(engine)?;
        }
        ladder.swap(swap);

        let [inv, e, ..] = ladder.t;
        curve25519::invert(engine, inv, ladder.z2, e)?;
        engine.mod_mul(ladder.x2, ladder.x2, inv)?;
        curve25519::read_le(engine, ladder.x2, out)
    }

    /// Exchange `(x2, z2)` with `(x3, z3)` by register identity.
    fn swap(&mut self, choice: Choice) {
        Reg::conditional_swap(&mut self.x2, &mut self.x3, choice);
        Reg::conditional_swap(&mut self.z2, &mut self.z3, choice);
    }

    /// One differential addition and doubling step.
    fn step<A: Accelerator>(&self, engine: &mut Engine<'_, A>) -> Result<()> {
        let Self {
            x1,
            x2,
            z2,
            x3,
            z3,
            a24,
            t: [a, b, c, d, aa, bb],
        } = *self;

        engine.mod_add(a, x2, z2)?;
        engine.mod_mul(aa, a, a)?;
        engine.mod_sub(b, x2, z2)?;
        engine.mod_mul(bb, b, b)?;
        engine.mod_add(c, x3, z3)?;
        engine.mod_sub(d, x3, z3)?;

        // da = d·a, cb = c·b
        engine.mod_mul(d, d, a)?;
        engine.mod_mul(c, c, b)?;
        engine.mod_add(x3, d, c)?;
        engine.mod_mul(x3, x3, x3)?;
        engine.mod_sub(z3, d, c)?;
        engine.mod_mul(z3, z3, z3)?;
        engine.mod_mul(z3, z3, x1)?;

        // e = aa - bb
        engine.mod_mul(x2, aa, bb)?;
        engine.mod_sub(a, aa, bb)?;
        engine.mod_mul(z2, a, a24)?;
        engine.mod_add(z2, z2, aa)?;
        engine.mod_mul(z2, z2, a)
    }
}

impl<A: Accelerator> Ecc<'_, A> {
    /// `out = X25519(scalar, u)`.
    ///
    /// Fails with [`Error::SharedValueIsOnInfinity`] when the result is all
    /// zero, i.e. `u` has small order; `out` is zeroed in that case.
    pub fn x25519(&self, scalar: &X25519Key, u: &X25519Key, out: &mut X25519Key) -> Result<()> {
        let k = clamp(scalar);
        let result = self
            .pka()
            .session(SessionParams::new(FIELD_BITS))
            .and_then(|mut engine| Ladder::run(&mut engine, &k, u, out))
            .and_then(|()| match bool::from(ct::is_zero(&out[..])) {
                true => Err(Error::SharedValueIsOnInfinity),
                false => Ok(()),
            });

        if result.is_err() {
            out.fill(0);
        }
        result
    }

    /// Public key of an X25519 secret: `X25519(scalar, 9)`.
    pub fn x25519_public_key(&self, scalar: &X25519Key, out: &mut X25519Key) -> Result<()> {
        self.x25519(scalar, &X25519_BASEPOINT, out)
    }

    /// Draw a secret from `rng` and return it with its public key.
    pub fn x25519_key_pair<R: CryptoRng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<(Zeroizing<X25519Key>, X25519Key)> {
        let mut secret = Zeroizing::new([0u8; ENCODED_SIZE]);
        rng.fill_bytes(&mut secret[..]);

        let mut public = [0u8; ENCODED_SIZE];
        self.x25519_public_key(&secret, &mut public)?;
        log::debug!("pka-ecc: x25519 key pair generated");
        Ok((secret, public))
    }
}
