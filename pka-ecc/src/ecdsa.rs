//! Elliptic Curve Digital Signature Algorithm.

use crate::{
    domain::{DomainId, FIELD_BYTES},
    ecc::Ecc,
    keys::{PrivateKey, PublicKey, scalar_in_range},
    point::{AffinePoint, words_from_be, words_to_be},
    weierstrass::Curve,
};
use core::cmp::Ordering;
use digest::Digest;
use pka::{Accelerator, BeBytes, Error, LenId, Reg, Result};
use rand_core::CryptoRng;
use zeroize::Zeroizing;

/// Largest signature: `r || s` on secp521r1.
pub const MAX_SIGNATURE_SIZE: usize = 2 * FIELD_BYTES;

/// ECDSA signature `r || s`, each big-endian and exactly the order size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature {
    bytes: [u8; MAX_SIGNATURE_SIZE],
    len: usize,
}

impl Signature {
    /// Parse `r || s` of equal halves.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() || bytes.len() % 2 != 0 || bytes.len() > MAX_SIGNATURE_SIZE {
            return Err(Error::InvalidBufferSize);
        }

        let mut sig = Self {
            bytes: [0; MAX_SIGNATURE_SIZE],
            len: bytes.len(),
        };
        sig.bytes[..bytes.len()].copy_from_slice(bytes);
        Ok(sig)
    }

    /// `r || s`
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Big-endian `r`.
    pub fn r(&self) -> &[u8] {
        &self.bytes[..self.len / 2]
    }

    /// Big-endian `s`.
    pub fn s(&self) -> &[u8] {
        &self.bytes[self.len / 2..self.len]
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<A: Accelerator> Curve<'_, A> {
    /// `reg = e mod n` where `e` is the leftmost `order_bits` bits of the
    /// digest. The order must be the active modulus.
    fn load_digest(&mut self, reg: Reg, digest: &[u8]) -> Result<()> {
        if digest.is_empty() {
            return Err(Error::InvalidBufferSize);
        }

        let n_bits = self.domain.order_bits() as usize;
        let take = digest.len().min(n_bits.div_ceil(8));
        self.engine
            .copy_into_register(reg, &BeBytes(&digest[..take]))?;

        let excess = (8 * take).saturating_sub(n_bits);
        if excess > 0 {
            self.engine
                .shift_right(LenId::MAX, reg, reg, excess as u32, false)?;
        }
        self.engine.reduce(LenId::MAX, reg, reg)
    }

    /// One signing attempt with the ephemeral scalar `k` in `(0, n)`.
    ///
    /// Fails with [`Error::BadEphemeralKeyTryAgain`] when `r` or `s` is zero.
    fn sign_with(&mut self, d: &[u32], digest: &[u8], k: &[u32]) -> Result<Signature> {
        let size = self.domain.order_size();
        let [g, big_r, _] = self.table;

        // R = k·G
        self.use_field()?;
        self.load_point(g, &AffinePoint::generator(self.domain.id()))?;
        self.mul(k, g, big_r)?;

        self.use_order()?;
        let [r, s] = self.s;
        self.engine.reduce(LenId::MAX, r, big_r.x)?;
        if self.engine.is_zero(LenId::N, r)? {
            return Err(Error::BadEphemeralKeyTryAgain);
        }

        // s = k⁻¹(e + r·d)
        self.load_digest(s, digest)?;
        self.load(g.x, d)?;
        self.engine.mod_mul(g.y, r, g.x)?;
        self.engine.mod_add(g.y, g.y, s)?;
        self.load(big_r.x, k)?;
        self.invert(big_r.y, big_r.x)?;
        self.engine.mod_mul(s, big_r.y, g.y)?;
        if self.engine.is_zero(LenId::N, s)? {
            return Err(Error::BadEphemeralKeyTryAgain);
        }

        let mut sig = Signature {
            bytes: [0; MAX_SIGNATURE_SIZE],
            len: 2 * size,
        };
        let r_words = self.read(r)?;
        let s_words = self.read(s)?;
        words_to_be(&r_words[..], &mut sig.bytes[..size]);
        words_to_be(&s_words[..], &mut sig.bytes[size..2 * size]);
        Ok(sig)
    }

    /// Accept iff `(x(u₁·G + u₂·Q) mod n) = r`.
    fn verify_with(&mut self, q: &AffinePoint, digest: &[u8], r: &[u32], s: &[u32]) -> Result<()> {
        let order_words = self.domain.order_words();
        let [g, pub_q, tmp] = self.table;
        let [sa, sb] = self.s;

        // w = s⁻¹, u₁ = e·w, u₂ = r·w
        self.use_order()?;
        self.load(sa, s)?;
        self.invert(tmp.x, sa)?;
        self.load_digest(sb, digest)?;
        self.engine.mod_mul(sb, sb, tmp.x)?;
        self.load(sa, r)?;
        self.engine.mod_mul(sa, sa, tmp.x)?;
        let u1 = self.read(sb)?;
        let u2 = self.read(sa)?;

        self.use_field()?;
        self.load_point(g, &AffinePoint::generator(self.domain.id()))?;
        self.load_point(pub_q, q)?;
        let infinity = if u1[..order_words].iter().all(|w| *w == 0) {
            self.mul_naf(&u2[..order_words], pub_q, g)?
        } else {
            self.mul_two(&u1[..order_words], g, &u2[..order_words], pub_q, g)?
        };
        if infinity {
            return Err(Error::VerifyFailed);
        }

        self.use_order()?;
        self.engine.reduce(LenId::MAX, g.x, g.x)?;
        self.load(sa, r)?;
        match self.engine.compare(LenId::N, g.x, sa)? {
            Ordering::Equal => Ok(()),
            _ => Err(Error::VerifyFailed),
        }
    }
}

impl<A: Accelerator> Ecc<'_, A> {
    /// Sign a message digest with ephemeral scalars drawn from `rng`.
    ///
    /// A draw giving `r = 0` or `s = 0` is replaced, up to
    /// [`EcConfig::sign_attempts`](crate::EcConfig::sign_attempts) times;
    /// at least one draw is always made.
    pub fn sign_message_digest<R: CryptoRng + ?Sized>(
        &self,
        private_key: &PrivateKey,
        digest: &[u8],
        rng: &mut R,
    ) -> Result<Signature> {
        let key = private_key.check()?;
        let domain = key.domain();
        let words = domain.domain().order_words();
        let mut curve = self.curve(domain)?;

        for attempt in 1..=self.config().sign_attempts.max(1) {
            let k = curve.random_scalar(rng)?;
            match curve.sign_with(key.scalar(), digest, &k[..words]) {
                Err(Error::BadEphemeralKeyTryAgain) => {
                    log::warn!("pka-ecc: {domain:?} ephemeral key rejected (attempt {attempt})");
                }
                result => return result,
            }
        }

        Err(Error::BadEphemeralKeyTryAgain)
    }

    /// Sign a message digest with a caller-supplied big-endian ephemeral
    /// scalar of exactly the order size.
    ///
    /// No retry is made: a scalar giving `r = 0` or `s = 0` fails with
    /// [`Error::BadEphemeralKeyTryAgain`].
    pub fn sign_with_ephemeral(
        &self,
        private_key: &PrivateKey,
        digest: &[u8],
        k: &[u8],
    ) -> Result<Signature> {
        let key = private_key.check()?;
        let domain = key.domain().domain();
        if k.len() != domain.order_size() {
            return Err(Error::InvalidBufferSize);
        }

        let k = Zeroizing::new(words_from_be(k));
        if !bool::from(scalar_in_range(&k[..], domain.order())) {
            return Err(Error::InvalidScalarValue);
        }

        let mut curve = self.curve(key.domain())?;
        curve.sign_with(key.scalar(), digest, &k[..domain.order_words()])
    }

    /// Hash `msg` with `D` and sign the digest.
    pub fn sign_message<D: Digest, R: CryptoRng + ?Sized>(
        &self,
        private_key: &PrivateKey,
        msg: &[u8],
        rng: &mut R,
    ) -> Result<Signature> {
        let digest = D::digest(msg);
        self.sign_message_digest(private_key, &digest, rng)
    }

    /// Verify a signature over a message digest.
    pub fn verify_signature(
        &self,
        public_key: &PublicKey,
        digest: &[u8],
        signature: &Signature,
    ) -> Result<()> {
        let key = public_key.check()?;
        let domain = key.domain().domain();
        let size = domain.order_size();
        if signature.r().len() != size {
            return Err(Error::InvalidBufferSize);
        }

        let r = words_from_be(signature.r());
        let s = words_from_be(signature.s());
        let n = domain.order();
        if !bool::from(scalar_in_range(&r, n) & scalar_in_range(&s, n)) {
            return Err(Error::VerifyFailed);
        }

        let mut curve = self.curve(key.domain())?;
        let words = domain.order_words();
        curve.verify_with(key.point(), digest, &r[..words], &s[..words])
    }

    /// Hash `msg` with `D` and verify the signature over the digest.
    pub fn verify_message<D: Digest>(
        &self,
        public_key: &PublicKey,
        msg: &[u8],
        signature: &Signature,
    ) -> Result<()> {
        let digest = D::digest(msg);
        self.verify_signature(public_key, &digest, signature)
    }
}

/// Size of a signature on `domain` in bytes.
pub fn signature_size(domain: DomainId) -> usize {
    2 * domain.domain().order_size()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_halves() {
        let sig = Signature::from_slice(&[1, 2, 3, 4]).unwrap();
        assert_eq!(sig.r(), [1, 2]);
        assert_eq!(sig.s(), [3, 4]);
        assert_eq!(Signature::from_slice(&[1, 2, 3]).unwrap_err(), Error::InvalidBufferSize);
        assert_eq!(Signature::from_slice(&[]).unwrap_err(), Error::InvalidBufferSize);
    }

    #[test]
    fn sizes() {
        assert_eq!(signature_size(DomainId::Secp256r1), 64);
        assert_eq!(signature_size(DomainId::Secp521r1), 132);
    }
}
