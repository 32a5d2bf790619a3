//! Key pairs on the Weierstrass domains.

use crate::{
    config::PubKeyCheck,
    domain::{DomainId, FIELD_BYTES, FIELD_WORDS},
    ecc::Ecc,
    point::{AffinePoint, EncodedPoint, Sec1, words_from_be, words_to_be},
    weierstrass::Curve,
};
use core::fmt;
use pka::{Accelerator, BeBytes, Error, LenId, Operand, Result, ct};
use rand_core::CryptoRng;
use subtle::{Choice, ConstantTimeEq};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Validation tag of a live private key.
pub const PRIV_KEY_TAG: u32 = 0x5052_4956;

/// Validation tag of a live public key.
pub const PUB_KEY_TAG: u32 = 0x5055_424b;

/// Extra random bytes beyond the order size drawn for a secret scalar.
pub const SEED_EXTRA_BYTES: usize = 8;

/// Is `0 < k < n`?
pub(crate) fn scalar_in_range(k: &[u32], n: &[u32]) -> Choice {
    let any = k.iter().fold(0u32, |acc, w| acc | w);
    !any.ct_eq(&0) & ct::less_than(k, n)
}

/// Secret scalar `d` of a key pair.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey {
    #[zeroize(skip)]
    domain: DomainId,
    d: [u32; FIELD_WORDS],
    tag: u32,
}

impl PrivateKey {
    /// Decode a big-endian scalar of exactly the order size, which must lie
    /// in `(0, n)`.
    pub fn from_bytes(domain: DomainId, bytes: &[u8]) -> Result<Self> {
        let params = domain.domain();
        if bytes.len() != params.order_size() {
            return Err(Error::InvalidBufferSize);
        }

        let key = Self::from_words(domain, &Zeroizing::new(words_from_be(bytes))[..]);
        if !bool::from(scalar_in_range(&key.d, params.order())) {
            return Err(Error::InvalidScalarValue);
        }
        Ok(key)
    }

    pub(crate) fn from_words(domain: DomainId, d: &[u32]) -> Self {
        let mut key = Self {
            domain,
            d: [0; FIELD_WORDS],
            tag: PRIV_KEY_TAG,
        };
        let len = d.len().min(FIELD_WORDS);
        key.d[..len].copy_from_slice(&d[..len]);
        key
    }

    /// Domain of this key.
    pub fn domain(&self) -> DomainId {
        self.domain
    }

    /// Write the big-endian scalar, exactly the order size.
    pub fn to_bytes(&self, out: &mut [u8]) -> Result<()> {
        self.check()?;
        if out.len() != self.domain.domain().order_size() {
            return Err(Error::InvalidBufferSize);
        }
        words_to_be(&self.d, out);
        Ok(())
    }

    /// Wipe the scalar; the key is unusable afterwards.
    pub fn release(&mut self) {
        self.zeroize();
    }

    pub(crate) fn check(&self) -> Result<&Self> {
        match self.tag {
            PRIV_KEY_TAG => Ok(self),
            _ => Err(Error::IllegalPrivateKeyTag),
        }
    }

    pub(crate) fn scalar(&self) -> &[u32] {
        &self.d[..self.domain.domain().order_words()]
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

/// Public point `Q = d·G` of a key pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    point: AffinePoint,
    tag: u32,
}

impl PublicKey {
    pub(crate) fn from_point(point: AffinePoint) -> Self {
        Self {
            point,
            tag: PUB_KEY_TAG,
        }
    }

    /// Decode and validate a SEC1 encoding with the check configured on
    /// `ecc`.
    ///
    /// The identity is rejected. Compressed points are always on the curve
    /// once decoded; the order check still applies to them.
    pub fn from_sec1<A: Accelerator>(
        ecc: &Ecc<'_, A>,
        domain: DomainId,
        bytes: &[u8],
    ) -> Result<Self> {
        let params = domain.domain();
        let sec1 = Sec1::parse(domain, bytes)?;
        let check = ecc.config().pub_key_check;

        let mut curve = ecc.curve(domain)?;
        let q = curve.table[0];
        match sec1 {
            Sec1::Identity => return Err(Error::InvalidPointEncoding),
            Sec1::Compressed { x, y_odd } => {
                let x = words_from_be(x);
                if !bool::from(ct::less_than(&x, params.modulus())) {
                    return Err(Error::InvalidPointEncoding);
                }
                curve.decompress(&x, y_odd, q)?;
                let check = match check {
                    PubKeyCheck::Full => PubKeyCheck::Full,
                    _ => PubKeyCheck::None,
                };
                curve.check_point(q, check)?;
            }
            Sec1::Uncompressed { x, y } => {
                let x = words_from_be(x);
                let y = words_from_be(y);
                if !bool::from(
                    ct::less_than(&x, params.modulus()) & ct::less_than(&y, params.modulus()),
                ) {
                    return Err(Error::InvalidPointEncoding);
                }
                curve.load(q.x, &x)?;
                curve.load(q.y, &y)?;
                curve.check_point(q, check)?;
            }
        }

        let point = curve.read_point(q)?;
        log::debug!("pka-ecc: {domain:?} public key decoded");
        Ok(Self::from_point(point))
    }

    /// Domain of this key.
    pub fn domain(&self) -> DomainId {
        self.point.domain()
    }

    /// The public point.
    pub fn point(&self) -> &AffinePoint {
        &self.point
    }

    /// SEC1 encoding of the public point.
    pub fn to_encoded(&self, compress: bool) -> EncodedPoint {
        self.point.to_encoded(compress)
    }

    /// Invalidate the key.
    pub fn release(&mut self) {
        self.point = AffinePoint::identity(self.point.domain());
        self.tag = 0;
    }

    pub(crate) fn check(&self) -> Result<&Self> {
        match self.tag {
            PUB_KEY_TAG => Ok(self),
            _ => Err(Error::IllegalPublicKeyTag),
        }
    }
}

/// A private key together with its public key.
#[derive(Clone, Debug)]
pub struct KeyPair {
    private_key: PrivateKey,
    public_key: PublicKey,
}

impl KeyPair {
    /// The secret half.
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// The public half.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Domain of both keys.
    pub fn domain(&self) -> DomainId {
        self.public_key.domain()
    }

    /// Split into the private and public key.
    pub fn into_parts(self) -> (PrivateKey, PublicKey) {
        (self.private_key, self.public_key)
    }
}

impl<A: Accelerator> Curve<'_, A> {
    /// `s[0] = (c mod (n - 1)) + 1` for the big-endian random bytes `c`.
    ///
    /// Leaves a custom modulus active.
    pub(crate) fn scalar_from_seed(&mut self, seed: &[u8]) -> Result<()> {
        if seed.len() != self.domain.order_size() + SEED_EXTRA_BYTES {
            return Err(Error::InvalidBufferSize);
        }

        let mut n_minus_one = [0u32; FIELD_WORDS];
        let n = self.domain.order();
        n_minus_one[..n.len()].copy_from_slice(n);
        n_minus_one[0] &= !1;
        self.use_modulus(&n_minus_one[..n.len()])?;

        let d = self.s[0];
        self.engine.copy_into_register(d, &BeBytes(seed))?;
        self.engine.reduce(LenId::MAX, d, d)?;
        self.engine.add(LenId::MAX, d, d, Operand::Imm(1))?;
        Ok(())
    }

    /// Draw a scalar in `(0, n)` into `s[0]` and return it.
    pub(crate) fn random_scalar<R: CryptoRng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<Zeroizing<[u32; FIELD_WORDS]>> {
        let mut seed = Zeroizing::new([0u8; FIELD_BYTES + SEED_EXTRA_BYTES]);
        let len = self.domain.order_size() + SEED_EXTRA_BYTES;
        rng.fill_bytes(&mut seed[..len]);
        self.scalar_from_seed(&seed[..len])?;
        self.read(self.s[0])
    }

    /// `out = d·G` for the key pair scalar `d`.
    fn public_point(&mut self, d: &[u32]) -> Result<AffinePoint> {
        self.use_field()?;
        let [g, q, _] = self.table;
        self.load_point(g, &AffinePoint::generator(self.domain.id()))?;
        self.mul(d, g, q)?;
        self.read_point(q)
    }
}

impl<A: Accelerator> Ecc<'_, A> {
    /// Generate a key pair from `rng`.
    pub fn generate_key_pair<R: CryptoRng + ?Sized>(
        &self,
        domain: DomainId,
        rng: &mut R,
    ) -> Result<KeyPair> {
        let mut curve = self.curve(domain)?;
        let d = curve.random_scalar(rng)?;
        let point = curve.public_point(&d[..domain.domain().order_words()])?;
        log::debug!("pka-ecc: {domain:?} key pair generated");

        Ok(KeyPair {
            private_key: PrivateKey::from_words(domain, &d[..]),
            public_key: PublicKey::from_point(point),
        })
    }

    /// Derive a key pair from `order_size + 8` random bytes: with `c` the
    /// big-endian seed, `d = (c mod (n - 1)) + 1`.
    pub fn key_pair_from_seed(&self, domain: DomainId, seed: &[u8]) -> Result<KeyPair> {
        let mut curve = self.curve(domain)?;
        curve.scalar_from_seed(seed)?;
        let d = curve.read(curve.s[0])?;
        let point = curve.public_point(&d[..domain.domain().order_words()])?;

        Ok(KeyPair {
            private_key: PrivateKey::from_words(domain, &d[..]),
            public_key: PublicKey::from_point(point),
        })
    }

    /// The public key of `private_key`.
    pub fn public_key(&self, private_key: &PrivateKey) -> Result<PublicKey> {
        let key = private_key.check()?;
        let mut curve = self.curve(key.domain())?;
        curve.public_point(key.scalar()).map(PublicKey::from_point)
    }

    /// Fully validate a public key: on the curve and of order `n`.
    pub fn check_public_key(&self, key: &PublicKey) -> Result<()> {
        let key = key.check()?;
        let mut curve = self.curve(key.domain())?;
        let q = curve.table[0];
        curve.load_point(q, key.point())?;
        curve.check_point(q, PubKeyCheck::Full)
    }

    /// `k·P` for a big-endian scalar in `(0, n)` and a point on the curve.
    pub fn scalar_mul(&self, k: &[u8], point: &AffinePoint) -> Result<AffinePoint> {
        let domain = point.domain();
        let params = domain.domain();
        if k.len() > params.order_size() {
            return Err(Error::InvalidBufferSize);
        }

        let k = Zeroizing::new(words_from_be(k));
        if !bool::from(scalar_in_range(&k[..], params.order())) {
            return Err(Error::InvalidScalarValue);
        }

        let mut curve = self.curve(domain)?;
        let [p, out, _] = curve.table;
        curve.load_point(p, point)?;
        curve.check_point(p, PubKeyCheck::OnCurve)?;
        curve.mul(&k[..params.order_words()], p, out)?;
        curve.read_point(out)
    }

    /// `P + Q` for two points of the same domain; either may be the identity.
    pub fn add_points(&self, p: &AffinePoint, q: &AffinePoint) -> Result<AffinePoint> {
        let domain = p.domain();
        if q.domain() != domain {
            return Err(Error::DomainMismatch);
        }

        let mut curve = self.curve(domain)?;
        let [a, b, out] = curve.table;
        for (reg, point) in [(a, p), (b, q)] {
            curve.load_point(reg, point)?;
            if !bool::from(point.is_identity()) {
                curve.check_point(reg, PubKeyCheck::OnCurve)?;
            }
        }

        curve.add_points(a, b, out)?;
        curve.read_point(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pka::{Pka, SoftPka};

    #[test]
    fn private_key_range() {
        let n = DomainId::Secp256r1.domain().order();
        let mut bytes = [0u8; 32];
        words_to_be(n, &mut bytes);
        assert_eq!(
            PrivateKey::from_bytes(DomainId::Secp256r1, &bytes).unwrap_err(),
            Error::InvalidScalarValue
        );
        assert_eq!(
            PrivateKey::from_bytes(DomainId::Secp256r1, &[0; 32]).unwrap_err(),
            Error::InvalidScalarValue
        );
        assert_eq!(
            PrivateKey::from_bytes(DomainId::Secp256r1, &[1; 31]).unwrap_err(),
            Error::InvalidBufferSize
        );

        bytes[31] -= 1;
        let key = PrivateKey::from_bytes(DomainId::Secp256r1, &bytes).unwrap();
        let mut out = [0u8; 32];
        key.to_bytes(&mut out).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn released_keys_are_rejected() {
        let pka = Pka::new(SoftPka::new());
        let ecc = Ecc::new(&pka);
        let (mut private_key, mut public_key) = ecc
            .key_pair_from_seed(DomainId::Secp192r1, &[7; 32])
            .unwrap()
            .into_parts();

        private_key.release();
        public_key.release();
        assert_eq!(ecc.public_key(&private_key).unwrap_err(), Error::IllegalPrivateKeyTag);
        assert_eq!(ecc.check_public_key(&public_key).unwrap_err(), Error::IllegalPublicKeyTag);
    }

    #[test]
    fn seed_length() {
        let pka = Pka::new(SoftPka::new());
        let ecc = Ecc::new(&pka);
        assert_eq!(
            ecc.key_pair_from_seed(DomainId::Secp256r1, &[1; 32]).unwrap_err(),
            Error::InvalidBufferSize
        );
    }
}
