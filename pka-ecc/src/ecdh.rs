//! Elliptic Curve Diffie-Hellman key agreement.

use crate::{
    ecc::Ecc,
    keys::{PrivateKey, PublicKey},
};
use pka::{Accelerator, Error, Result};

impl<A: Accelerator> Ecc<'_, A> {
    /// Write the big-endian x-coordinate of `d·Q` into `out`, which must be
    /// exactly the modulus size.
    ///
    /// On error `out` is zeroed.
    pub fn derive_shared_secret(
        &self,
        private_key: &PrivateKey,
        public_key: &PublicKey,
        out: &mut [u8],
    ) -> Result<()> {
        let result = self.shared_x(private_key, public_key, out);
        if result.is_err() {
            out.fill(0);
        }
        result
    }

    fn shared_x(
        &self,
        private_key: &PrivateKey,
        public_key: &PublicKey,
        out: &mut [u8],
    ) -> Result<()> {
        let d = private_key.check()?;
        let q = public_key.check()?;
        if d.domain() != q.domain() {
            return Err(Error::DomainMismatch);
        }

        let domain = d.domain().domain();
        if out.len() != domain.modulus_size() {
            return Err(Error::InvalidBufferSize);
        }

        let mut curve = self.curve(d.domain())?;
        let [p, shared, _] = curve.table;
        curve.load_point(p, q.point())?;
        if curve.mul(d.scalar(), p, shared)? {
            return Err(Error::SharedValueIsOnInfinity);
        }

        curve.read_point(shared)?.x_bytes(out)
    }
}
