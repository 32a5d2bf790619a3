//! RSA public-exponent operation.

use crate::{
    Error, Result,
    accelerator::Accelerator,
    barrett::NpMode,
    buffer::{BeBytes, WordSource},
    ct,
    engine::{Pka, SessionParams},
    regs::{LenId, MAX_MODULUS_BITS, Reg},
};
use core::cmp::Ordering;

/// Smallest supported modulus in bits.
pub const RSA_MIN_BITS: u32 = 512;

/// Largest supported modulus in bits.
pub const RSA_MAX_BITS: u32 = MAX_MODULUS_BITS;

const MAX_BYTES: usize = (RSA_MAX_BITS / 8) as usize;

/// RSA public key `(n, e)`.
#[derive(Clone)]
pub struct RsaPublicKey {
    n: [u8; MAX_BYTES],
    e: [u8; MAX_BYTES],
    bits: u32,
}

impl RsaPublicKey {
    /// Create a key from the big-endian modulus and public exponent.
    ///
    /// The modulus must be odd and between [`RSA_MIN_BITS`] and
    /// [`RSA_MAX_BITS`] long; the exponent must satisfy `1 < e < n`.
    pub fn new(n: &[u8], e: &[u8]) -> Result<Self> {
        let bits = BeBytes(n).bit_length() as u32;
        if !(RSA_MIN_BITS..=RSA_MAX_BITS).contains(&bits) {
            return Err(Error::UnsupportedModulusSize);
        }

        if n.last().is_none_or(|b| b & 1 == 0) {
            return Err(Error::InvalidInputValue);
        }

        let e_bits = BeBytes(e).bit_length();
        if e_bits < 2 || e_bits > bits as usize {
            return Err(Error::InvalidInputValue);
        }

        let mut key = Self {
            n: [0; MAX_BYTES],
            e: [0; MAX_BYTES],
            bits,
        };
        let size = key.size();
        copy_tail(&mut key.n[..size], n);
        copy_tail(&mut key.e[..size], e);

        if !bool::from(ct::less_than_be(&key.e[..size], &key.n[..size])) {
            return Err(Error::InvalidInputValue);
        }

        Ok(key)
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Modulus size in bytes.
    pub fn size(&self) -> usize {
        self.bits.div_ceil(8) as usize
    }

    /// Big-endian modulus.
    pub fn modulus(&self) -> &[u8] {
        &self.n[..self.size()]
    }

    /// Big-endian public exponent, left-padded to the modulus size.
    pub fn exponent(&self) -> &[u8] {
        &self.e[..self.size()]
    }
}

impl core::fmt::Debug for RsaPublicKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RsaPublicKey")
            .field("bits", &self.bits)
            .finish_non_exhaustive()
    }
}

/// Right-align `src` into `dst`, dropping leading zero bytes.
fn copy_tail(dst: &mut [u8], src: &[u8]) {
    let skip = src.len().saturating_sub(dst.len());
    let src = &src[skip..];
    let offset = dst.len() - src.len();
    dst[offset..].copy_from_slice(src);
}

impl<A: Accelerator> Pka<A> {
    /// `output = input ^ e mod n`, big-endian.
    ///
    /// `input` must be below the modulus and `output` exactly the modulus
    /// size.
    pub fn rsa_public_exponent(
        &self,
        key: &RsaPublicKey,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<()> {
        if output.len() != key.size() || input.len() > key.size() {
            return Err(Error::InvalidBufferSize);
        }

        let result = self.rsa_exp(key, input, output);
        if result.is_err() {
            output.fill(0);
        }
        result
    }

    fn rsa_exp(&self, key: &RsaPublicKey, input: &[u8], output: &mut [u8]) -> Result<()> {
        let mut engine = self.session(SessionParams::new(key.bits()).with_reg_count(7))?;
        engine.set_modulus(&BeBytes(key.modulus()), None, NpMode::Auto)?;

        let [x, e, r] = engine.pool().take_array()?;
        engine.copy_into_register(x, &BeBytes(input))?;
        if engine.compare(LenId::MAX, x, Reg::N)? != Ordering::Less {
            return Err(Error::InvalidInputValue);
        }

        engine.copy_into_register(e, &BeBytes(key.exponent()))?;
        engine.mod_exp(r, x, e)?;
        engine.copy_from_register(&mut BeBytes(output), r)?;
        log::debug!("pka: rsa {}-bit public operation", key.bits());
        Ok(())
    }
}
