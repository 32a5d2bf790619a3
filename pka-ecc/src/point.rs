//! Affine points and their SEC1 encodings.

use crate::domain::{DomainId, FIELD_BYTES, FIELD_WORDS};
use pka::{BeBytes, Error, Result, WordSink, WordSource};
use subtle::{Choice, ConstantTimeEq};

/// Little-endian words of a big-endian byte string.
pub(crate) fn words_from_be(bytes: &[u8]) -> [u32; FIELD_WORDS] {
    let src = BeBytes(bytes);
    let mut words = [0u32; FIELD_WORDS];
    for (i, w) in words.iter_mut().enumerate() {
        *w = src.word(i);
    }
    words
}

/// Write little-endian words to a big-endian byte string, dropping bytes
/// that do not fit.
pub(crate) fn words_to_be(words: &[u32], out: &mut [u8]) {
    let mut dst = BeBytes(out);
    for i in 0..dst.capacity_words() {
        dst.set_word(i, words.get(i).copied().unwrap_or(0));
    }
}

/// Point on a Weierstrass curve in affine coordinates.
///
/// The point at infinity is represented as `(0, 0)`, which is never on any
/// of the supported curves since `b` is non-zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AffinePoint {
    domain: DomainId,
    x: [u32; FIELD_WORDS],
    y: [u32; FIELD_WORDS],
}

impl AffinePoint {
    pub(crate) fn from_words(domain: DomainId, x: &[u32], y: &[u32]) -> Self {
        let mut point = Self::identity(domain);
        point.x[..x.len()].copy_from_slice(x);
        point.y[..y.len()].copy_from_slice(y);
        point
    }

    /// The point at infinity.
    pub fn identity(domain: DomainId) -> Self {
        Self {
            domain,
            x: [0; FIELD_WORDS],
            y: [0; FIELD_WORDS],
        }
    }

    /// The base point of `domain`.
    pub fn generator(domain: DomainId) -> Self {
        let (x, y) = domain.domain().generator();
        Self::from_words(domain, x, y)
    }

    /// Domain this point belongs to.
    pub fn domain(&self) -> DomainId {
        self.domain
    }

    /// Is this the point at infinity?
    pub fn is_identity(&self) -> Choice {
        let zero = [0u32; FIELD_WORDS];
        self.x[..].ct_eq(&zero[..]) & self.y[..].ct_eq(&zero[..])
    }

    /// Little-endian words of `x`.
    pub fn x(&self) -> &[u32] {
        &self.x[..self.domain.domain().modulus_words()]
    }

    /// Little-endian words of `y`.
    pub fn y(&self) -> &[u32] {
        &self.y[..self.domain.domain().modulus_words()]
    }

    /// Big-endian `x`, exactly the modulus size.
    pub fn x_bytes(&self, out: &mut [u8]) -> Result<()> {
        if out.len() != self.domain.domain().modulus_size() {
            return Err(Error::InvalidBufferSize);
        }
        words_to_be(self.x(), out);
        Ok(())
    }

    /// Is `y` odd?
    pub(crate) fn y_is_odd(&self) -> Choice {
        Choice::from((self.y[0] & 1) as u8)
    }

    /// `-P = (x, p - y)`.
    pub fn negate(&self) -> Self {
        if bool::from(self.is_identity()) {
            return *self;
        }

        let p = self.domain.domain().modulus();
        let mut neg = *self;
        let mut borrow = 0u64;
        for (i, w) in neg.y.iter_mut().enumerate().take(p.len()) {
            let diff = (p[i] as u64)
                .wrapping_sub(self.y[i] as u64)
                .wrapping_sub(borrow);
            *w = diff as u32;
            borrow = (diff >> 63) & 1;
        }
        neg
    }

    /// SEC1 encoding: `04 || x || y`, or `02/03 || x` when compressed.
    pub fn to_encoded(&self, compress: bool) -> EncodedPoint {
        let mut out = EncodedPoint {
            bytes: [0; ENCODED_CAPACITY],
            len: 1,
        };

        if bool::from(self.is_identity()) {
            return out;
        }

        let size = self.domain.domain().modulus_size();
        words_to_be(self.x(), &mut out.bytes[1..1 + size]);
        if compress {
            out.bytes[0] = 0x02 | self.y_is_odd().unwrap_u8();
            out.len = 1 + size;
        } else {
            out.bytes[0] = 0x04;
            words_to_be(self.y(), &mut out.bytes[1 + size..1 + 2 * size]);
            out.len = 1 + 2 * size;
        }
        out
    }
}

impl ConstantTimeEq for AffinePoint {
    fn ct_eq(&self, other: &Self) -> Choice {
        Choice::from((self.domain == other.domain) as u8)
            & self.x[..].ct_eq(&other.x[..])
            & self.y[..].ct_eq(&other.y[..])
    }
}

const ENCODED_CAPACITY: usize = 1 + 2 * FIELD_BYTES;

/// SEC1 point encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodedPoint {
    bytes: [u8; ENCODED_CAPACITY],
    len: usize,
}

impl EncodedPoint {
    /// Encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Is this the one-byte encoding of the identity?
    pub fn is_identity(&self) -> bool {
        self.len == 1
    }
}

impl AsRef<[u8]> for EncodedPoint {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// A parsed SEC1 encoding, not yet checked against the curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Sec1<'a> {
    Identity,
    Compressed { x: &'a [u8], y_odd: bool },
    Uncompressed { x: &'a [u8], y: &'a [u8] },
}

impl<'a> Sec1<'a> {
    /// Split an encoding into its coordinates.
    ///
    /// Hybrid encodings (`06`/`07`) are accepted when the parity byte agrees
    /// with `y`.
    pub(crate) fn parse(domain: DomainId, bytes: &'a [u8]) -> Result<Self> {
        let size = domain.domain().modulus_size();
        let (&tag, body) = bytes.split_first().ok_or(Error::InvalidPointEncoding)?;

        match (tag, body.len()) {
            (0x00, 0) => Ok(Sec1::Identity),
            (0x02 | 0x03, len) if len == size => Ok(Sec1::Compressed {
                x: body,
                y_odd: tag == 0x03,
            }),
            (0x04, len) if len == 2 * size => {
                let (x, y) = body.split_at(size);
                Ok(Sec1::Uncompressed { x, y })
            }
            (0x06 | 0x07, len) if len == 2 * size => {
                let (x, y) = body.split_at(size);
                let y_odd = y[size - 1] & 1 == 1;
                if y_odd != (tag == 0x07) {
                    return Err(Error::InvalidPointEncoding);
                }
                Ok(Sec1::Uncompressed { x, y })
            }
            _ => Err(Error::InvalidPointEncoding),
        }
    }
}
