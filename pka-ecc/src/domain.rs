//! Curve domain parameters.

use pka::regs::NP_WORDS;

/// Capacity of a field element or scalar in 32-bit words.
pub const FIELD_WORDS: usize = 17;

/// Capacity of a big-endian field element or scalar in bytes.
pub const FIELD_BYTES: usize = 66;

/// Little-endian words of a big-endian hex string.
const fn be_hex(hex: &str) -> [u32; FIELD_WORDS] {
    let bytes = hex.as_bytes();
    assert!(bytes.len() <= 8 * FIELD_WORDS, "hex string too long");

    let mut words = [0u32; FIELD_WORDS];
    let mut i = 0;
    while i < bytes.len() {
        let nibble = match bytes[bytes.len() - 1 - i] {
            b @ b'0'..=b'9' => b - b'0',
            b @ b'a'..=b'f' => b - b'a' + 10,
            b @ b'A'..=b'F' => b - b'A' + 10,
            _ => panic!("invalid hex digit"),
        };
        words[i / 8] |= (nibble as u32) << (4 * (i % 8));
        i += 1;
    }
    words
}

/// Identifier of a built-in short Weierstrass domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DomainId {
    /// NIST P-192.
    Secp192r1,
    /// NIST P-224.
    Secp224r1,
    /// NIST P-256.
    Secp256r1,
    /// NIST P-384.
    Secp384r1,
    /// NIST P-521.
    Secp521r1,
    /// The Koblitz curve used by Bitcoin.
    Secp256k1,
}

impl DomainId {
    /// Every built-in domain.
    pub const ALL: [DomainId; 6] = [
        DomainId::Secp192r1,
        DomainId::Secp224r1,
        DomainId::Secp256r1,
        DomainId::Secp384r1,
        DomainId::Secp521r1,
        DomainId::Secp256k1,
    ];

    /// Parameters of this domain.
    pub fn domain(self) -> &'static Domain {
        match self {
            DomainId::Secp192r1 => &SECP192R1,
            DomainId::Secp224r1 => &SECP224R1,
            DomainId::Secp256r1 => &SECP256R1,
            DomainId::Secp384r1 => &SECP384R1,
            DomainId::Secp521r1 => &SECP521R1,
            DomainId::Secp256k1 => &SECP256K1,
        }
    }
}

/// Curve `y² = x³ + ax + b` over `GF(p)` with a base point of prime order
/// `n` and cofactor one.
///
/// Values are little-endian words padded to [`FIELD_WORDS`]. Each modulus
/// carries its Barrett tag so sessions need not compute it.
#[derive(Debug)]
pub struct Domain {
    id: DomainId,
    p: [u32; FIELD_WORDS],
    p_np: [u32; NP_WORDS],
    a: [u32; FIELD_WORDS],
    b: [u32; FIELD_WORDS],
    gx: [u32; FIELD_WORDS],
    gy: [u32; FIELD_WORDS],
    n: [u32; FIELD_WORDS],
    n_np: [u32; NP_WORDS],
    p_bits: u32,
    n_bits: u32,
}

impl Domain {
    /// Identifier of this domain.
    pub fn id(&self) -> DomainId {
        self.id
    }

    /// Bit length of the field modulus.
    pub fn modulus_bits(&self) -> u32 {
        self.p_bits
    }

    /// Bit length of the group order.
    pub fn order_bits(&self) -> u32 {
        self.n_bits
    }

    /// Size of an encoded field element in bytes.
    pub fn modulus_size(&self) -> usize {
        self.p_bits.div_ceil(8) as usize
    }

    /// Size of an encoded scalar in bytes.
    pub fn order_size(&self) -> usize {
        self.n_bits.div_ceil(8) as usize
    }

    pub(crate) fn modulus_words(&self) -> usize {
        self.p_bits.div_ceil(32) as usize
    }

    pub(crate) fn order_words(&self) -> usize {
        self.n_bits.div_ceil(32) as usize
    }

    /// Field modulus `p`.
    pub fn modulus(&self) -> &[u32] {
        &self.p[..self.modulus_words()]
    }

    /// Barrett tag of `p`.
    pub fn modulus_np(&self) -> &[u32; NP_WORDS] {
        &self.p_np
    }

    /// Coefficient `a`.
    pub fn a(&self) -> &[u32] {
        &self.a[..self.modulus_words()]
    }

    /// Coefficient `b`.
    pub fn b(&self) -> &[u32] {
        &self.b[..self.modulus_words()]
    }

    /// Affine coordinates of the base point.
    pub fn generator(&self) -> (&[u32], &[u32]) {
        let words = self.modulus_words();
        (&self.gx[..words], &self.gy[..words])
    }

    /// Group order `n`.
    pub fn order(&self) -> &[u32] {
        &self.n[..self.order_words()]
    }

    /// Barrett tag of `n`.
    pub fn order_np(&self) -> &[u32; NP_WORDS] {
        &self.n_np
    }

    /// Register width, in bits, that fits both `p` and `n`.
    pub(crate) fn operand_bits(&self) -> u32 {
        self.p_bits.max(self.n_bits)
    }
}

static SECP192R1: Domain = Domain {
    id: DomainId::Secp192r1,
    p: be_hex("fffffffffffffffffffffffffffffffeffffffffffffffff"),
    p_np: [0x00000000, 0x00000000, 0x00000080],
    a: be_hex("fffffffffffffffffffffffffffffffefffffffffffffffc"),
    b: be_hex("64210519e59c80e70fa7e9ab72243049feb8deecc146b9b1"),
    gx: be_hex("188da80eb03090f67cbf20eb43a18800f4ff0afd82ff1012"),
    gy: be_hex("07192b95ffc8da78631011ed6b24cdd573f977a11e794811"),
    n: be_hex("ffffffffffffffffffffffff99def836146bc9b1b4d22831"),
    n_np: [0x00000000, 0x00000000, 0x00000080],
    p_bits: 192,
    n_bits: 192,
};

static SECP224R1: Domain = Domain {
    id: DomainId::Secp224r1,
    p: be_hex("ffffffffffffffffffffffffffffffff000000000000000000000001"),
    p_np: [0x00000000, 0x00000000, 0x00000080],
    a: be_hex("fffffffffffffffffffffffffffffffefffffffffffffffffffffffe"),
    b: be_hex("b4050a850c04b3abf54132565044b0b7d7bfd8ba270b39432355ffb4"),
    gx: be_hex("b70e0cbd6bb4bf7f321390b94a03c1d356c21122343280d6115c1d21"),
    gy: be_hex("bd376388b5f723fb4c22dfe6cd4375a05a07476444d5819985007e34"),
    n: be_hex("ffffffffffffffffffffffffffff16a2e0b8f03e13dd29455c5c2a3d"),
    n_np: [0x00000000, 0x00000000, 0x00000080],
    p_bits: 224,
    n_bits: 224,
};

static SECP256R1: Domain = Domain {
    id: DomainId::Secp256r1,
    p: be_hex("ffffffff00000001000000000000000000000000ffffffffffffffffffffffff"),
    p_np: [0xffffffff, 0x0000007f, 0x00000080],
    a: be_hex("ffffffff00000001000000000000000000000000fffffffffffffffffffffffc"),
    b: be_hex("5ac635d8aa3a93e7b3ebbd55769886bc651d06b0cc53b0f63bce3c3e27d2604b"),
    gx: be_hex("6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296"),
    gy: be_hex("4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5"),
    n: be_hex("ffffffff00000000ffffffffffffffffbce6faada7179e84f3b9cac2fc632551"),
    n_np: [0xffffffff, 0x0000007f, 0x00000080],
    p_bits: 256,
    n_bits: 256,
};

static SECP384R1: Domain = Domain {
    id: DomainId::Secp384r1,
    p: be_hex(concat!(
        "ffffffffffffffffffffffffffffffff",
        "fffffffffffffffffffffffffffffffeffffffff0000000000000000ffffffff",
    )),
    p_np: [0x00000000, 0x00000000, 0x00000080],
    a: be_hex(concat!(
        "ffffffffffffffffffffffffffffffff",
        "fffffffffffffffffffffffffffffffeffffffff0000000000000000fffffffc",
    )),
    b: be_hex(concat!(
        "b3312fa7e23ee7e4988e056be3f82d19",
        "181d9c6efe8141120314088f5013875ac656398d8a2ed19d2a85c8edd3ec2aef",
    )),
    gx: be_hex(concat!(
        "aa87ca22be8b05378eb1c71ef320ad74",
        "6e1d3b628ba79b9859f741e082542a385502f25dbf55296c3a545e3872760ab7",
    )),
    gy: be_hex(concat!(
        "3617de4a96262c6f5d9e98bf9292dc29",
        "f8f41dbd289a147ce9da3113b5f0b8c00a60b1ce1d7e819d7a431d7c90ea0e5f",
    )),
    n: be_hex(concat!(
        "ffffffffffffffffffffffffffffffff",
        "ffffffffffffffffc7634d81f4372ddf581a0db248b0a77aecec196accc52973",
    )),
    n_np: [0x00000000, 0x00000000, 0x00000080],
    p_bits: 384,
    n_bits: 384,
};

static SECP521R1: Domain = Domain {
    id: DomainId::Secp521r1,
    p: be_hex(concat!(
        "1ff",
        "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff",
        "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff",
    )),
    p_np: [0x00000000, 0x00000000, 0x00000080],
    a: be_hex(concat!(
        "1ff",
        "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff",
        "fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffc",
    )),
    b: be_hex(concat!(
        "051",
        "953eb9618e1c9a1f929a21a0b68540eea2da725b99b315f3b8b489918ef109e1",
        "56193951ec7e937b1652c0bd3bb1bf073573df883d2c34f1ef451fd46b503f00",
    )),
    gx: be_hex(concat!(
        "0c6",
        "858e06b70404e9cd9e3ecb662395b4429c648139053fb521f828af606b4d3dba",
        "a14b5e77efe75928fe1dc127a2ffa8de3348b3c1856a429bf97e7e31c2e5bd66",
    )),
    gy: be_hex(concat!(
        "118",
        "39296a789a3bc0045c8a5fb42c7d1bd998f54449579b446817afbd17273e662c",
        "97ee72995ef42640c550b9013fad0761353c7086a272c24088be94769fd16650",
    )),
    n: be_hex(concat!(
        "1ff",
        "fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffa",
        "51868783bf2f966b7fcc0148f709a5d03bb5c9b8899c47aebb6fb71e91386409",
    )),
    n_np: [0x00000000, 0x00000000, 0x00000080],
    p_bits: 521,
    n_bits: 521,
};

static SECP256K1: Domain = Domain {
    id: DomainId::Secp256k1,
    p: be_hex("fffffffffffffffffffffffffffffffffffffffffffffffffffffffefffffc2f"),
    p_np: [0x00000000, 0x00000000, 0x00000080],
    a: be_hex("0000000000000000000000000000000000000000000000000000000000000000"),
    b: be_hex("0000000000000000000000000000000000000000000000000000000000000007"),
    gx: be_hex("79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"),
    gy: be_hex("483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8"),
    n: be_hex("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141"),
    n_np: [0x00000000, 0x00000000, 0x00000080],
    p_bits: 256,
    n_bits: 256,
};

#[cfg(test)]
mod tests {
    use super::*;
    use pka::{LeWords, NpMode, Pka, SessionParams, SoftPka};

    #[test]
    fn hex_words() {
        let words = be_hex("0123456789abcdef01");
        assert_eq!(&words[..3], &[0xabcd_ef01, 0x2345_6789, 0x01]);
        assert!(words[3..].iter().all(|w| *w == 0));
        assert_eq!(be_hex("abc")[0], 0xabc);
    }

    #[test]
    fn sizes() {
        let domain = DomainId::Secp521r1.domain();
        assert_eq!(domain.modulus_size(), FIELD_BYTES);
        assert_eq!(domain.modulus().len(), FIELD_WORDS);
        assert_eq!(domain.order_size(), 66);

        let domain = DomainId::Secp224r1.domain();
        assert_eq!(domain.modulus_size(), 28);
        assert_eq!(domain.order().len(), 7);
    }

    #[test]
    fn precomputed_tags_match_engine() {
        let pka = Pka::new(SoftPka::new());
        for id in DomainId::ALL {
            let domain = id.domain();
            let mut engine = pka
                .session(SessionParams::new(domain.operand_bits()))
                .unwrap();

            engine
                .set_modulus(&LeWords(domain.modulus()), None, NpMode::Full)
                .unwrap();
            assert_eq!(&engine.read_np().unwrap(), domain.modulus_np(), "{id:?}");

            engine
                .set_modulus(&LeWords(domain.order()), None, NpMode::Full)
                .unwrap();
            assert_eq!(&engine.read_np().unwrap(), domain.order_np(), "{id:?}");
        }
    }
}
