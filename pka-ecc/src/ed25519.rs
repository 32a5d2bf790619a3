//! Ed25519 signatures (RFC 8032) over the twisted Edwards form of
//! Curve25519, in extended coordinates `(X : Y : Z : T)` with `x = X/Z`,
//! `y = Y/Z` and `xy = T/Z`.
//!
//! Multiples of the base point use fixed-length signed odd radix-16
//! digits against a precomputed table of `G, 3G, …, 15G`, so the opcode
//! sequence depends only on the scalar's length, never its value.

use crate::{
    Ecc,
    curve25519::{self, ENCODED_SIZE, FIELD_BITS, P},
    sqrt,
};
use pka::{
    Accelerator, Engine, Error, LeBytes, LeWords, LenId, NpMode, Operand, Pka, Reg, Result,
    SessionParams, ct, regs::NP_WORDS,
};
use sha2::{Digest, Sha512};
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};
use zeroize::Zeroizing;

/// Secret seed size in bytes.
pub const SEED_SIZE: usize = 32;

/// Encoded public key size in bytes.
pub const PUBLIC_KEY_SIZE: usize = ENCODED_SIZE;

/// Signature size in bytes: `R || S`.
pub const SIGNATURE_SIZE: usize = 2 * ENCODED_SIZE;

/// Ed25519 secret seed.
pub type Ed25519Seed = [u8; SEED_SIZE];

/// Encoded Ed25519 public key.
pub type Ed25519PublicKey = [u8; PUBLIC_KEY_SIZE];

/// Ed25519 signature `R || S`.
pub type Ed25519Signature = [u8; SIGNATURE_SIZE];

/// Little-endian words of a scalar below `2^256`.
type Scalar = [u32; 8];

/// Group order `L = 2^252 + 27742317777372353535851937790883648493`.
const L: Scalar = [
    0x5cf5_d3ed,
    0x5812_631a,
    0xa2f7_9cd6,
    0x14de_f9de,
    0x0000_0000,
    0x0000_0000,
    0x0000_0000,
    0x1000_0000,
];

/// Barrett tag of `L`.
const L_NP: [u32; NP_WORDS] = [0xffff_ffff, 0xffff_ffff, 0xff];

/// `d = -121665/121666`
const D: [u32; 8] = [
    0x1359_78a3,
    0x75eb_4dca,
    0x4141_d8ab,
    0x0070_0a4d,
    0x7779_e898,
    0x8cc7_4079,
    0x2b6f_fe73,
    0x5203_6cee,
];

/// `2d`
const D2: [u32; 8] = [
    0x26b2_f159,
    0xebd6_9b94,
    0x8283_b156,
    0x00e0_149a,
    0xeef3_d130,
    0x198e_80f2,
    0x56df_fce7,
    0x2406_d9dc,
];

/// Register width: wide enough for an unreduced SHA-512 output.
const WIDE_BITS: u32 = 512;

/// Radix-16 digits of a scalar below `2^254`.
const DIGITS: usize = 64;

/// `(x, y, xy)` of the odd multiples `G, 3G, …, 15G`.
const BASE_TABLE: [[[u32; 8]; 3]; 8] = [
    // 1G
    [
        [
            0x8f25_d51a, 0xc956_2d60, 0x9525_a7b2, 0x692c_c760,
            0xfdd6_dc5c, 0xc0a4_e231, 0xcd6e_53fe, 0x2169_36d3,
        ],
        [
            0x6666_6658, 0x6666_6666, 0x6666_6666, 0x6666_6666,
            0x6666_6666, 0x6666_6666, 0x6666_6666, 0x6666_6666,
        ],
        [
            0xa5b7_dda3, 0x6dde_8ab3, 0x7751_52f5, 0x20f0_9f80,
            0x64ab_e37d, 0x66ea_4e8e, 0xd78b_7665, 0x6787_5f0f,
        ],
    ],
    // 3G
    [
        [
            0xd3f8_e25c, 0xac62_485f, 0x8162_4886, 0x6343_9819,
            0x3eda_c83a, 0x1ff4_ae74, 0x2292_8f49, 0x67ae_9c4a,
        ],
        [
            0x78f5_b4d4, 0x02c3_6848, 0x6724_0304, 0x9f16_ec17,
            0x6026_9ef7, 0xa126_a18e, 0x77ee_69ab, 0x1267_b1d1,
        ],
        [
            0x78b3_a41a, 0xcdf9_08fa, 0xfb16_fc4a, 0x5c27_358b,
            0xadb9_1527, 0xebef_3783, 0xb1dd_9510, 0x2a4d_025c,
        ],
    ],
    // 5G
    [
        [
            0x322e_f233, 0x9140_9cc0, 0x3e1b_e1a5, 0x5c28_19f9,
            0xd12d_a5de, 0xfcef_7cf7, 0xade3_587b, 0x49fd_a73e,
        ],
        [
            0xd676_c8ed, 0x10d2_1f83, 0x8943_0b5d, 0x3128_2eca,
            0x8992_4666, 0xe02c_6e14, 0x98fe_ae6f, 0x5f48_25b2,
        ],
        [
            0xf3e8_01d0, 0x6419_50bc, 0x0009_26bf, 0xafb9_4e85,
            0x8736_c7f9, 0x3160_ea50, 0x9c59_3d4c, 0x745c_562c,
        ],
    ],
    // 7G
    [
        [
            0xf50e_4107, 0x5855_981a, 0xbbf1_ce95, 0x83e8_09f3,
            0x4b1d_8107, 0xe9e3_ee19, 0xfcf4_bd4e, 0x1456_8685,
        ],
        [
            0x9f40_62b8, 0x12c4_c4b5, 0xf7ab_f23d, 0xf088_2b46,
            0xdd36_ad41, 0x87ce_6468, 0x2b47_d52f, 0x31c5_63e3,
        ],
        [
            0x5587_ed1b, 0x10bd_4556, 0x1e9a_a4e4, 0x5294_632a,
            0x89d5_bab4, 0x9be8_2dc5, 0x1d16_5e1b, 0x119e_77b1,
        ],
    ],
    // 9G
    [
        [
            0x5185_715c, 0xd3e0_2306, 0x2e4e_0294, 0x86d8_0e5c,
            0x6f94_22b8, 0x1bf3_36e0, 0xc800_7165, 0x357c_c970,
        ],
        [
            0x5522_f1c0, 0xc74e_4484, 0x236e_4430, 0x1f78_9013,
            0x56f2_d2fd, 0xb2be_fce9, 0xc2dd_0df4, 0x7f3d_23c2,
        ],
        [
            0x88b2_f465, 0x5c3b_386f, 0xf770_327e, 0x17b3_d4a0,
            0xf747_cd74, 0xdb66_76ad, 0xea87_cbf9, 0x5c70_fc48,
        ],
    ],
    // 11G
    [
        [
            0x207c_f3cb, 0xff2f_d2c1, 0xc593_d552, 0xd381_a5b2,
            0xd671_2438, 0xb6cf_078d, 0x154b_e417, 0x14e5_28b1,
        ],
        [
            0x6a03_3713, 0x308f_2dc3, 0x3c9c_58d4, 0x1258_591c,
            0x40ff_0fce, 0x5a6f_7ce3, 0x3f21_ab97, 0x2d90_8231,
        ],
        [
            0xdb5b_eed4, 0xeb85_cf2e, 0xe18f_c837, 0x5900_01dd,
            0xf216_adbf, 0x39ca_a6be, 0x800f_28a2, 0x5ae6_a565,
        ],
    ],
    // 13G
    [
        [
            0xb7c0_5fed, 0x3780_e073, 0x8d22_b7b8, 0x8843_e3e8,
            0x282d_304f, 0xdb33_adf0, 0xd5f3_66cc, 0x1074_27e0,
        ],
        [
            0xea40_1f80, 0x87ef_e1ae, 0x289a_2723, 0x3740_cfb2,
            0xd2da_89b8, 0x7846_6022, 0xed53_8b74, 0x12db_b00d,
        ],
        [
            0xe8de_2f53, 0x522c_dccd, 0xeb2e_8efc, 0x5b14_aa51,
            0xcd56_2338, 0xc5c0_dd61, 0x17be_6460, 0x4128_06b9,
        ],
    ],
    // 15G
    [
        [
            0x66a1_8dc1, 0x9061_7f3e, 0x7701_89cb, 0xd963_1374,
            0x5d20_419e, 0xdc5a_c6f9, 0xec2e_c435, 0x4f16_2dea,
        ],
        [
            0xad2e_5cdf, 0x946d_4cc4, 0xa19a_9aa1, 0xace5_af18,
            0x64d2_9331, 0x5162_f701, 0x04ff_22f5, 0x12cb_fb2d,
        ],
        [
            0x5c92_bf29, 0x140d_7f33, 0xe40a_e5f5, 0xfa63_b68f,
            0x4176_0de2, 0xab24_fd22, 0x36b7_7491, 0x5e33_f00e,
        ],
    ],
];

/// Little-endian words of 32 bytes.
fn scalar_from_le(bytes: &[u8]) -> Scalar {
    let mut k = [0u32; 8];
    for (w, chunk) in k.iter_mut().zip(bytes.chunks_exact(4)) {
        *w = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    k
}

/// `k` if odd, else `k + L`; the result stays below `2^254` for `k < L`.
fn make_odd(k: &Scalar) -> Zeroizing<Scalar> {
    let mut sum = Zeroizing::new([0u32; 8]);
    let mut carry = 0u64;
    for (s, (a, b)) in sum.iter_mut().zip(k.iter().zip(L.iter())) {
        let t = *a as u64 + *b as u64 + carry;
        *s = t as u32;
        carry = t >> 32;
    }

    let even = Choice::from((!k[0] & 1) as u8);
    let mut out = Zeroizing::new(*k);
    for (o, s) in out.iter_mut().zip(sum.iter()) {
        o.conditional_assign(s, even);
    }
    out
}

/// Five bits of `k` starting at `bit`.
fn window(k: &Scalar, bit: usize) -> u32 {
    let (word, shift) = (bit / 32, bit % 32);
    let mut w = k[word] >> shift;
    if shift > 27 && word + 1 < k.len() {
        w |= k[word + 1] << (32 - shift);
    }
    w & 31
}

/// Signed odd digits `d_i ∈ {±1, ±3, …, ±15}` with `k = Σ d_i·16^i` for an
/// odd `k` below `2^254`.
///
/// With `k_0 = k` and `k_{i+1} = (k_i >> 4) | 1`, each digit is
/// `(k_i mod 32) - 16` and the last one is `k_63` itself.
fn recode(k: &Scalar) -> Zeroizing<[i8; DIGITS]> {
    let mut digits = Zeroizing::new([0i8; DIGITS]);
    for (i, d) in digits.iter_mut().enumerate().take(DIGITS - 1) {
        *d = ((window(k, 4 * i) | 1) as i8) - 16;
    }
    digits[DIGITS - 1] = ((k[7] >> 28) | 1) as i8;
    digits
}

/// Point in extended coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Extended {
    x: Reg,
    y: Reg,
    z: Reg,
    t: Reg,
}

/// Registers of one Ed25519 session.
struct EdCurve<'a, A: Accelerator> {
    engine: Engine<'a, A>,
    d2: Reg,
    t: [Reg; 6],
    acc: Extended,
    /// Table entry or second operand of an addition.
    entry: Extended,
    /// Decoded public key.
    key: Extended,
    /// `[S]B` while the key multiple is computed.
    partial: Extended,
    neg_x: Reg,
    neg_t: Reg,
}

impl<'a, A: Accelerator> EdCurve<'a, A> {
    fn open(pka: &'a Pka<A>) -> Result<Self> {
        let engine =
            pka.session(SessionParams::new(FIELD_BITS).with_register_bits(WIDE_BITS))?;

        let mut pool = engine.pool();
        let d2 = pool.take()?;
        let t = pool.take_array()?;
        let [ax, ay, az, at, ex, ey, ez, et] = pool.take_array()?;
        let [kx, ky, kz, kt, px, py, pz, pt] = pool.take_array()?;
        let [neg_x, neg_t] = pool.take_array()?;

        let mut curve = Self {
            engine,
            d2,
            t,
            acc: Extended {
                x: ax,
                y: ay,
                z: az,
                t: at,
            },
            entry: Extended {
                x: ex,
                y: ey,
                z: ez,
                t: et,
            },
            key: Extended {
                x: kx,
                y: ky,
                z: kz,
                t: kt,
            },
            partial: Extended {
                x: px,
                y: py,
                z: pz,
                t: pt,
            },
            neg_x,
            neg_t,
        };

        curve.use_field()?;
        curve.engine.copy_into_register(d2, &LeWords(D2))?;
        log::debug!("pka-ecc: ed25519 session opened");
        Ok(curve)
    }

    fn use_field(&mut self) -> Result<()> {
        curve25519::use_field(&mut self.engine)
    }

    fn use_order(&mut self) -> Result<()> {
        self.engine
            .set_modulus(&LeWords(L), Some(&L_NP[..]), NpMode::Full)
    }

    /// `reg = value mod L` for a little-endian value of up to 512 bits.
    /// The order must be the active modulus.
    fn load_reduced(&mut self, reg: Reg, value: &[u8]) -> Result<()> {
        self.engine.copy_into_register(reg, &LeBytes(value))?;
        self.engine.reduce(LenId::MAX, reg, reg)
    }

    fn read_scalar(&mut self, reg: Reg) -> Result<Zeroizing<Scalar>> {
        let mut k = Zeroizing::new([0u32; 8]);
        self.engine.read_words(reg, &mut k[..])?;
        Ok(k)
    }

    /// `SHA-512(parts) mod L`; leaves the order active.
    fn hash_to_scalar(&mut self, parts: &[&[u8]]) -> Result<Zeroizing<Scalar>> {
        let mut hash = Sha512::new();
        for part in parts {
            hash.update(part);
        }
        let mut digest = Zeroizing::new([0u8; 64]);
        digest.copy_from_slice(&hash.finalize());

        self.use_order()?;
        let reg = self.t[0];
        self.load_reduced(reg, &digest[..])?;
        self.read_scalar(reg)
    }

    fn set_identity(&mut self, p: Extended) -> Result<()> {
        self.engine.clear(LenId::MAX, p.x)?;
        self.engine.set_value(LenId::MAX, p.y, 1)?;
        self.engine.set_value(LenId::MAX, p.z, 1)?;
        self.engine.clear(LenId::MAX, p.t)
    }

    fn copy_point(&mut self, dst: Extended, src: Extended) -> Result<()> {
        for (d, s) in [(dst.x, src.x), (dst.y, src.y), (dst.z, src.z), (dst.t, src.t)] {
            self.engine.copy(LenId::MAX, d, s)?;
        }
        Ok(())
    }

    /// `P = P + Q` (add-2008-hwcd-3, complete for this curve).
    fn add(&mut self, p: Extended, q: Extended) -> Result<()> {
        let [t0, t1, a, b, c, d] = self.t;
        let e = &mut self.engine;

        e.mod_sub(t0, p.y, p.x)?;
        e.mod_sub(t1, q.y, q.x)?;
        e.mod_mul(a, t0, t1)?;
        e.mod_add(t0, p.y, p.x)?;
        e.mod_add(t1, q.y, q.x)?;
        e.mod_mul(b, t0, t1)?;
        e.mod_mul(c, p.t, q.t)?;
        e.mod_mul(c, c, self.d2)?;
        e.mod_mul(d, p.z, q.z)?;
        e.mod_add(d, d, d)?;

        // e = b - a, h = b + a, f = d - c, g = d + c
        e.mod_sub(t0, b, a)?;
        e.mod_add(t1, b, a)?;
        e.mod_sub(a, d, c)?;
        e.mod_add(b, d, c)?;

        e.mod_mul(p.x, t0, a)?;
        e.mod_mul(p.y, b, t1)?;
        e.mod_mul(p.t, t0, t1)?;
        e.mod_mul(p.z, a, b)
    }

    /// `P = 2P` (dbl-2008-hwcd with `a = -1`).
    fn double(&mut self, p: Extended) -> Result<()> {
        let [a, b, c, e, g, _] = self.t;
        let en = &mut self.engine;

        en.mod_mul(a, p.x, p.x)?;
        en.mod_mul(b, p.y, p.y)?;
        en.mod_mul(c, p.z, p.z)?;
        en.mod_add(c, c, c)?;
        en.mod_add(e, p.x, p.y)?;
        en.mod_mul(e, e, e)?;
        en.mod_sub(e, e, a)?;
        en.mod_sub(e, e, b)?;

        // d = -a, g = d + b, h = d - b (into b), f = g - c (into c)
        en.mod_neg(a, a)?;
        en.mod_add(g, a, b)?;
        en.mod_sub(b, a, b)?;
        en.mod_sub(c, g, c)?;

        en.mod_mul(p.x, e, c)?;
        en.mod_mul(p.y, g, b)?;
        en.mod_mul(p.t, e, b)?;
        en.mod_mul(p.z, c, g)
    }

    /// Load the table entry `|d|·G`, chosen without secret-dependent
    /// branches or indexing, into `entry`.
    fn load_entry(&mut self, magnitude: u32) -> Result<()> {
        let index = (magnitude.wrapping_sub(1)) >> 1;
        let mut coords = Zeroizing::new([[0u32; 8]; 3]);
        for (j, point) in BASE_TABLE.iter().enumerate() {
            let hit = (j as u32).ct_eq(&index);
            for (dst, src) in coords.iter_mut().zip(point) {
                for (w, s) in dst.iter_mut().zip(src) {
                    w.conditional_assign(s, hit);
                }
            }
        }

        let entry = self.entry;
        self.engine.copy_into_register(entry.x, &LeWords(&coords[0][..]))?;
        self.engine.copy_into_register(entry.y, &LeWords(&coords[1][..]))?;
        self.engine.copy_into_register(entry.t, &LeWords(&coords[2][..]))?;
        self.engine.set_value(LenId::MAX, entry.z, 1)
    }

    /// `acc = [k]G` for `k < L`. The field must be the active modulus.
    fn mul_base(&mut self, k: &Scalar) -> Result<()> {
        let odd = make_odd(k);
        let digits = recode(&odd);
        let (acc, entry) = (self.acc, self.entry);

        self.load_entry(digits[DIGITS - 1] as u32)?;
        self.copy_point(acc, entry)?;

        for &d in digits[..DIGITS - 1].iter().rev() {
            for _ in 0..4 {
                self.double(acc)?;
            }

            let mask = (d >> 7) as i32;
            let magnitude = ((d as i32 ^ mask) - mask) as u32;
            self.load_entry(magnitude)?;

            // Negate by register identity so both signs run the same opcodes.
            self.engine.mod_neg(self.neg_x, entry.x)?;
            self.engine.mod_neg(self.neg_t, entry.t)?;
            let negative = Choice::from((mask & 1) as u8);
            let signed = Extended {
                x: Reg::conditional_select(&entry.x, &self.neg_x, negative),
                t: Reg::conditional_select(&entry.t, &self.neg_t, negative),
                ..entry
            };
            self.add(acc, signed)?;
        }

        self.engine.wipe(self.neg_x)?;
        self.engine.wipe(self.neg_t)
    }

    /// `acc = [k]P` for a public scalar.
    fn mul_public(&mut self, k: &Scalar, p: Extended) -> Result<()> {
        let acc = self.acc;
        self.set_identity(acc)?;
        for i in (0..256).rev() {
            self.double(acc)?;
            if (k[i / 32] >> (i % 32)) & 1 == 1 {
                self.add(acc, p)?;
            }
        }
        Ok(())
    }

    /// RFC 8032 encoding: `y` little-endian with the parity of `x` in the
    /// top bit.
    fn encode(&mut self, p: Extended) -> Result<[u8; ENCODED_SIZE]> {
        let [zi, e, x, y, ..] = self.t;
        curve25519::invert(&mut self.engine, zi, p.z, e)?;
        self.engine.mod_mul(x, p.x, zi)?;
        self.engine.mod_mul(y, p.y, zi)?;

        let mut out = [0u8; ENCODED_SIZE];
        curve25519::read_le(&mut self.engine, y, &mut out)?;
        let x_odd = self.engine.test_bit(LenId::MAX, x, 0)?;
        out[31] |= (x_odd as u8) << 7;
        Ok(out)
    }

    /// Decode an encoded point into `out`.
    fn decode(&mut self, bytes: &[u8; ENCODED_SIZE], out: Extended) -> Result<()> {
        let x_odd = bytes[31] >> 7 == 1;
        let mut y = *bytes;
        y[31] &= 0x7f;
        if !bool::from(ct::less_than(&scalar_from_le(&y), &P)) {
            return Err(Error::InvalidPointEncoding);
        }

        // x² = (y² - 1) / (d·y² + 1)
        let [u, v, inv, e, ..] = self.t;
        let en = &mut self.engine;
        en.copy_into_register(out.y, &LeBytes(&y[..]))?;
        en.mod_mul(u, out.y, out.y)?;
        en.copy_into_register(v, &LeWords(D))?;
        en.mod_mul(v, v, u)?;
        en.mod_add(v, v, Operand::Imm(1))?;
        en.mod_sub(u, u, Operand::Imm(1))?;
        curve25519::invert(en, inv, v, e)?;
        en.mod_mul(u, u, inv)?;

        let entry = self.entry;
        let scratch = [entry.x, entry.y, entry.z, entry.t, self.neg_x, self.neg_t];
        sqrt::mod_sqrt(&mut self.engine, out.x, u, scratch).map_err(|err| match err {
            Error::ModSquareRootNotExist => Error::InvalidPointEncoding,
            err => err,
        })?;

        if self.engine.test_bit(LenId::MAX, out.x, 0)? != x_odd {
            if self.engine.is_zero(LenId::N, out.x)? {
                return Err(Error::InvalidPointEncoding);
            }
            self.engine.mod_neg(out.x, out.x)?;
        }

        self.engine.set_value(LenId::MAX, out.z, 1)?;
        self.engine.mod_mul(out.t, out.x, out.y)
    }
}

/// Expanded secret: the clamped scalar `s` and the nonce prefix.
struct ExpandedSeed {
    hash: Zeroizing<[u8; 64]>,
}

impl ExpandedSeed {
    fn new(seed: &Ed25519Seed) -> Self {
        let mut hash = Zeroizing::new([0u8; 64]);
        hash.copy_from_slice(&Sha512::digest(seed));
        hash[0] &= 248;
        hash[31] &= 127;
        hash[31] |= 64;
        Self { hash }
    }

    fn scalar(&self) -> &[u8] {
        &self.hash[..32]
    }

    fn prefix(&self) -> &[u8] {
        &self.hash[32..]
    }
}

impl<A: Accelerator> EdCurve<'_, A> {
    /// `[s]G` for the clamped scalar of `seed`, returned with `s mod L`.
    fn public_key(
        &mut self,
        secret: &ExpandedSeed,
    ) -> Result<(Zeroizing<Scalar>, Ed25519PublicKey)> {
        self.use_order()?;
        let reg = self.t[0];
        self.load_reduced(reg, secret.scalar())?;
        let s = self.read_scalar(reg)?;

        self.use_field()?;
        self.mul_base(&s)?;
        let public = self.encode(self.acc)?;
        Ok((s, public))
    }
}

impl<A: Accelerator> Ecc<'_, A> {
    /// Public key of `seed`.
    pub fn ed25519_public_key(&self, seed: &Ed25519Seed) -> Result<Ed25519PublicKey> {
        let secret = ExpandedSeed::new(seed);
        let mut curve = EdCurve::open(self.pka())?;
        curve.public_key(&secret).map(|(_, public)| public)
    }

    /// Sign `msg` with the key derived from `seed`.
    pub fn ed25519_sign(&self, seed: &Ed25519Seed, msg: &[u8]) -> Result<Ed25519Signature> {
        let secret = ExpandedSeed::new(seed);
        let mut curve = EdCurve::open(self.pka())?;
        let (s, public) = curve.public_key(&secret)?;

        // R = [r]G with r = H(prefix || M)
        let r = curve.hash_to_scalar(&[secret.prefix(), msg])?;
        curve.use_field()?;
        curve.mul_base(&r)?;
        let big_r = curve.encode(curve.acc)?;

        // S = r + H(R || A || M)·s mod L
        let k = curve.hash_to_scalar(&[&big_r, &public, msg])?;
        let [kr, sr, rr, ..] = curve.t;
        let en = &mut curve.engine;
        en.copy_into_register(kr, &LeWords(&k[..]))?;
        en.copy_into_register(sr, &LeWords(&s[..]))?;
        en.copy_into_register(rr, &LeWords(&r[..]))?;
        en.mod_mul(kr, kr, sr)?;
        en.mod_add(kr, kr, rr)?;

        let mut sig = [0u8; SIGNATURE_SIZE];
        sig[..ENCODED_SIZE].copy_from_slice(&big_r);
        let mut big_s = [0u8; ENCODED_SIZE];
        curve25519::read_le(en, kr, &mut big_s)?;
        sig[ENCODED_SIZE..].copy_from_slice(&big_s);
        Ok(sig)
    }

    /// Verify `signature` over `msg`: accept iff `[S]G - [k]A` encodes to
    /// `R`, with `k = H(R || A || M)`.
    ///
    /// A public key that does not decode fails with
    /// [`Error::InvalidPointEncoding`]; any other rejection is
    /// [`Error::VerifyFailed`].
    pub fn ed25519_verify(
        &self,
        public_key: &Ed25519PublicKey,
        msg: &[u8],
        signature: &Ed25519Signature,
    ) -> Result<()> {
        let (big_r, big_s) = signature.split_at(ENCODED_SIZE);
        let s = scalar_from_le(big_s);
        if !bool::from(ct::less_than(&s, &L)) {
            return Err(Error::VerifyFailed);
        }

        let mut curve = EdCurve::open(self.pka())?;
        let key = curve.key;
        curve.decode(public_key, key)?;
        curve.engine.mod_neg(key.x, key.x)?;
        curve.engine.mod_neg(key.t, key.t)?;

        let k = curve.hash_to_scalar(&[big_r, public_key, msg])?;
        curve.use_field()?;

        let (acc, partial) = (curve.acc, curve.partial);
        curve.mul_base(&s)?;
        curve.copy_point(partial, acc)?;
        curve.mul_public(&k, key)?;
        curve.add(acc, partial)?;

        let encoded = curve.encode(acc)?;
        match bool::from(ct::buffers_equal(&encoded, big_r)) {
            true => Ok(()),
            false => Err(Error::VerifyFailed),
        }
    }
}
