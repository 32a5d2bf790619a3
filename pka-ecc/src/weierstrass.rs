//! Short Weierstrass point arithmetic on the accelerator.
//!
//! Points live in registers. Affine points are `(x, y)` with the identity
//! written as `(0, 0)`. Jacobian points `(X, Y, Z)` stand for
//! `(X/Z², Y/Z³)` with the identity at `Z = 0`; the modified Jacobian form
//! additionally carries `T = a·Z⁴`, which makes doubling cheaper.
//!
//! Inside the formulas products are left partially reduced (below `2p`);
//! additions, subtractions and normalization bring values back below `p`.

use crate::{
    config::{EcConfig, InversionMode, PubKeyCheck, ScalarMultMode},
    domain::{Domain, FIELD_WORDS},
    naf::Naf,
    point::AffinePoint,
    sqrt,
};
use core::cmp::Ordering;
use pka::{
    Accelerator, Engine, Error, LeWords, LenId, NpMode, Operand, Pka, Reg, Result, SessionParams,
    ct, effective_bit_length, regs::REG_COUNT,
};
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};
use zeroize::Zeroizing;

/// Affine point held in registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Affine {
    pub(crate) x: Reg,
    pub(crate) y: Reg,
}

/// Jacobian point held in registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Jacobian {
    pub(crate) x: Reg,
    pub(crate) y: Reg,
    pub(crate) z: Reg,
}

/// Modified Jacobian point held in registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Modified {
    pub(crate) x: Reg,
    pub(crate) y: Reg,
    pub(crate) z: Reg,
    pub(crate) t: Reg,
}

impl Modified {
    fn jacobian(self) -> Jacobian {
        Jacobian {
            x: self.x,
            y: self.y,
            z: self.z,
        }
    }
}

impl ConditionallySelectable for Affine {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Self {
            x: Reg::conditional_select(&a.x, &b.x, choice),
            y: Reg::conditional_select(&a.y, &b.y, choice),
        }
    }
}

impl ConditionallySelectable for Modified {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Self {
            x: Reg::conditional_select(&a.x, &b.x, choice),
            y: Reg::conditional_select(&a.y, &b.y, choice),
            z: Reg::conditional_select(&a.z, &b.z, choice),
            t: Reg::conditional_select(&a.t, &b.t, choice),
        }
    }
}

/// Modulus currently resident in [`Reg::N`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Modulus {
    Field,
    Order,
    Other,
}

/// Is bit `index` of the little-endian words `k` set?
pub(crate) fn bit(k: &[u32], index: usize) -> bool {
    k.get(index / 32).is_some_and(|w| (w >> (index % 32)) & 1 == 1)
}

/// An accelerator session laid out for one curve.
///
/// Registers are assigned once when the session opens; the operations
/// below name the ones they read and write.
pub(crate) struct Curve<'a, A: Accelerator> {
    pub(crate) engine: Engine<'a, A>,
    pub(crate) domain: &'static Domain,
    config: EcConfig,
    modulus: Modulus,
    a: Reg,
    t: [Reg; 7],
    acc: Modified,
    aux: Modified,
    /// Input points and precomputed multiples.
    pub(crate) table: [Affine; 3],
    /// Result of checks that need a throwaway point.
    spare: Affine,
    neg: Reg,
    /// Scalar registers free for the protocol layer.
    pub(crate) s: [Reg; 2],
}

impl<'a, A: Accelerator> Curve<'a, A> {
    /// Open a session for `domain` with the field modulus active.
    pub(crate) fn open(pka: &'a Pka<A>, domain: &'static Domain, config: EcConfig) -> Result<Self> {
        let engine =
            pka.session(SessionParams::new(domain.operand_bits()).with_reg_count(REG_COUNT))?;

        let mut pool = engine.pool();
        let a = pool.take()?;
        let t = pool.take_array()?;
        let [ax, ay, az, at, bx, by, bz, bt] = pool.take_array()?;
        let [p1x, p1y, p2x, p2y, p3x, p3y, sx, sy] = pool.take_array()?;
        let neg = pool.take()?;
        let s = pool.take_array()?;

        let mut curve = Self {
            engine,
            domain,
            config,
            modulus: Modulus::Other,
            a,
            t,
            acc: Modified {
                x: ax,
                y: ay,
                z: az,
                t: at,
            },
            aux: Modified {
                x: bx,
                y: by,
                z: bz,
                t: bt,
            },
            table: [
                Affine { x: p1x, y: p1y },
                Affine { x: p2x, y: p2y },
                Affine { x: p3x, y: p3y },
            ],
            spare: Affine { x: sx, y: sy },
            neg,
            s,
        };

        curve.use_field()?;
        curve.load(a, domain.a())?;
        log::debug!("pka-ecc: {:?} session opened", domain.id());
        Ok(curve)
    }

    /// Make `p` the active modulus.
    pub(crate) fn use_field(&mut self) -> Result<()> {
        if self.modulus != Modulus::Field {
            self.engine.set_modulus(
                &LeWords(self.domain.modulus()),
                Some(&self.domain.modulus_np()[..]),
                NpMode::Full,
            )?;
            self.modulus = Modulus::Field;
        }
        Ok(())
    }

    /// Make the group order `n` the active modulus.
    pub(crate) fn use_order(&mut self) -> Result<()> {
        if self.modulus != Modulus::Order {
            self.engine.set_modulus(
                &LeWords(self.domain.order()),
                Some(&self.domain.order_np()[..]),
                NpMode::Full,
            )?;
            self.modulus = Modulus::Order;
        }
        Ok(())
    }

    /// Make an arbitrary value the active modulus, computing its tag.
    pub(crate) fn use_modulus(&mut self, words: &[u32]) -> Result<()> {
        self.engine
            .set_modulus(&LeWords(words), None, NpMode::Full)?;
        self.modulus = Modulus::Other;
        Ok(())
    }

    /// Load little-endian words into `reg`.
    pub(crate) fn load(&mut self, reg: Reg, words: &[u32]) -> Result<()> {
        self.engine.copy_into_register(reg, &LeWords(words))
    }

    /// Read the low [`FIELD_WORDS`] words of `reg`.
    pub(crate) fn read(&mut self, reg: Reg) -> Result<Zeroizing<[u32; FIELD_WORDS]>> {
        let mut words = Zeroizing::new([0u32; FIELD_WORDS]);
        let len = FIELD_WORDS.min(self.engine.registers().reg_words());
        self.engine.read_words(reg, &mut words[..len])?;
        Ok(words)
    }

    pub(crate) fn load_point(&mut self, p: Affine, point: &AffinePoint) -> Result<()> {
        self.load(p.x, point.x())?;
        self.load(p.y, point.y())
    }

    pub(crate) fn read_point(&mut self, p: Affine) -> Result<AffinePoint> {
        let words = self.domain.modulus_words();
        let x = self.read(p.x)?;
        let y = self.read(p.y)?;
        Ok(AffinePoint::from_words(
            self.domain.id(),
            &x[..words],
            &y[..words],
        ))
    }

    /// `r = a^-1` modulo the active prime modulus.
    pub(crate) fn invert(&mut self, r: Reg, a: Reg) -> Result<()> {
        if self.engine.is_zero(LenId::N, a)? {
            return Err(Error::ModInverseNotExist);
        }

        match self.config.inversion {
            InversionMode::Fermat => {
                let e = self.t[6];
                self.engine.copy(LenId::MAX, e, Reg::N)?;
                self.engine.sub(LenId::MAX, e, e, Operand::Imm(2))?;
                self.engine.mod_exp(r, a, e)
            }
            InversionMode::Euclid => self.engine.mod_inv(r, a),
        }
    }

    fn copy_point(&mut self, dst: Modified, src: Modified) -> Result<()> {
        self.engine.copy(LenId::MAX, dst.x, src.x)?;
        self.engine.copy(LenId::MAX, dst.y, src.y)?;
        self.engine.copy(LenId::MAX, dst.z, src.z)?;
        self.engine.copy(LenId::MAX, dst.t, src.t)
    }

    /// `P = (x, y, 1, a)`
    fn set_affine(&mut self, p: Modified, q: Affine) -> Result<()> {
        self.engine.copy(LenId::MAX, p.x, q.x)?;
        self.engine.copy(LenId::MAX, p.y, q.y)?;
        self.engine.set_value(LenId::MAX, p.z, 1)?;
        self.engine.copy(LenId::MAX, p.t, self.a)
    }

    /// `P = (1, 1, 0, 0)`
    fn set_infinity(&mut self, p: Modified) -> Result<()> {
        self.engine.set_value(LenId::MAX, p.x, 1)?;
        self.engine.set_value(LenId::MAX, p.y, 1)?;
        self.engine.clear(LenId::MAX, p.z)?;
        self.engine.clear(LenId::MAX, p.t)
    }

    /// `T = a·Z⁴`
    fn update_t(&mut self, p: Modified) -> Result<()> {
        let t0 = self.t[0];
        self.engine.mod_mul_nr(t0, p.z, p.z)?;
        self.engine.mod_mul_nr(t0, t0, t0)?;
        self.engine.mod_mul(p.t, t0, self.a)
    }

    /// `P = 2P` in modified Jacobian coordinates.
    ///
    /// `T` must be valid on entry. With `keep_t` unset the result is only
    /// a Jacobian point: its `T` is stale.
    fn double(&mut self, p: Modified, keep_t: bool) -> Result<()> {
        let [t0, t1, t2, t3, ..] = self.t;
        let e = &mut self.engine;

        // S = 4XY², U = 8Y⁴, M = 3X² + T
        e.mod_mul_nr(t0, p.y, p.y)?;
        e.mod_mul_nr(t1, p.x, t0)?;
        e.mod_add(t1, t1, t1)?;
        e.mod_add(t1, t1, t1)?;
        e.mod_mul_nr(t2, t0, t0)?;
        e.mod_add(t2, t2, t2)?;
        e.mod_add(t2, t2, t2)?;
        e.mod_add(t2, t2, t2)?;
        e.mod_mul_nr(t3, p.x, p.x)?;
        e.mod_add(t0, t3, t3)?;
        e.mod_add(t3, t0, t3)?;
        e.mod_add(t3, t3, p.t)?;

        // Z' = 2YZ
        e.mod_mul_nr(t0, p.y, p.z)?;
        e.mod_add(p.z, t0, t0)?;

        // X' = M² - 2S
        e.mod_mul_nr(t0, t3, t3)?;
        e.mod_sub(t0, t0, t1)?;
        e.mod_sub(p.x, t0, t1)?;

        // Y' = M(S - X') - U
        e.mod_sub(t0, t1, p.x)?;
        e.mod_mul_nr(t0, t3, t0)?;
        e.mod_sub(p.y, t0, t2)?;

        if keep_t {
            // T' = 2UT
            e.mod_mul_nr(t0, t2, p.t)?;
            e.mod_add(p.t, t0, t0)?;
        }
        Ok(())
    }

    /// `P = P + Q` for a Jacobian `P` and an affine `Q`; the result is in
    /// modified Jacobian form.
    ///
    /// `Q` must not be the identity.
    fn add_affine(&mut self, p: Modified, q: Affine) -> Result<()> {
        if self.engine.is_zero(LenId::N, p.z)? {
            return self.set_affine(p, q);
        }

        let [t0, t1, t2, t3, t4, ..] = self.t;
        {
            let e = &mut self.engine;
            // H = x₂Z² - X, R = y₂Z³ - Y
            e.mod_mul_nr(t0, p.z, p.z)?;
            e.mod_mul_nr(t1, q.x, t0)?;
            e.mod_mul_nr(t2, p.z, t0)?;
            e.mod_mul_nr(t2, q.y, t2)?;
            e.mod_sub(t1, t1, p.x)?;
            e.mod_sub(t2, t2, p.y)?;
        }

        if self.engine.is_zero(LenId::N, t1)? {
            if self.engine.is_zero(LenId::N, t2)? {
                self.update_t(p)?;
                return self.double(p, true);
            }
            return self.set_infinity(p);
        }

        {
            let e = &mut self.engine;
            e.mod_mul(p.z, p.z, t1)?;

            // HH, HHH, V = X·HH
            e.mod_mul_nr(t3, t1, t1)?;
            e.mod_mul_nr(t4, t3, t1)?;
            e.mod_mul_nr(t3, p.x, t3)?;

            // X' = R² - HHH - 2V
            e.mod_mul_nr(t0, t2, t2)?;
            e.mod_sub(t0, t0, t4)?;
            e.mod_sub(t0, t0, t3)?;
            e.mod_sub(p.x, t0, t3)?;

            // Y' = R(V - X') - Y·HHH
            e.mod_sub(t3, t3, p.x)?;
            e.mod_mul_nr(t3, t2, t3)?;
            e.mod_mul_nr(t4, p.y, t4)?;
            e.mod_sub(p.y, t3, t4)?;
        }

        self.update_t(p)
    }

    /// `P = P + Q` for two Jacobian points; the result is in modified
    /// Jacobian form.
    fn add_jacobian(&mut self, p: Modified, q: Jacobian) -> Result<()> {
        if self.engine.is_zero(LenId::N, q.z)? {
            return Ok(());
        }
        if self.engine.is_zero(LenId::N, p.z)? {
            self.engine.copy(LenId::MAX, p.x, q.x)?;
            self.engine.copy(LenId::MAX, p.y, q.y)?;
            self.engine.copy(LenId::MAX, p.z, q.z)?;
            return self.update_t(p);
        }

        let [t0, t1, t2, t3, t4, t5, _] = self.t;
        {
            let e = &mut self.engine;
            // U₁ = X₁Z₂², U₂ = X₂Z₁², S₁ = Y₁Z₂³, S₂ = Y₂Z₁³
            e.mod_mul_nr(t0, p.z, p.z)?;
            e.mod_mul_nr(t1, q.z, q.z)?;
            e.mod_mul_nr(t2, p.x, t1)?;
            e.mod_mul_nr(t3, q.x, t0)?;
            e.mod_mul_nr(t1, t1, q.z)?;
            e.mod_mul_nr(t4, p.y, t1)?;
            e.mod_mul_nr(t0, t0, p.z)?;
            e.mod_mul_nr(t5, q.y, t0)?;

            // H = U₂ - U₁, R = S₂ - S₁
            e.mod_sub(t3, t3, t2)?;
            e.mod_sub(t5, t5, t4)?;
        }

        if self.engine.is_zero(LenId::N, t3)? {
            if self.engine.is_zero(LenId::N, t5)? {
                self.update_t(p)?;
                return self.double(p, true);
            }
            return self.set_infinity(p);
        }

        {
            let e = &mut self.engine;
            // Z' = Z₁Z₂H
            e.mod_mul_nr(t0, p.z, q.z)?;
            e.mod_mul(p.z, t0, t3)?;

            // HH, HHH, V = U₁·HH
            e.mod_mul_nr(t0, t3, t3)?;
            e.mod_mul_nr(t1, t0, t3)?;
            e.mod_mul_nr(t2, t2, t0)?;

            // X' = R² - HHH - 2V
            e.mod_mul_nr(t0, t5, t5)?;
            e.mod_sub(t0, t0, t1)?;
            e.mod_sub(t0, t0, t2)?;
            e.mod_sub(p.x, t0, t2)?;

            // Y' = R(V - X') - S₁·HHH
            e.mod_sub(t2, t2, p.x)?;
            e.mod_mul_nr(t2, t5, t2)?;
            e.mod_mul_nr(t1, t4, t1)?;
            e.mod_sub(p.y, t2, t1)?;
        }

        self.update_t(p)
    }

    /// Convert `P` to affine coordinates in `out`; `out` may overlap `P`.
    ///
    /// Returns whether `P` is the identity, written as `(0, 0)`.
    fn normalize(&mut self, p: Jacobian, out: Affine) -> Result<bool> {
        if self.engine.is_zero(LenId::N, p.z)? {
            self.engine.clear(LenId::MAX, out.x)?;
            self.engine.clear(LenId::MAX, out.y)?;
            return Ok(true);
        }

        let [zi, zz, ..] = self.t;
        self.invert(zi, p.z)?;
        self.engine.mod_mul(zz, zi, zi)?;
        self.engine.mod_mul(out.x, p.x, zz)?;
        self.engine.mod_mul(zz, zz, zi)?;
        self.engine.mod_mul(out.y, p.y, zz)?;
        Ok(false)
    }

    /// `out = P + Q` for affine points; either may be the identity.
    pub(crate) fn add_points(&mut self, p: Affine, q: Affine, out: Affine) -> Result<bool> {
        let [acc, aux] = [self.acc, self.aux];
        self.set_infinity(acc)?;
        self.set_infinity(aux)?;

        for (src, dst) in [(p, acc), (q, aux)] {
            let x_zero = self.engine.is_zero(LenId::N, src.x)?;
            if !(x_zero && self.engine.is_zero(LenId::N, src.y)?) {
                self.set_affine(dst, src)?;
            }
        }

        self.add_jacobian(acc, aux.jacobian())?;
        self.normalize(acc.jacobian(), out)
    }

    /// `out = k·P` through the configured strategy. `P` must not be the
    /// identity and `k` must lie in `(0, n)` for the protected strategy.
    pub(crate) fn mul(&mut self, k: &[u32], p: Affine, out: Affine) -> Result<bool> {
        match self.config.scalar_mult {
            ScalarMultMode::Fast => self.mul_naf(k, p, out),
            ScalarMultMode::Protected => self.mul_protected(k, p, out),
        }
    }

    /// `out = k·P` by non-adjacent form double-and-add.
    ///
    /// `P` must not be the identity; `k` may be any non-negative value.
    pub(crate) fn mul_naf(&mut self, k: &[u32], p: Affine, out: Affine) -> Result<bool> {
        let acc = self.acc;
        let naf = Naf::new(k);
        if naf.len() == 0 {
            self.set_infinity(acc)?;
            return self.normalize(acc.jacobian(), out);
        }

        self.engine.mod_neg(self.neg, p.y)?;
        self.set_affine(acc, p)?;
        for digit in naf.msb_first().skip(1) {
            if digit == 0 {
                self.double(acc, true)?;
                continue;
            }

            self.double(acc, false)?;
            let y = if digit > 0 { p.y } else { self.neg };
            self.add_affine(acc, Affine { x: p.x, y })?;
        }

        self.normalize(acc.jacobian(), out)
    }

    /// `out = k·P` with an opcode sequence independent of `k`.
    ///
    /// `k` must lie in `(0, n)` and `P` must not be the identity. Of `k` and
    /// `n - k` the smaller is used, the result negated for the latter; it is
    /// then lifted by `n` or `2n` to exactly `n_bits + 1` bits and consumed
    /// in radix-4 digits from `{P, 2P, 3P}`. Zero digits add into a dummy
    /// accumulator picked by register identity.
    pub(crate) fn mul_protected(&mut self, k: &[u32], p: Affine, out: Affine) -> Result<bool> {
        let n_bits = self.domain.order_bits() as usize;
        let [sk, sn] = self.s;
        let (acc, aux, neg) = (self.acc, self.aux, self.neg);
        let [p1, p2, p3] = self.table;

        self.load(sk, k)?;
        self.load(sn, self.domain.order())?;
        self.engine.sub(LenId::MAX, neg, sn, sk)?;
        let k_words = self.read(sk)?;
        let nk_words = self.read(neg)?;
        let negate = ct::less_than(&nk_words[..], &k_words[..]);

        let mut short = Zeroizing::new([0u32; FIELD_WORDS]);
        for (w, (a, b)) in short.iter_mut().zip(k_words.iter().zip(nk_words.iter())) {
            *w = u32::conditional_select(a, b, negate);
        }

        self.load(sk, &short[..])?;
        self.engine.add(LenId::MAX, sk, sk, sn)?;
        self.engine.add(LenId::MAX, neg, sk, sn)?;
        let once = self.read(sk)?;
        let twice = self.read(neg)?;
        let long_enough = Choice::from(bit(&once[..], n_bits) as u8);

        let mut scalar = Zeroizing::new([0u32; FIELD_WORDS]);
        for (w, (a, b)) in scalar.iter_mut().zip(twice.iter().zip(once.iter())) {
            *w = u32::conditional_select(a, b, long_enough);
        }
        self.engine.wipe(sk)?;
        self.engine.wipe(neg)?;

        // {P, 2P, 3P}
        if p != p1 {
            self.engine.copy(LenId::MAX, p1.x, p.x)?;
            self.engine.copy(LenId::MAX, p1.y, p.y)?;
        }
        self.set_affine(acc, p1)?;
        self.double(acc, true)?;
        self.copy_point(aux, acc)?;
        self.normalize(aux.jacobian(), p2)?;
        self.add_affine(acc, p1)?;
        self.normalize(acc.jacobian(), p3)?;

        let digit = |i: usize| ((scalar[2 * i / 32] >> (2 * i % 32)) & 3) as u8;
        let entry = |d: u8| {
            let e = Affine::conditional_select(&p1, &p2, d.ct_eq(&2));
            Affine::conditional_select(&e, &p3, d.ct_eq(&3))
        };

        let digits = (n_bits + 1).div_ceil(2);
        let top = entry(digit(digits - 1));
        self.set_affine(acc, top)?;

        for i in (0..digits - 1).rev() {
            self.double(acc, true)?;
            self.double(acc, true)?;

            let d = digit(i);
            self.copy_point(aux, acc)?;
            let target = Modified::conditional_select(&aux, &acc, !d.ct_eq(&0));
            self.add_affine(target, entry(d))?;
        }

        let infinity = self.normalize(acc.jacobian(), out)?;

        // Both copies always run so the sequence is the same either way.
        self.engine.mod_neg(neg, out.y)?;
        let y = Reg::conditional_select(&out.y, &neg, negate);
        self.engine.copy(LenId::MAX, sk, y)?;
        self.engine.copy(LenId::MAX, out.y, sk)?;
        self.engine.wipe(sk)?;
        Ok(infinity)
    }

    /// `out = a·P + b·Q` by Shamir's trick; both scalars must be non-zero.
    ///
    /// Uses `table[2]` for `P + Q`, so neither input may live there.
    pub(crate) fn mul_two(
        &mut self,
        a: &[u32],
        p: Affine,
        b: &[u32],
        q: Affine,
        out: Affine,
    ) -> Result<bool> {
        let a_bits = effective_bit_length(a);
        let b_bits = effective_bit_length(b);
        if a_bits == 0 || b_bits == 0 {
            return Err(Error::InvalidScalarValue);
        }

        let acc = self.acc;
        let pq = self.table[2];
        let pq_infinity = self.add_points(p, q, pq)?;

        self.set_infinity(acc)?;
        for i in (0..a_bits.max(b_bits)).rev() {
            self.double(acc, true)?;
            match (bit(a, i), bit(b, i)) {
                (true, false) => self.add_affine(acc, p)?,
                (false, true) => self.add_affine(acc, q)?,
                (true, true) if !pq_infinity => self.add_affine(acc, pq)?,
                _ => {}
            }
        }

        self.normalize(acc.jacobian(), out)
    }

    /// Does `P` satisfy `y² = x³ + ax + b`?
    pub(crate) fn is_on_curve(&mut self, p: Affine) -> Result<bool> {
        let [t0, t1, ..] = self.t;
        self.curve_rhs(t0, p.x)?;
        self.engine.mod_mul(t1, p.y, p.y)?;
        Ok(self.engine.compare(LenId::N, t0, t1)? == Ordering::Equal)
    }

    /// `r = x³ + ax + b`; uses `t[1]`.
    fn curve_rhs(&mut self, r: Reg, x: Reg) -> Result<()> {
        let t1 = self.t[1];
        self.engine.mod_mul(r, x, x)?;
        self.engine.mod_add(r, r, self.a)?;
        self.engine.mod_mul(r, r, x)?;
        self.load(t1, self.domain.b())?;
        self.engine.mod_add(r, r, t1)
    }

    /// Recover `y` from `x` and its parity into `out`.
    ///
    /// Fails with [`Error::PointNotOnCurve`] when no point has this `x`.
    pub(crate) fn decompress(&mut self, x: &[u32], y_odd: bool, out: Affine) -> Result<()> {
        let [t0, t1, t2, t3, t4, t5, _] = self.t;
        let rhs = self.neg;

        self.load(out.x, x)?;
        self.curve_rhs(rhs, out.x)?;
        sqrt::mod_sqrt(&mut self.engine, out.y, rhs, [t0, t1, t2, t3, t4, t5]).map_err(
            |err| match err {
                Error::ModSquareRootNotExist => Error::PointNotOnCurve,
                err => err,
            },
        )?;

        if self.engine.test_bit(LenId::MAX, out.y, 0)? != y_odd {
            if self.engine.is_zero(LenId::N, out.y)? {
                return Err(Error::InvalidPointEncoding);
            }
            self.engine.mod_neg(out.y, out.y)?;
        }
        Ok(())
    }

    /// Validate a public point held in `p` whose coordinates are known to
    /// be below `p`.
    pub(crate) fn check_point(&mut self, p: Affine, check: PubKeyCheck) -> Result<()> {
        if check == PubKeyCheck::None {
            return Ok(());
        }

        if !self.is_on_curve(p)? {
            return Err(Error::PointNotOnCurve);
        }

        if check == PubKeyCheck::Full {
            let spare = self.spare;
            if !self.mul_naf(self.domain.order(), p, spare)? {
                return Err(Error::PointOrderCheckFailed);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainId;
    use pka::SoftPka;

    fn with_curve<R>(
        id: DomainId,
        config: EcConfig,
        f: impl FnOnce(&mut Curve<'_, SoftPka>) -> R,
    ) -> R {
        let pka = Pka::new(SoftPka::new());
        let mut curve = Curve::open(&pka, id.domain(), config).unwrap();
        f(&mut curve)
    }

    fn small(k: u32) -> [u32; 1] {
        [k]
    }

    #[test]
    fn generator_is_on_curve_with_prime_order() {
        for id in DomainId::ALL {
            with_curve(id, EcConfig::default(), |curve| {
                let g = curve.table[0];
                curve.load_point(g, &AffinePoint::generator(id)).unwrap();
                curve.check_point(g, PubKeyCheck::Full).unwrap();
            });
        }
    }

    #[test]
    fn fast_and_protected_agree() {
        for id in DomainId::ALL {
            with_curve(id, EcConfig::default(), |curve| {
                let [g, out, ..] = curve.table;
                let g_point = AffinePoint::generator(id);

                for k in [1u32, 2, 3, 4, 5, 0x1234_5678] {
                    curve.load_point(g, &g_point).unwrap();
                    curve.mul_naf(&small(k), g, out).unwrap();
                    let fast = curve.read_point(out).unwrap();

                    curve.load_point(g, &g_point).unwrap();
                    curve.mul_protected(&small(k), g, out).unwrap();
                    let protected = curve.read_point(out).unwrap();
                    assert_eq!(fast, protected, "{id:?} k = {k}");
                }
            });
        }
    }

    #[test]
    fn shamir_matches_separate_products() {
        with_curve(DomainId::Secp256r1, EcConfig::default(), |curve| {
            let [p, q, _] = curve.table;
            let out = curve.spare;
            let g = AffinePoint::generator(DomainId::Secp256r1);

            curve.load_point(p, &g).unwrap();
            curve.mul_naf(&small(7), p, q).unwrap();
            curve.load_point(p, &g).unwrap();
            curve.mul_two(&small(5), p, &small(3), q, out).unwrap();
            let combined = curve.read_point(out).unwrap();

            // 5G + 3·7G = 26G
            curve.mul_naf(&small(26), p, out).unwrap();
            assert_eq!(curve.read_point(out).unwrap(), combined);

            assert_eq!(
                curve.mul_two(&small(0), p, &small(3), q, out),
                Err(Error::InvalidScalarValue)
            );
        });
    }

    #[test]
    fn add_handles_doubling_and_inverse() {
        with_curve(DomainId::Secp384r1, EcConfig::default(), |curve| {
            let [p, q, r] = curve.table;
            let g = AffinePoint::generator(DomainId::Secp384r1);

            curve.load_point(p, &g).unwrap();
            curve.load_point(q, &g).unwrap();
            curve.add_points(p, q, r).unwrap();
            let sum = curve.read_point(r).unwrap();
            curve.mul_naf(&small(2), p, r).unwrap();
            assert_eq!(curve.read_point(r).unwrap(), sum);

            curve.load_point(q, &g.negate()).unwrap();
            assert!(curve.add_points(p, q, r).unwrap());
            assert!(bool::from(curve.read_point(r).unwrap().is_identity()));
        });
    }

    #[test]
    fn euclid_inversion_matches_fermat() {
        let k = [0xdead_beef, 0x0bad_cafe];
        let g = AffinePoint::generator(DomainId::Secp256k1);
        let results = [InversionMode::Fermat, InversionMode::Euclid].map(|mode| {
            let config = EcConfig::default().with_inversion(mode);
            with_curve(DomainId::Secp256k1, config, |curve| {
                let [p, out, _] = curve.table;
                curve.load_point(p, &g).unwrap();
                curve.mul_naf(&k, p, out).unwrap();
                curve.read_point(out).unwrap()
            })
        });
        assert_eq!(results[0], results[1]);
    }

    #[test]
    fn decompress_recovers_generator() {
        for id in DomainId::ALL {
            with_curve(id, EcConfig::default(), |curve| {
                let g = AffinePoint::generator(id);
                let out = curve.table[1];
                curve
                    .decompress(g.x(), bool::from(g.y_is_odd()), out)
                    .unwrap();
                assert_eq!(curve.read_point(out).unwrap(), g, "{id:?}");

                curve
                    .decompress(g.x(), !bool::from(g.y_is_odd()), out)
                    .unwrap();
                assert_eq!(curve.read_point(out).unwrap(), g.negate(), "{id:?}");
            });
        }
    }
}
