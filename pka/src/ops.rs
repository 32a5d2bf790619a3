//! Big-integer opcode layer.
//!
//! Thin wrappers issuing one instruction each, plus composite operations
//! built purely from atomic opcodes. Modular operations work on the size
//! class [`LenId::N`] against the modulus resident in [`Reg::N`].

use crate::{
    Error, Result,
    accelerator::Accelerator,
    engine::Engine,
    opcode::{Instruction, Opcode, Operand, Status},
    regs::{LenId, Reg},
};
use core::cmp::Ordering;

impl<A: Accelerator> Engine<'_, A> {
    fn op(
        &mut self,
        opcode: Opcode,
        len: LenId,
        r: Reg,
        a: impl Into<Operand>,
        b: impl Into<Operand>,
    ) -> Result<Status> {
        self.exec(Instruction::new(opcode, len, r, a, b))
    }

    /// `r = a + b`; the status carries the carry out.
    pub fn add(
        &mut self,
        len: LenId,
        r: Reg,
        a: impl Into<Operand>,
        b: impl Into<Operand>,
    ) -> Result<Status> {
        self.op(Opcode::Add, len, r, a, b)
    }

    /// `r = a - b`; the status carries the borrow out.
    pub fn sub(
        &mut self,
        len: LenId,
        r: Reg,
        a: impl Into<Operand>,
        b: impl Into<Operand>,
    ) -> Result<Status> {
        self.op(Opcode::Sub, len, r, a, b)
    }

    /// Two's complement negation `r = -a`.
    pub fn negate(&mut self, len: LenId, r: Reg, a: Reg) -> Result<()> {
        self.op(Opcode::Sub, len, r, Operand::Imm(0), a).map(drop)
    }

    /// `r = a & b`
    pub fn and(
        &mut self,
        len: LenId,
        r: Reg,
        a: impl Into<Operand>,
        b: impl Into<Operand>,
    ) -> Result<()> {
        self.op(Opcode::And, len, r, a, b).map(drop)
    }

    /// `r = a | b`
    pub fn or(
        &mut self,
        len: LenId,
        r: Reg,
        a: impl Into<Operand>,
        b: impl Into<Operand>,
    ) -> Result<()> {
        self.op(Opcode::Or, len, r, a, b).map(drop)
    }

    /// `r = a ^ b`
    pub fn xor(
        &mut self,
        len: LenId,
        r: Reg,
        a: impl Into<Operand>,
        b: impl Into<Operand>,
    ) -> Result<()> {
        self.op(Opcode::Xor, len, r, a, b).map(drop)
    }

    /// `dst = src`
    pub fn copy(&mut self, len: LenId, dst: Reg, src: Reg) -> Result<()> {
        if dst == src {
            return Ok(());
        }
        self.or(len, dst, src, Operand::Imm(0))
    }

    /// `r = 0`
    pub fn clear(&mut self, len: LenId, r: Reg) -> Result<()> {
        self.and(len, r, r, Operand::Imm(0))
    }

    /// Set `r` to a small signed constant, sign-extended to the operand width.
    pub fn set_value(&mut self, len: LenId, r: Reg, value: i8) -> Result<()> {
        self.op(Opcode::Add, len, r, Operand::Imm(0), Operand::imm(value)?)
            .map(drop)
    }

    /// `r = a << count`, shifting in `fill` bits.
    pub fn shift_left(&mut self, len: LenId, r: Reg, a: Reg, count: u32, fill: bool) -> Result<()> {
        let opcode = if fill { Opcode::Shl1 } else { Opcode::Shl0 };
        self.shift(opcode, len, r, a, count)
    }

    /// `r = a >> count`, shifting in `fill` bits.
    pub fn shift_right(
        &mut self,
        len: LenId,
        r: Reg,
        a: Reg,
        count: u32,
        fill: bool,
    ) -> Result<()> {
        let opcode = if fill { Opcode::Shr1 } else { Opcode::Shr0 };
        self.shift(opcode, len, r, a, count)
    }

    fn shift(&mut self, opcode: Opcode, len: LenId, r: Reg, a: Reg, count: u32) -> Result<()> {
        if count == 0 {
            return self.copy(len, r, a);
        }

        let mut src = a;
        let mut left = count;
        while left > 0 {
            let step = left.min(32);
            self.op(opcode, len, r, src, Operand::shift(step)?)?;
            src = r;
            left -= step;
        }
        Ok(())
    }

    /// Compare `a` with `b`.
    pub fn compare(&mut self, len: LenId, a: Reg, b: impl Into<Operand>) -> Result<Ordering> {
        let status = self.exec(Instruction::discard(Opcode::Sub, len, a, b))?;
        Ok(if status.zero() {
            Ordering::Equal
        } else if status.carry() {
            Ordering::Less
        } else {
            Ordering::Greater
        })
    }

    /// Is `a` zero?
    pub fn is_zero(&mut self, len: LenId, a: Reg) -> Result<bool> {
        let status = self.exec(Instruction::discard(Opcode::Or, len, a, Operand::Imm(0)))?;
        Ok(status.zero())
    }

    /// Is bit `index` of `a` set? Uses [`Reg::T0`].
    pub fn test_bit(&mut self, len: LenId, a: Reg, index: u32) -> Result<bool> {
        let src = if index == 0 {
            a
        } else {
            self.shift_right(len, Reg::T0, a, index, false)?;
            Reg::T0
        };
        let status = self.exec(Instruction::discard(Opcode::And, len, src, Operand::Imm(1)))?;
        Ok(!status.zero())
    }

    /// Low half of `a * b` at the operand width.
    pub fn mul_low(
        &mut self,
        len: LenId,
        r: Reg,
        a: impl Into<Operand>,
        b: impl Into<Operand>,
    ) -> Result<()> {
        self.op(Opcode::MulLow, len, r, a, b).map(drop)
    }

    /// High half of `a * b` at the operand width.
    pub fn mul_high(
        &mut self,
        len: LenId,
        r: Reg,
        a: impl Into<Operand>,
        b: impl Into<Operand>,
    ) -> Result<()> {
        self.op(Opcode::MulHigh, len, r, a, b).map(drop)
    }

    /// `q = a / b`, leaving `a mod b` in `a`.
    pub fn div(&mut self, len: LenId, q: Reg, a: Reg, b: impl Into<Operand>) -> Result<()> {
        self.op(Opcode::Div, len, q, a, b).map(drop)
    }

    /// `r = a mod N` at any operand width.
    pub fn reduce(&mut self, len: LenId, r: Reg, a: Reg) -> Result<()> {
        self.op(Opcode::Reduce, len, r, a, Operand::Imm(0)).map(drop)
    }

    /// `r = a + b mod N`
    pub fn mod_add(&mut self, r: Reg, a: impl Into<Operand>, b: impl Into<Operand>) -> Result<()> {
        self.op(Opcode::ModAdd, LenId::N, r, a, b).map(drop)
    }

    /// `r = a - b mod N`
    pub fn mod_sub(&mut self, r: Reg, a: impl Into<Operand>, b: impl Into<Operand>) -> Result<()> {
        self.op(Opcode::ModSub, LenId::N, r, a, b).map(drop)
    }

    /// `r = -a mod N`
    pub fn mod_neg(&mut self, r: Reg, a: Reg) -> Result<()> {
        self.mod_sub(r, Operand::Imm(0), a)
    }

    /// `r = a * b mod N`
    pub fn mod_mul(&mut self, r: Reg, a: impl Into<Operand>, b: impl Into<Operand>) -> Result<()> {
        self.op(Opcode::ModMul, LenId::N, r, a, b).map(drop)
    }

    /// `r = a * b mod N` without the final reduction: `r < 2N`.
    pub fn mod_mul_nr(
        &mut self,
        r: Reg,
        a: impl Into<Operand>,
        b: impl Into<Operand>,
    ) -> Result<()> {
        self.op(Opcode::ModMulNr, LenId::N, r, a, b).map(drop)
    }

    /// `r = a * b + r mod N`
    pub fn mod_mul_acc(
        &mut self,
        r: Reg,
        a: impl Into<Operand>,
        b: impl Into<Operand>,
    ) -> Result<()> {
        self.op(Opcode::ModMulAcc, LenId::N, r, a, b).map(drop)
    }

    /// `r = a ^ e mod N`; the exponent may span the full register.
    pub fn mod_exp(&mut self, r: Reg, a: Reg, e: impl Into<Operand>) -> Result<()> {
        self.op(Opcode::ModExp, LenId::MAX, r, a, e).map(drop)
    }

    /// `r = a^-1 mod N` for an odd modulus.
    pub fn mod_inv(&mut self, r: Reg, a: Reg) -> Result<()> {
        self.op(Opcode::ModInv, LenId::N, r, a, Operand::Imm(0))
            .map(drop)
    }

    /// `r = a^-1 mod N` for any modulus.
    ///
    /// An even modulus is handled through an odd `a`: with
    /// `y = N^-1 mod a`, the inverse is `N - (N·y - 1) / a`. This swaps `a`
    /// in as a temporary modulus, so the registers must be twice the modulus
    /// width and `temps` must hold two spare registers. [`Reg::T0`] and
    /// [`Reg::T1`] are clobbered.
    pub fn full_mod_inv(&mut self, r: Reg, a: Reg, temps: [Reg; 2]) -> Result<()> {
        if self.test_bit(LenId::MAX, Reg::N, 0)? {
            return self.mod_inv(r, a);
        }

        if !self.test_bit(LenId::MAX, a, 0)? {
            return Err(Error::ModInverseNotExist);
        }

        if self.compare(LenId::MAX, a, Operand::Imm(1))? == Ordering::Equal {
            return self.set_value(LenId::MAX, r, 1);
        }

        let n_bits = self.bit_length(Reg::N)?;
        let a_bits = self.bit_length(a)?;
        if n_bits + a_bits >= self.register_bits() as usize {
            return Err(Error::RegisterSizeExceeded);
        }

        let [saved_n, saved_np] = temps;
        self.copy(LenId::MAX, saved_n, Reg::N)?;
        self.copy(LenId::MAX, saved_np, Reg::NP)?;

        self.copy(LenId::MAX, Reg::N, a)?;
        let inverted = self
            .compute_np(a_bits as u32 + crate::barrett::NP_SHIFT_BITS)
            .and_then(|()| self.mod_inv(r, saved_n));

        self.copy(LenId::MAX, Reg::N, saved_n)?;
        self.copy(LenId::MAX, Reg::NP, saved_np)?;
        inverted?;

        // r = N - (N·y - 1) / a
        self.mul_low(LenId::MAX, Reg::T1, Reg::N, r)?;
        self.sub(LenId::MAX, Reg::T1, Reg::T1, Operand::Imm(1))?;
        self.div(LenId::MAX, r, Reg::T1, a)?;
        self.sub(LenId::MAX, r, Reg::N, r)?;
        Ok(())
    }

    /// `q = floor(a · 2^shift / b)`, leaving the remainder in `a`.
    ///
    /// The shift is applied in chunks that keep `a · 2^chunk` inside the
    /// register. Uses [`Reg::T0`].
    pub fn div_long_num(&mut self, a: Reg, shift: u32, b: Reg, q: Reg) -> Result<()> {
        let width = self.register_bits() as usize;
        let b_bits = self.bit_length(b)?;
        let a_bits = self.bit_length(a)?;

        if b_bits == 0 {
            return Err(Error::DivideByZero);
        }
        if b_bits + 1 >= width || (a_bits + shift as usize + 1).saturating_sub(b_bits) >= width {
            return Err(Error::RegisterSizeExceeded);
        }

        self.div(LenId::MAX, q, a, b)?;

        let headroom = (width - b_bits - 1) as u32;
        let mut left = shift;
        while left > 0 {
            let chunk = left.min(headroom);
            self.shift_left(LenId::MAX, a, a, chunk, false)?;
            self.shift_left(LenId::MAX, q, q, chunk, false)?;
            self.div(LenId::MAX, Reg::T0, a, b)?;
            self.add(LenId::MAX, q, q, Reg::T0)?;
            left -= chunk;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        Error, LeWords, NpMode, Pka, SessionParams, SoftPka,
        opcode::Operand,
        regs::{LenId, Reg},
    };
    use core::cmp::Ordering;

    fn read_u64(engine: &mut crate::Engine<'_, SoftPka>, reg: Reg) -> u64 {
        let mut out = [0u32; 2];
        engine.copy_from_register(&mut LeWords(&mut out), reg).unwrap();
        out[0] as u64 | (out[1] as u64) << 32
    }

    fn load(engine: &mut crate::Engine<'_, SoftPka>, reg: Reg, value: u64) {
        engine
            .copy_into_register(reg, &LeWords([value as u32, (value >> 32) as u32]))
            .unwrap();
    }

    #[test]
    fn compare_and_flags() {
        let pka = Pka::new(SoftPka::new());
        let mut engine = pka.session(SessionParams::new(64)).unwrap();
        let [a, b] = engine.pool().take_array().unwrap();
        load(&mut engine, a, 5);
        load(&mut engine, b, 9);
        assert_eq!(engine.compare(LenId::N, a, b).unwrap(), Ordering::Less);
        assert_eq!(engine.compare(LenId::N, b, a).unwrap(), Ordering::Greater);
        assert_eq!(engine.compare(LenId::N, a, Operand::imm(5).unwrap()).unwrap(), Ordering::Equal);
        assert!(!engine.is_zero(LenId::N, a).unwrap());
        engine.clear(LenId::N, a).unwrap();
        assert!(engine.is_zero(LenId::N, a).unwrap());
    }

    #[test]
    fn shifts_and_bits() {
        let pka = Pka::new(SoftPka::new());
        let mut engine = pka.session(SessionParams::new(128)).unwrap();
        let [a, r] = engine.pool().take_array().unwrap();
        load(&mut engine, a, 0x8000_0000_0000_0001);
        engine.shift_right(LenId::N, r, a, 63, false).unwrap();
        assert_eq!(read_u64(&mut engine, r), 1);
        engine.shift_left(LenId::N, r, r, 40, false).unwrap();
        assert_eq!(read_u64(&mut engine, r), 1 << 40);
        assert!(engine.test_bit(LenId::N, a, 63).unwrap());
        assert!(!engine.test_bit(LenId::N, a, 62).unwrap());
        assert!(engine.test_bit(LenId::N, a, 0).unwrap());
        assert_eq!(engine.bit_length(a).unwrap(), 64);

        engine.set_value(LenId::N, r, 7).unwrap();
        engine.shift_left(LenId::N, r, r, 3, true).unwrap();
        assert_eq!(read_u64(&mut engine, r), 0x3f);
    }

    #[test]
    fn negate_wraps() {
        let pka = Pka::new(SoftPka::new());
        let mut engine = pka.session(SessionParams::new(64)).unwrap();
        let [a, r] = engine.pool().take_array().unwrap();
        load(&mut engine, a, 1);
        engine.negate(LenId::N, r, a).unwrap();
        engine.add(LenId::N, r, r, a).unwrap();
        assert!(engine.is_zero(LenId::N, r).unwrap());
    }

    #[test]
    fn modular_ops() {
        let n = 0xffff_ffff_ffff_ffc5u64;
        let pka = Pka::new(SoftPka::new());
        let mut engine = pka.session(SessionParams::new(64)).unwrap();
        engine
            .set_modulus(&LeWords([n as u32, (n >> 32) as u32]), None, NpMode::Full)
            .unwrap();
        let [a, b, r] = engine.pool().take_array().unwrap();
        let (x, y) = (0x1234_5678_9abc_def0u64, 0xfedc_ba98_7654_3210u64);
        load(&mut engine, a, x);
        load(&mut engine, b, y);

        engine.mod_mul(r, a, b).unwrap();
        let expect = (x as u128 * y as u128 % n as u128) as u64;
        assert_eq!(read_u64(&mut engine, r), expect);

        engine.mod_sub(r, a, b).unwrap();
        assert_eq!(
            read_u64(&mut engine, r),
            ((x as u128 + n as u128 - y as u128) % n as u128) as u64
        );

        engine.mod_neg(r, a).unwrap();
        engine.mod_add(r, r, a).unwrap();
        assert!(engine.is_zero(LenId::N, r).unwrap());

        engine.set_value(LenId::N, r, 3).unwrap();
        engine.mod_mul_acc(r, a, b).unwrap();
        assert_eq!(read_u64(&mut engine, r), ((expect as u128 + 3) % n as u128) as u64);

        engine.mod_inv(r, a).unwrap();
        engine.mod_mul(r, r, a).unwrap();
        assert_eq!(read_u64(&mut engine, r), 1);
    }

    #[test]
    fn full_mod_inv_even_modulus() {
        let n = 1u64 << 40;
        let pka = Pka::new(SoftPka::new());
        let mut engine = pka
            .session(SessionParams::new(41).with_register_bits(128))
            .unwrap();
        engine
            .set_modulus(&LeWords([n as u32, (n >> 32) as u32]), None, NpMode::Full)
            .unwrap();
        let [a, r, t0, t1] = engine.pool().take_array().unwrap();
        load(&mut engine, a, 0x1_2345_6789);
        engine.full_mod_inv(r, a, [t0, t1]).unwrap();
        let inv = read_u64(&mut engine, r);
        assert_eq!((inv as u128 * 0x1_2345_6789u128) % n as u128, 1);

        load(&mut engine, a, 6);
        assert_eq!(
            engine.full_mod_inv(r, a, [t0, t1]),
            Err(Error::ModInverseNotExist)
        );
    }

    #[test]
    fn long_division_by_shift() {
        let pka = Pka::new(SoftPka::new());
        let mut engine = pka
            .session(SessionParams::new(64).with_register_bits(192))
            .unwrap();
        let [a, b, q] = engine.pool().take_array().unwrap();
        load(&mut engine, a, 1);
        load(&mut engine, b, 1_000_003);
        engine.div_long_num(a, 100, b, q).unwrap();

        let expect = (1u128 << 100) / 1_000_003;
        let mut out = [0u32; 4];
        engine.copy_from_register(&mut LeWords(&mut out), q).unwrap();
        let got = out
            .iter()
            .rev()
            .fold(0u128, |acc, w| (acc << 32) | *w as u128);
        assert_eq!(got, expect);
        assert_eq!(read_u64(&mut engine, a), ((1u128 << 100) % 1_000_003) as u64);
    }
}
