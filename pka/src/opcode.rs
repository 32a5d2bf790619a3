//! Atomic accelerator instructions and status flags.

use crate::{
    Error, Result,
    regs::{LenId, Reg},
};
use bitflags::bitflags;

/// Accelerator opcodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// `R = A + B`
    Add = 0x04,
    /// `R = A - B`
    Sub = 0x05,
    /// `R = A + B mod N`
    ModAdd = 0x06,
    /// `R = A - B mod N`
    ModSub = 0x07,
    /// `R = A & B`
    And = 0x08,
    /// `R = A | B`
    Or = 0x09,
    /// `R = A ^ B`
    Xor = 0x0A,
    /// `R = A >> B`, zero fill.
    Shr0 = 0x0C,
    /// `R = A >> B`, one fill.
    Shr1 = 0x0D,
    /// `R = A << B`, zero fill.
    Shl0 = 0x0E,
    /// `R = A << B`, one fill.
    Shl1 = 0x0F,
    /// Low half of `A * B`.
    MulLow = 0x10,
    /// `R = A * B mod N`
    ModMul = 0x11,
    /// `R = A * B mod N` without the final reduction: `R < 2N`.
    ModMulNr = 0x12,
    /// `R = A ^ B mod N`
    ModExp = 0x13,
    /// `R = A / B`, `A = A mod B`.
    Div = 0x14,
    /// `R = A^-1 mod N`, odd `N` only.
    ModInv = 0x15,
    /// High half of `A * B`.
    MulHigh = 0x17,
    /// `R = A * B + R mod N`
    ModMulAcc = 0x18,
    /// `R = A mod N`
    Reduce = 0x1B,
}

impl Opcode {
    /// Does this opcode reduce modulo the register `N`?
    pub const fn is_modular(self) -> bool {
        matches!(
            self,
            Opcode::ModAdd
                | Opcode::ModSub
                | Opcode::ModMul
                | Opcode::ModMulNr
                | Opcode::ModExp
                | Opcode::ModInv
                | Opcode::ModMulAcc
                | Opcode::Reduce
        )
    }

    /// Is the `B` operand of this opcode a shift count?
    pub const fn is_shift(self) -> bool {
        matches!(
            self,
            Opcode::Shr0 | Opcode::Shr1 | Opcode::Shl0 | Opcode::Shl1
        )
    }
}

impl TryFrom<u8> for Opcode {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        Ok(match code {
            0x04 => Opcode::Add,
            0x05 => Opcode::Sub,
            0x06 => Opcode::ModAdd,
            0x07 => Opcode::ModSub,
            0x08 => Opcode::And,
            0x09 => Opcode::Or,
            0x0A => Opcode::Xor,
            0x0C => Opcode::Shr0,
            0x0D => Opcode::Shr1,
            0x0E => Opcode::Shl0,
            0x0F => Opcode::Shl1,
            0x10 => Opcode::MulLow,
            0x11 => Opcode::ModMul,
            0x12 => Opcode::ModMulNr,
            0x13 => Opcode::ModExp,
            0x14 => Opcode::Div,
            0x15 => Opcode::ModInv,
            0x17 => Opcode::MulHigh,
            0x18 => Opcode::ModMulAcc,
            0x1B => Opcode::Reduce,
            _ => return Err(Error::IllegalOpcode),
        })
    }
}

/// Instruction operand: a register or a 5-bit immediate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operand {
    /// Register operand.
    Reg(Reg),

    /// Raw 5-bit immediate.
    ///
    /// Arithmetic opcodes sign-extend it, shift opcodes read it as
    /// `count - 1`.
    Imm(u8),
}

impl Operand {
    /// Signed immediate in `-16..=15`.
    pub const fn imm(value: i8) -> Result<Self> {
        if value < -16 || value > 15 {
            return Err(Error::InvalidInputValue);
        }

        Ok(Operand::Imm((value as u8) & 0x1f))
    }

    /// Shift count in `1..=32`.
    pub const fn shift(count: u32) -> Result<Self> {
        if count == 0 || count > 32 {
            return Err(Error::InvalidInputValue);
        }

        Ok(Operand::Imm((count - 1) as u8))
    }

    /// Sign-extended value of an arithmetic immediate.
    pub const fn imm_value(raw: u8) -> i32 {
        (((raw & 0x1f) << 3) as i8 >> 3) as i32
    }

    /// Shift count encoded by a shift immediate.
    pub const fn shift_count(raw: u8) -> u32 {
        (raw & 0x1f) as u32 + 1
    }

    /// Register of this operand, if any.
    pub const fn reg(self) -> Option<Reg> {
        match self {
            Operand::Reg(reg) => Some(reg),
            Operand::Imm(_) => None,
        }
    }

    fn encode(self) -> u32 {
        match self {
            Operand::Reg(reg) => reg.index() as u32,
            Operand::Imm(raw) => (1 << 5) | (raw & 0x1f) as u32,
        }
    }

    fn decode(bits: u32) -> Result<Self> {
        if bits & (1 << 5) != 0 {
            Ok(Operand::Imm((bits & 0x1f) as u8))
        } else {
            Ok(Operand::Reg(Reg::new((bits & 0x1f) as u8)?))
        }
    }
}

impl From<Reg> for Operand {
    fn from(reg: Reg) -> Self {
        Operand::Reg(reg)
    }
}

/// One atomic accelerator transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Instruction {
    /// Operation to perform.
    pub opcode: Opcode,

    /// Size class of the operands.
    pub len: LenId,

    /// First operand.
    pub a: Operand,

    /// Second operand.
    pub b: Operand,

    /// Result register, `None` to discard the result and keep only flags.
    pub r: Option<Reg>,

    /// Free-form tag echoed by the hardware.
    pub tag: u8,
}

impl Instruction {
    /// Create an instruction writing its result to `r`.
    pub fn new(
        opcode: Opcode,
        len: LenId,
        r: Reg,
        a: impl Into<Operand>,
        b: impl Into<Operand>,
    ) -> Self {
        Self {
            opcode,
            len,
            a: a.into(),
            b: b.into(),
            r: Some(r),
            tag: 0,
        }
    }

    /// Create an instruction which only updates the status flags.
    pub fn discard(
        opcode: Opcode,
        len: LenId,
        a: impl Into<Operand>,
        b: impl Into<Operand>,
    ) -> Self {
        Self {
            opcode,
            len,
            a: a.into(),
            b: b.into(),
            r: None,
            tag: 0,
        }
    }

    /// Registers referenced by this instruction.
    pub fn registers(&self) -> impl Iterator<Item = Reg> {
        [self.a.reg(), self.b.reg(), self.r]
            .into_iter()
            .flatten()
    }

    /// Encode into an opcode word.
    ///
    /// Layout: `[31:27]` opcode, `[26:24]` size class, `[23]` A is
    /// immediate, `[22:18]` A, `[17]` B is immediate, `[16:12]` B,
    /// `[11]` discard result, `[10:6]` R, `[5:0]` tag.
    pub fn encode(&self) -> u32 {
        let (discard, r) = match self.r {
            Some(r) => (0, r.index() as u32),
            None => (1, 0),
        };

        ((self.opcode as u32) << 27)
            | ((self.len.index() as u32) << 24)
            | (self.a.encode() << 18)
            | (self.b.encode() << 12)
            | (discard << 11)
            | (r << 6)
            | (self.tag & 0x3f) as u32
    }

    /// Decode an opcode word.
    pub fn decode(word: u32) -> Result<Self> {
        let opcode = Opcode::try_from((word >> 27) as u8)?;
        let len = LenId::new(((word >> 24) & 0x7) as u8)?;
        let a = Operand::decode((word >> 18) & 0x3f)?;
        let b = Operand::decode((word >> 12) & 0x3f)?;
        let r = if word & (1 << 11) != 0 {
            None
        } else {
            Some(Reg::new(((word >> 6) & 0x1f) as u8)?)
        };

        Ok(Self {
            opcode,
            len,
            a,
            b,
            r,
            tag: (word & 0x3f) as u8,
        })
    }
}

bitflags! {
    /// Accelerator status flags, valid after each instruction.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Status: u32 {
        /// Carry out of an addition or borrow out of a subtraction.
        const CARRY = 1 << 0;
        /// The result is zero.
        const ZERO = 1 << 1;
        /// Division by zero.
        const DIV_BY_ZERO = 1 << 2;
        /// The modular inverse does not exist.
        const INVERSE_NOT_EXIST = 1 << 3;
        /// The opcode is unknown.
        const ILLEGAL_OPCODE = 1 << 4;
        /// An operand is out of range or unmapped.
        const ILLEGAL_OPERAND = 1 << 5;
        /// Unrecoverable device state.
        const FATAL = 1 << 6;
    }
}

impl Status {
    /// Map error flags onto [`Error`].
    pub fn check(self) -> Result<Self> {
        if self.contains(Status::FATAL) {
            Err(Error::FatalDevice)
        } else if self.contains(Status::ILLEGAL_OPCODE) {
            Err(Error::IllegalOpcode)
        } else if self.contains(Status::ILLEGAL_OPERAND) {
            Err(Error::IllegalOperand)
        } else if self.contains(Status::DIV_BY_ZERO) {
            Err(Error::DivideByZero)
        } else if self.contains(Status::INVERSE_NOT_EXIST) {
            Err(Error::ModInverseNotExist)
        } else {
            Ok(self)
        }
    }

    /// Carry or borrow flag.
    pub fn carry(self) -> bool {
        self.contains(Status::CARRY)
    }

    /// Zero flag.
    pub fn zero(self) -> bool {
        self.contains(Status::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immediates() {
        assert_eq!(Operand::imm(-1).unwrap(), Operand::Imm(0x1f));
        assert_eq!(Operand::imm_value(0x1f), -1);
        assert_eq!(Operand::imm_value(0x10), -16);
        assert_eq!(Operand::imm_value(0x0f), 15);
        assert_eq!(Operand::imm(16), Err(Error::InvalidInputValue));
        assert_eq!(Operand::shift(32).unwrap(), Operand::Imm(31));
        assert_eq!(Operand::shift(0), Err(Error::InvalidInputValue));
        assert_eq!(Operand::shift_count(0), 1);
    }

    #[test]
    fn encode_decode() {
        let instr = Instruction {
            opcode: Opcode::ModMulAcc,
            len: LenId::MAX,
            a: Operand::Reg(Reg::new(7).unwrap()),
            b: Operand::imm(-3).unwrap(),
            r: Some(Reg::T1),
            tag: 0x2a,
        };
        let word = instr.encode();
        assert_eq!(word >> 27, 0x18);
        assert_eq!(Instruction::decode(word).unwrap(), instr);

        let cmp = Instruction::discard(Opcode::Sub, LenId::N, Reg::N, Reg::NP);
        assert_eq!(cmp.encode() & (1 << 11), 1 << 11);
        assert_eq!(Instruction::decode(cmp.encode()).unwrap(), cmp);
    }

    #[test]
    fn unknown_opcode() {
        assert_eq!(Instruction::decode(0x1f << 27), Err(Error::IllegalOpcode));
        assert_eq!(Opcode::try_from(0x16), Err(Error::IllegalOpcode));
    }

    #[test]
    fn status_check() {
        assert_eq!(Status::ZERO.check(), Ok(Status::ZERO));
        assert_eq!(
            (Status::DIV_BY_ZERO | Status::CARRY).check(),
            Err(Error::DivideByZero)
        );
        assert_eq!(
            Status::INVERSE_NOT_EXIST.check(),
            Err(Error::ModInverseNotExist)
        );
        assert_eq!(
            (Status::FATAL | Status::ILLEGAL_OPERAND).check(),
            Err(Error::FatalDevice)
        );
    }
}
