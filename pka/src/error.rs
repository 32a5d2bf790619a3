//! Error types.

use core::fmt::{self, Display};

/// Error type.
///
/// A flat set of reason codes: every failure is reported as exactly one of
/// these and propagated by return value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Error {
    /// A caller-supplied buffer has the wrong length.
    InvalidBufferSize,
    /// An input value is out of its permitted range (e.g. not below the modulus).
    InvalidInputValue,
    /// The modulus size is not supported by this engine.
    UnsupportedModulusSize,
    /// Two keys or a key and a domain belong to different domains.
    DomainMismatch,
    /// The validation tag of a private key is not set.
    IllegalPrivateKeyTag,
    /// The validation tag of a public key is not set.
    IllegalPublicKeyTag,
    /// A point encoding could not be parsed.
    InvalidPointEncoding,
    /// A point does not satisfy the curve equation.
    PointNotOnCurve,
    /// A public key point does not have the domain order.
    PointOrderCheckFailed,
    /// The operand has no modular square root.
    ModSquareRootNotExist,
    /// The operand has no modular inverse.
    ModInverseNotExist,
    /// Division by zero.
    DivideByZero,
    /// Too many registers requested from the register file.
    RegsCountExceeded,
    /// The requested register size does not fit the scratch memory.
    RegisterSizeExceeded,
    /// An operand refers to an invalid or unmapped register.
    IllegalOperand,
    /// The opcode is unknown to the accelerator.
    IllegalOpcode,
    /// A scalar is outside of `(0, order)`.
    InvalidScalarValue,
    /// The ephemeral key produced a zero signature component.
    BadEphemeralKeyTryAgain,
    /// Signature verification failed.
    VerifyFailed,
    /// The shared secret is the point at infinity.
    SharedValueIsOnInfinity,
    /// The accelerator is in a state it cannot recover from.
    FatalDevice,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Error::InvalidBufferSize => "invalid buffer size",
            Error::InvalidInputValue => "invalid input value",
            Error::UnsupportedModulusSize => "unsupported modulus size",
            Error::DomainMismatch => "domain mismatch",
            Error::IllegalPrivateKeyTag => "illegal private key validation tag",
            Error::IllegalPublicKeyTag => "illegal public key validation tag",
            Error::InvalidPointEncoding => "invalid point encoding",
            Error::PointNotOnCurve => "point is not on curve",
            Error::PointOrderCheckFailed => "point order check failed",
            Error::ModSquareRootNotExist => "modular square root does not exist",
            Error::ModInverseNotExist => "modular inverse does not exist",
            Error::DivideByZero => "divide by zero",
            Error::RegsCountExceeded => "register count exceeded",
            Error::RegisterSizeExceeded => "register size exceeded",
            Error::IllegalOperand => "illegal operand",
            Error::IllegalOpcode => "illegal opcode",
            Error::InvalidScalarValue => "invalid scalar value",
            Error::BadEphemeralKeyTryAgain => "bad ephemeral key",
            Error::VerifyFailed => "verification failed",
            Error::SharedValueIsOnInfinity => "shared value is the point at infinity",
            Error::FatalDevice => "fatal device error",
        })
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type.
pub type Result<T> = core::result::Result<T, Error>;
