//! Run-time configuration of the curve algorithms.

/// Scalar multiplication strategy for secret scalars.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScalarMultMode {
    /// Non-adjacent form double-and-add. The opcode sequence depends on the
    /// scalar.
    Fast,

    /// Fixed-length radix-4 ladder over a masked scalar. The opcode
    /// sequence does not depend on the scalar.
    #[default]
    Protected,
}

/// Inversion used to bring Jacobian points back to affine form and to
/// invert secret scalars.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InversionMode {
    /// Fermat's little theorem: `z^(p-2)` through the exponentiation opcode.
    #[default]
    Fermat,

    /// The accelerator's binary Euclidean inverse.
    Euclid,
}

/// Validation applied to public keys entering the library.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PubKeyCheck {
    /// Only coordinate ranges are checked.
    None,

    /// The point satisfies the curve equation.
    OnCurve,

    /// The point satisfies the curve equation and `n·Q` is the identity.
    #[default]
    Full,
}

/// Configuration shared by the operations of an [`Ecc`](crate::Ecc).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EcConfig {
    /// Scalar multiplication used with secret scalars.
    pub scalar_mult: ScalarMultMode,

    /// Inversion used for normalization and scalar inverses.
    pub inversion: InversionMode,

    /// Ephemeral keys tried by a randomized signature before giving up;
    /// zero counts as one.
    pub sign_attempts: u32,

    /// Validation of decoded public keys.
    pub pub_key_check: PubKeyCheck,
}

impl EcConfig {
    /// Default number of signing attempts.
    pub const SIGN_ATTEMPTS: u32 = 100;

    /// Protected scalar multiplication, Fermat inversion, full key checks.
    pub const fn new() -> Self {
        Self {
            scalar_mult: ScalarMultMode::Protected,
            inversion: InversionMode::Fermat,
            sign_attempts: Self::SIGN_ATTEMPTS,
            pub_key_check: PubKeyCheck::Full,
        }
    }

    /// Select the scalar multiplication strategy.
    pub const fn with_scalar_mult(mut self, mode: ScalarMultMode) -> Self {
        self.scalar_mult = mode;
        self
    }

    /// Select the inversion algorithm.
    pub const fn with_inversion(mut self, mode: InversionMode) -> Self {
        self.inversion = mode;
        self
    }

    /// Set the number of signing attempts.
    pub const fn with_sign_attempts(mut self, attempts: u32) -> Self {
        self.sign_attempts = attempts;
        self
    }

    /// Select the validation of decoded public keys.
    pub const fn with_pub_key_check(mut self, check: PubKeyCheck) -> Self {
        self.pub_key_check = check;
        self
    }
}

impl Default for EcConfig {
    fn default() -> Self {
        Self::new()
    }
}
