//! Entry point tying an accelerator to a curve configuration.

use crate::{config::EcConfig, domain::DomainId, weierstrass::Curve};
use pka::{Accelerator, Pka, Result};

/// Elliptic curve operations on a shared accelerator.
///
/// Every call opens its own accelerator session, which is wiped and
/// released before the call returns.
#[derive(Debug)]
pub struct Ecc<'p, A> {
    pka: &'p Pka<A>,
    config: EcConfig,
}

impl<'p, A: Accelerator> Ecc<'p, A> {
    /// Use `pka` with the default configuration.
    pub fn new(pka: &'p Pka<A>) -> Self {
        Self::with_config(pka, EcConfig::default())
    }

    /// Use `pka` with `config`.
    pub fn with_config(pka: &'p Pka<A>, config: EcConfig) -> Self {
        Self { pka, config }
    }

    /// Active configuration.
    pub fn config(&self) -> &EcConfig {
        &self.config
    }

    /// Underlying accelerator.
    pub fn pka(&self) -> &'p Pka<A> {
        self.pka
    }

    pub(crate) fn curve(&self, id: DomainId) -> Result<Curve<'p, A>> {
        Curve::open(self.pka, id.domain(), self.config)
    }
}
