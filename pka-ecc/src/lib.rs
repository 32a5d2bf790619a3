#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc = include_str!("../README.md")]
#![doc(
    html_logo_url = "https://raw.githubusercontent.com/RustCrypto/meta/master/logo.svg",
    html_favicon_url = "https://raw.githubusercontent.com/RustCrypto/meta/master/logo.svg"
)]
#![deny(unsafe_code)]
#![warn(
    clippy::mod_module_files,
    clippy::unwrap_used,
    missing_docs,
    rust_2018_idioms,
    unused_lifetimes,
    unused_qualifications
)]

//! ## Configuration
//!
//! [`EcConfig`] selects the scalar multiplication strategy, the inversion
//! method, the ECDSA retry bound and how strictly incoming public keys are
//! validated:
//!
//! ```
//! use pka::{Pka, SoftPka};
//! use pka_ecc::{EcConfig, Ecc, PubKeyCheck, ScalarMultMode};
//!
//! let pka = Pka::new(SoftPka::new());
//! let config = EcConfig::new()
//!     .with_scalar_mult(ScalarMultMode::Protected)
//!     .with_pub_key_check(PubKeyCheck::OnCurve);
//! let ecc = Ecc::with_config(&pka, config);
//! assert_eq!(ecc.config().scalar_mult, ScalarMultMode::Protected);
//! ```

#[cfg(feature = "std")]
extern crate std;

mod config;
mod domain;
mod ecc;
mod ecdh;
mod ecdsa;
mod keys;
mod naf;
mod point;
mod sqrt;
mod weierstrass;

#[cfg(any(feature = "ed25519", feature = "x25519"))]
mod curve25519;
#[cfg(feature = "ed25519")]
mod ed25519;
#[cfg(feature = "x25519")]
mod x25519;

pub use crate::{
    config::{EcConfig, InversionMode, PubKeyCheck, ScalarMultMode},
    domain::{Domain, DomainId, FIELD_BYTES, FIELD_WORDS},
    ecc::Ecc,
    ecdsa::{MAX_SIGNATURE_SIZE, Signature, signature_size},
    keys::{KeyPair, PRIV_KEY_TAG, PUB_KEY_TAG, PrivateKey, PublicKey, SEED_EXTRA_BYTES},
    point::{AffinePoint, EncodedPoint},
};
pub use pka::{self, Error, Result};

#[cfg(feature = "ed25519")]
pub use crate::ed25519::{
    Ed25519PublicKey, Ed25519Seed, Ed25519Signature, PUBLIC_KEY_SIZE, SEED_SIZE, SIGNATURE_SIZE,
};
#[cfg(feature = "x25519")]
pub use crate::x25519::{X25519_BASEPOINT, X25519Key};
