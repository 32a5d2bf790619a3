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

//! ## Usage
//!
//! ```
//! use pka::{BeBytes, Pka, SoftPka};
//!
//! let pka = Pka::new(SoftPka::new());
//! let mut out = [0u8; 1];
//! pka.mod_exp(&BeBytes([3u8]), &BeBytes([4u8]), &BeBytes([7u8]), &mut BeBytes(&mut out))?;
//! assert_eq!(out, [4]);
//! # Ok::<(), pka::Error>(())
//! ```

#[cfg(feature = "std")]
extern crate std;

pub mod ct;
pub mod mmio;
pub mod poly1305;
pub mod regs;

mod accelerator;
mod barrett;
mod buffer;
mod engine;
mod error;
mod longint;
mod opcode;
mod ops;
mod rsa;
mod soft;

pub use crate::{
    accelerator::Accelerator,
    barrett::{AUTO_TRUNCATE_ABOVE, NpMode, TRUNCATED_NP_BITS},
    buffer::{BeBytes, LeBytes, LeWords, WordSink, WordSource, effective_bit_length},
    engine::{Engine, Pka, SessionParams},
    error::{Error, Result},
    mmio::{MmioPka, PkaRegisters},
    opcode::{Instruction, Opcode, Operand, Status},
    regs::{LenId, Reg, RegPool},
    rsa::{RSA_MAX_BITS, RSA_MIN_BITS, RsaPublicKey},
    soft::SoftPka,
};
pub use subtle;
pub use zeroize;
