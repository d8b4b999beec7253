//! # eidas-crypto
//!
//! Algorithm identifiers and policy for the eIDAS node, plus aws-lc-rs digest
//! helpers.
//!
//! ## Policy
//!
//! - Digest and certificate signature hashes must be at least 256 bits
//! - SHA-1 is rejected everywhere
//! - RSA keys must be at least 2048 bits and EC keys at least 256 bits
//!   (both raised by configuration, never lowered below these floors)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod algorithm;
pub mod hash;

pub use algorithm::{
    AlgorithmError, HashAlgorithm, KeyAlgorithm, KeyLengthPolicy, SignatureAlgorithm,
};
pub use hash::{fingerprint, sha256, sha384, sha512};
