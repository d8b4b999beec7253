//! Digest helpers backed by aws-lc-rs.

use crate::algorithm::HashAlgorithm;
use aws_lc_rs::digest;

/// Computes a hash of the input data.
///
/// Returns `None` for SHA-1 and SHA-224, which the node never computes.
#[must_use]
pub fn hash(algorithm: HashAlgorithm, data: &[u8]) -> Option<Vec<u8>> {
    let alg = match algorithm {
        HashAlgorithm::Sha256 => &digest::SHA256,
        HashAlgorithm::Sha384 => &digest::SHA384,
        HashAlgorithm::Sha512 => &digest::SHA512,
        HashAlgorithm::Sha1 | HashAlgorithm::Sha224 => return None,
    };

    Some(digest::digest(alg, data).as_ref().to_vec())
}

/// Computes a SHA-256 hash of the input data.
#[must_use]
pub fn sha256(data: &[u8]) -> Vec<u8> {
    digest::digest(&digest::SHA256, data).as_ref().to_vec()
}

/// Computes a SHA-384 hash of the input data.
#[must_use]
pub fn sha384(data: &[u8]) -> Vec<u8> {
    digest::digest(&digest::SHA384, data).as_ref().to_vec()
}

/// Computes a SHA-512 hash of the input data.
#[must_use]
pub fn sha512(data: &[u8]) -> Vec<u8> {
    digest::digest(&digest::SHA512, data).as_ref().to_vec()
}

/// Lower-case hex SHA-256 fingerprint, as printed in logs and by the CLI.
#[must_use]
pub fn fingerprint(der: &[u8]) -> String {
    use std::fmt::Write;

    sha256(der).iter().fold(String::with_capacity(64), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}
