//! Algorithm identifiers and strength rules.
//!
//! XML signatures name their algorithms by URI, while X.509 certificates name
//! them by JCA-style strings such as `SHA384WITHRSAANDMGF1`. Both are mapped
//! onto [`HashAlgorithm`] so a single strength rule applies.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum accepted hash strength in bits.
pub const MIN_HASH_BITS: u32 = 256;

/// Error type for algorithm checks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AlgorithmError {
    /// Algorithm is known but too weak.
    #[error("algorithm '{0}' is too weak")]
    Weak(String),

    /// Algorithm name or URI is not recognised.
    #[error("unknown algorithm: {0}")]
    Unknown(String),

    /// Key is shorter than the policy minimum.
    #[error("{algorithm} key of {bits} bits is below the minimum of {minimum} bits")]
    KeySizeTooSmall {
        /// Key family.
        algorithm: KeyAlgorithm,
        /// Actual key size.
        bits: u32,
        /// Required key size.
        minimum: u32,
    },
}

/// Hash functions appearing in signatures and certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// SHA-1.
    #[serde(rename = "SHA1")]
    Sha1,
    /// SHA-224.
    #[serde(rename = "SHA224")]
    Sha224,
    /// SHA-256.
    #[serde(rename = "SHA256")]
    Sha256,
    /// SHA-384.
    #[serde(rename = "SHA384")]
    Sha384,
    /// SHA-512.
    #[serde(rename = "SHA512")]
    Sha512,
}

impl HashAlgorithm {
    /// Output size in bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Sha1 => 160,
            Self::Sha224 => 224,
            Self::Sha256 => 256,
            Self::Sha384 => 384,
            Self::Sha512 => 512,
        }
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha1 => "SHA-1",
            Self::Sha224 => "SHA-224",
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
        }
    }

    /// Whether the hash is below [`MIN_HASH_BITS`].
    #[must_use]
    pub const fn is_weak(self) -> bool {
        self.bits() < MIN_HASH_BITS
    }

    /// XML digest method URI.
    #[must_use]
    pub const fn digest_uri(self) -> &'static str {
        match self {
            Self::Sha1 => "http://www.w3.org/2000/09/xmldsig#sha1",
            Self::Sha224 => "http://www.w3.org/2001/04/xmldsig-more#sha224",
            Self::Sha256 => "http://www.w3.org/2001/04/xmlenc#sha256",
            Self::Sha384 => "http://www.w3.org/2001/04/xmldsig-more#sha384",
            Self::Sha512 => "http://www.w3.org/2001/04/xmlenc#sha512",
        }
    }

    /// Parses an XML digest method URI.
    #[must_use]
    pub fn from_digest_uri(uri: &str) -> Option<Self> {
        [Self::Sha1, Self::Sha224, Self::Sha256, Self::Sha384, Self::Sha512]
            .into_iter()
            .find(|alg| alg.digest_uri() == uri)
    }

    /// Parses a hash name such as `SHA256`, `sha-384` or `SHA1`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_uppercase();
        match normalized.as_str() {
            "SHA1" | "SHA" => Some(Self::Sha1),
            "SHA224" => Some(Self::Sha224),
            "SHA256" => Some(Self::Sha256),
            "SHA384" => Some(Self::Sha384),
            "SHA512" => Some(Self::Sha512),
            _ => None,
        }
    }

    /// Resolves either a digest URI or a hash name.
    #[must_use]
    pub fn resolve(name_or_uri: &str) -> Option<Self> {
        Self::from_digest_uri(name_or_uri).or_else(|| Self::from_name(name_or_uri))
    }
}

/// Parses a JCA-style signing algorithm name (`SHA256withRSA`,
/// `SHA384WITHECDSA`, `SHA512withRSAandMGF1`) and returns its hash.
///
/// ## Errors
///
/// Returns [`AlgorithmError::Unknown`] when no hash can be read from the name.
pub fn hash_of_signing_algorithm_name(name: &str) -> Result<HashAlgorithm, AlgorithmError> {
    let upper = name.to_ascii_uppercase();
    let hash_part = upper
        .find("WITH")
        .map(|idx| &upper[..idx])
        .ok_or_else(|| AlgorithmError::Unknown(name.to_string()))?;
    HashAlgorithm::from_name(hash_part).ok_or_else(|| AlgorithmError::Unknown(name.to_string()))
}

/// Checks that a JCA-style signing algorithm name uses a strong enough hash.
///
/// ## Errors
///
/// Returns [`AlgorithmError::Weak`] below [`MIN_HASH_BITS`] and
/// [`AlgorithmError::Unknown`] for names that cannot be parsed.
pub fn check_signing_algorithm_name(name: &str) -> Result<HashAlgorithm, AlgorithmError> {
    let hash = hash_of_signing_algorithm_name(name)?;
    if hash.is_weak() {
        return Err(AlgorithmError::Weak(name.to_string()));
    }
    Ok(hash)
}

/// Public key families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyAlgorithm {
    /// RSA.
    #[serde(rename = "RSA")]
    Rsa,
    /// Elliptic curve.
    #[serde(rename = "EC")]
    Ec,
}

impl std::fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rsa => f.write_str("RSA"),
            Self::Ec => f.write_str("EC"),
        }
    }
}

/// XML signature algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
    /// RSA PKCS#1 v1.5 with SHA-1.
    RsaSha1,
    /// RSA PKCS#1 v1.5 with SHA-256.
    RsaSha256,
    /// RSA PKCS#1 v1.5 with SHA-384.
    RsaSha384,
    /// RSA PKCS#1 v1.5 with SHA-512.
    RsaSha512,
    /// RSASSA-PSS with SHA-256.
    RsaSha256Mgf1,
    /// RSASSA-PSS with SHA-384.
    RsaSha384Mgf1,
    /// RSASSA-PSS with SHA-512.
    RsaSha512Mgf1,
    /// ECDSA with SHA-256.
    EcdsaSha256,
    /// ECDSA with SHA-384.
    EcdsaSha384,
    /// ECDSA with SHA-512.
    EcdsaSha512,
}

impl SignatureAlgorithm {
    const ALL: [Self; 10] = [
        Self::RsaSha1,
        Self::RsaSha256,
        Self::RsaSha384,
        Self::RsaSha512,
        Self::RsaSha256Mgf1,
        Self::RsaSha384Mgf1,
        Self::RsaSha512Mgf1,
        Self::EcdsaSha256,
        Self::EcdsaSha384,
        Self::EcdsaSha512,
    ];

    /// XML signature method URI.
    #[must_use]
    pub const fn uri(self) -> &'static str {
        match self {
            Self::RsaSha1 => "http://www.w3.org/2000/09/xmldsig#rsa-sha1",
            Self::RsaSha256 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256",
            Self::RsaSha384 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha384",
            Self::RsaSha512 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha512",
            Self::RsaSha256Mgf1 => "http://www.w3.org/2007/05/xmldsig-more#sha256-rsa-MGF1",
            Self::RsaSha384Mgf1 => "http://www.w3.org/2007/05/xmldsig-more#sha384-rsa-MGF1",
            Self::RsaSha512Mgf1 => "http://www.w3.org/2007/05/xmldsig-more#sha512-rsa-MGF1",
            Self::EcdsaSha256 => "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha256",
            Self::EcdsaSha384 => "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha384",
            Self::EcdsaSha512 => "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha512",
        }
    }

    /// Parses an XML signature method URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|alg| alg.uri() == uri)
    }

    /// Hash function used by the algorithm.
    #[must_use]
    pub const fn hash_algorithm(self) -> HashAlgorithm {
        match self {
            Self::RsaSha1 => HashAlgorithm::Sha1,
            Self::RsaSha256 | Self::RsaSha256Mgf1 | Self::EcdsaSha256 => HashAlgorithm::Sha256,
            Self::RsaSha384 | Self::RsaSha384Mgf1 | Self::EcdsaSha384 => HashAlgorithm::Sha384,
            Self::RsaSha512 | Self::RsaSha512Mgf1 | Self::EcdsaSha512 => HashAlgorithm::Sha512,
        }
    }

    /// Key family used by the algorithm.
    #[must_use]
    pub const fn key_algorithm(self) -> KeyAlgorithm {
        match self {
            Self::EcdsaSha256 | Self::EcdsaSha384 | Self::EcdsaSha512 => KeyAlgorithm::Ec,
            _ => KeyAlgorithm::Rsa,
        }
    }
}

/// Minimum key lengths per key family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyLengthPolicy {
    /// Minimum RSA modulus length.
    pub min_rsa_bits: u32,
    /// Minimum EC field size.
    pub min_ec_bits: u32,
}

impl Default for KeyLengthPolicy {
    fn default() -> Self {
        Self {
            min_rsa_bits: 2048,
            min_ec_bits: 256,
        }
    }
}

impl KeyLengthPolicy {
    /// Checks a key size against the policy.
    ///
    /// ## Errors
    ///
    /// Returns [`AlgorithmError::KeySizeTooSmall`] when the key is too short.
    pub const fn check(&self, algorithm: KeyAlgorithm, bits: u32) -> Result<(), AlgorithmError> {
        let minimum = match algorithm {
            KeyAlgorithm::Rsa => self.min_rsa_bits,
            KeyAlgorithm::Ec => self.min_ec_bits,
        };
        if bits < minimum {
            return Err(AlgorithmError::KeySizeTooSmall {
                algorithm,
                bits,
                minimum,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn signing_names_below_256_bits_are_weak() {
        assert!(matches!(
            check_signing_algorithm_name("SHA1withRSA"),
            Err(AlgorithmError::Weak(_))
        ));
        assert!(matches!(
            check_signing_algorithm_name("SHA224withRSA"),
            Err(AlgorithmError::Weak(_))
        ));
    }

    #[test]
    fn signing_names_of_256_bits_and_above_pass() {
        assert_eq!(
            check_signing_algorithm_name("SHA256withRSA"),
            Ok(HashAlgorithm::Sha256)
        );
        assert_eq!(
            check_signing_algorithm_name("SHA384withECDSA"),
            Ok(HashAlgorithm::Sha384)
        );
        assert_eq!(
            check_signing_algorithm_name("SHA512withRSAandMGF1"),
            Ok(HashAlgorithm::Sha512)
        );
        assert_eq!(
            check_signing_algorithm_name("SHA384WITHRSAANDMGF1"),
            Ok(HashAlgorithm::Sha384)
        );
    }

    #[test]
    fn unparseable_signing_names_fail_closed() {
        assert!(matches!(
            check_signing_algorithm_name("Ed25519"),
            Err(AlgorithmError::Unknown(_))
        ));
        assert!(matches!(
            check_signing_algorithm_name("MD5withRSA"),
            Err(AlgorithmError::Unknown(_))
        ));
    }

    #[test]
    fn digest_uris_resolve() {
        assert_eq!(
            HashAlgorithm::resolve("http://www.w3.org/2001/04/xmlenc#sha512"),
            Some(HashAlgorithm::Sha512)
        );
        assert_eq!(HashAlgorithm::resolve("sha-256"), Some(HashAlgorithm::Sha256));
        assert_eq!(
            HashAlgorithm::resolve("http://www.w3.org/2000/09/xmldsig#sha1"),
            Some(HashAlgorithm::Sha1)
        );
        assert_eq!(HashAlgorithm::resolve("whirlpool"), None);
    }

    #[test]
    fn signature_uris_round_trip() {
        for alg in SignatureAlgorithm::ALL {
            assert_eq!(SignatureAlgorithm::from_uri(alg.uri()), Some(alg));
        }
        assert_eq!(
            SignatureAlgorithm::EcdsaSha384.key_algorithm(),
            KeyAlgorithm::Ec
        );
        assert!(SignatureAlgorithm::RsaSha1.hash_algorithm().is_weak());
    }

    #[test]
    fn key_length_policy() {
        let policy = KeyLengthPolicy::default();
        assert!(policy.check(KeyAlgorithm::Rsa, 2048).is_ok());
        assert!(policy.check(KeyAlgorithm::Ec, 384).is_ok());
        assert_eq!(
            policy.check(KeyAlgorithm::Rsa, 1024),
            Err(AlgorithmError::KeySizeTooSmall {
                algorithm: KeyAlgorithm::Rsa,
                bits: 1024,
                minimum: 2048,
            })
        );
        assert!(policy.check(KeyAlgorithm::Ec, 192).is_err());
    }

    proptest! {
        #[test]
        fn strength_rule_matches_bit_count(idx in 0usize..5, suffix in "(RSA|ECDSA|RSAANDMGF1)") {
            let hashes = ["SHA1", "SHA224", "SHA256", "SHA384", "SHA512"];
            let bits = [160u32, 224, 256, 384, 512];
            let name = format!("{}with{}", hashes[idx], suffix);
            prop_assert_eq!(check_signing_algorithm_name(&name).is_ok(), bits[idx] >= MIN_HASH_BITS);
        }
    }
}
