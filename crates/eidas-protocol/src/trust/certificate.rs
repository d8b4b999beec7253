//! X.509 signing certificates.

use std::fmt;
use std::hash::{Hash, Hasher};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use eidas_crypto::KeyAlgorithm;
use x509_parser::prelude::*;
use x509_parser::public_key::PublicKey;
use x509_parser::signature_algorithm::SignatureAlgorithm as X509SignatureAlgorithm;

use super::TrustError;

const RSASSA_PSS_OID: &str = "1.2.840.113549.1.1.10";

/// A parsed X.509 certificate.
///
/// Parsing happens once at construction. Equality and hashing use the DER
/// encoding only.
#[derive(Clone)]
pub struct Certificate {
    der: Vec<u8>,
    subject: String,
    issuer: String,
    self_issued: bool,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    country: Option<String>,
    signature_algorithm: Option<String>,
    public_key: Option<(KeyAlgorithm, u32)>,
}

impl Certificate {
    /// Parses a DER encoded certificate.
    ///
    /// ## Errors
    ///
    /// Returns [`TrustError::InvalidCertificate`] when the bytes are not a
    /// certificate.
    pub fn from_der(der: &[u8]) -> Result<Self, TrustError> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| TrustError::InvalidCertificate(format!("{e:?}")))?;

        let validity = cert.validity();
        let not_before = DateTime::from_timestamp(validity.not_before.timestamp(), 0)
            .ok_or_else(|| TrustError::InvalidCertificate("notBefore out of range".to_string()))?;
        let not_after = DateTime::from_timestamp(validity.not_after.timestamp(), 0)
            .ok_or_else(|| TrustError::InvalidCertificate("notAfter out of range".to_string()))?;

        let country = cert
            .subject()
            .iter_country()
            .next()
            .and_then(|attr| attr.as_str().ok())
            .map(str::to_string);

        Ok(Self {
            der: der.to_vec(),
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            self_issued: cert.subject().as_raw() == cert.issuer().as_raw(),
            not_before,
            not_after,
            country,
            signature_algorithm: signature_algorithm_name(&cert),
            public_key: public_key_size(&cert),
        })
    }

    /// Parses a base64 DER certificate, as embedded in `X509Certificate`
    /// elements. Whitespace is ignored.
    ///
    /// ## Errors
    ///
    /// Returns [`TrustError::InvalidCertificate`] on bad encoding or content.
    pub fn from_base64(encoded: &str) -> Result<Self, TrustError> {
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        let der = STANDARD
            .decode(compact)
            .map_err(|e| TrustError::InvalidCertificate(format!("bad base64: {e}")))?;
        Self::from_der(&der)
    }

    /// Parses every `CERTIFICATE` block of a PEM buffer.
    ///
    /// ## Errors
    ///
    /// Returns [`TrustError::InvalidCertificate`] on malformed PEM or
    /// certificate content.
    pub fn from_pem(pem: &[u8]) -> Result<Vec<Self>, TrustError> {
        let mut certificates = Vec::new();
        for block in x509_parser::pem::Pem::iter_from_buffer(pem) {
            let block = block.map_err(|e| TrustError::InvalidCertificate(format!("bad PEM: {e:?}")))?;
            if block.label == "CERTIFICATE" {
                certificates.push(Self::from_der(&block.contents)?);
            }
        }
        Ok(certificates)
    }

    /// DER encoding.
    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Subject distinguished name.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Issuer distinguished name.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Whether subject and issuer names are identical.
    #[must_use]
    pub const fn is_self_issued(&self) -> bool {
        self.self_issued
    }

    /// Start of validity.
    #[must_use]
    pub const fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    /// End of validity.
    #[must_use]
    pub const fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    /// Subject `C=` attribute.
    #[must_use]
    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    /// JCA-style name of the algorithm the issuer signed this certificate
    /// with, such as `SHA256withRSA`. `None` for unknown algorithms.
    #[must_use]
    pub fn signature_algorithm(&self) -> Option<&str> {
        self.signature_algorithm.as_deref()
    }

    /// Key family and size in bits, when recognised.
    #[must_use]
    pub const fn public_key(&self) -> Option<(KeyAlgorithm, u32)> {
        self.public_key
    }

    /// Lowercase hex SHA-256 of the DER encoding.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        eidas_crypto::fingerprint(&self.der)
    }

    /// Whether `issuer` issued this certificate: the issuer name matches the
    /// subject of `issuer` and the signature verifies under its key.
    #[must_use]
    pub fn is_issued_by(&self, issuer: &Certificate) -> bool {
        let (Ok((_, cert)), Ok((_, parent))) = (
            X509Certificate::from_der(&self.der),
            X509Certificate::from_der(&issuer.der),
        ) else {
            return false;
        };
        cert.issuer().as_raw() == parent.subject().as_raw()
            && cert.verify_signature(Some(parent.public_key())).is_ok()
    }
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Certificate {}

impl Hash for Certificate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.der.hash(state);
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject)
            .field("issuer", &self.issuer)
            .field("not_after", &self.not_after)
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

fn signature_algorithm_name(cert: &X509Certificate<'_>) -> Option<String> {
    let oid = cert.signature_algorithm.algorithm.to_id_string();
    let name = match oid.as_str() {
        "1.2.840.113549.1.1.5" => "SHA1withRSA",
        "1.2.840.113549.1.1.14" => "SHA224withRSA",
        "1.2.840.113549.1.1.11" => "SHA256withRSA",
        "1.2.840.113549.1.1.12" => "SHA384withRSA",
        "1.2.840.113549.1.1.13" => "SHA512withRSA",
        "1.2.840.10045.4.1" => "SHA1withECDSA",
        "1.2.840.10045.4.3.1" => "SHA224withECDSA",
        "1.2.840.10045.4.3.2" => "SHA256withECDSA",
        "1.2.840.10045.4.3.3" => "SHA384withECDSA",
        "1.2.840.10045.4.3.4" => "SHA512withECDSA",
        RSASSA_PSS_OID => return pss_algorithm_name(cert),
        _ => return None,
    };
    Some(name.to_string())
}

fn pss_algorithm_name(cert: &X509Certificate<'_>) -> Option<String> {
    let X509SignatureAlgorithm::RSASSA_PSS(params) =
        X509SignatureAlgorithm::try_from(&cert.signature_algorithm).ok()?
    else {
        return None;
    };
    let hash = match params.hash_algorithm_oid().to_id_string().as_str() {
        "1.3.14.3.2.26" => "SHA1",
        "2.16.840.1.101.3.4.2.4" => "SHA224",
        "2.16.840.1.101.3.4.2.1" => "SHA256",
        "2.16.840.1.101.3.4.2.2" => "SHA384",
        "2.16.840.1.101.3.4.2.3" => "SHA512",
        _ => return None,
    };
    Some(format!("{hash}withRSAandMGF1"))
}

fn public_key_size(cert: &X509Certificate<'_>) -> Option<(KeyAlgorithm, u32)> {
    match cert.public_key().parsed().ok()? {
        PublicKey::RSA(key) => Some((KeyAlgorithm::Rsa, u32::try_from(key.key_size()).ok()?)),
        PublicKey::EC(point) => Some((KeyAlgorithm::Ec, u32::try_from(point.key_size()).ok()?)),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Certificate fixtures generated with rcgen.

    use rcgen::{CertificateParams, DnType, KeyPair};

    use super::Certificate;

    /// A CA and a leaf signed by it, both ECDSA P-256 with SHA-256.
    pub struct Fixture {
        pub ca: Certificate,
        pub leaf: Certificate,
    }

    pub fn self_signed(country: &str) -> Certificate {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(vec!["node.example.eu".to_string()]).unwrap();
        params
            .distinguished_name
            .push(DnType::CommonName, "eIDAS test node");
        params.distinguished_name.push(DnType::CountryName, country);
        let cert = params.self_signed(&key).unwrap();
        Certificate::from_der(cert.der()).unwrap()
    }

    pub fn expired(country: &str) -> Certificate {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(vec!["old.example.eu".to_string()]).unwrap();
        params.distinguished_name.push(DnType::CountryName, country);
        params.not_before = rcgen::date_time_ymd(2001, 1, 1);
        params.not_after = rcgen::date_time_ymd(2002, 1, 1);
        let cert = params.self_signed(&key).unwrap();
        Certificate::from_der(cert.der()).unwrap()
    }

    pub fn chain(country: &str) -> Fixture {
        let ca_key = KeyPair::generate().unwrap();
        let mut ca_params = CertificateParams::new(Vec::<String>::new()).unwrap();
        ca_params
            .distinguished_name
            .push(DnType::CommonName, "eIDAS test CA");
        ca_params.distinguished_name.push(DnType::CountryName, country);
        ca_params.is_ca = rcgen::IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
        let ca = ca_params.self_signed(&ca_key).unwrap();

        let leaf_key = KeyPair::generate().unwrap();
        let mut leaf_params =
            CertificateParams::new(vec!["connector.example.eu".to_string()]).unwrap();
        leaf_params
            .distinguished_name
            .push(DnType::CommonName, "eIDAS test signer");
        leaf_params
            .distinguished_name
            .push(DnType::CountryName, country);
        let leaf = leaf_params.signed_by(&leaf_key, &ca, &ca_key).unwrap();

        Fixture {
            ca: Certificate::from_der(ca.der()).unwrap(),
            leaf: Certificate::from_der(leaf.der()).unwrap(),
        }
    }
}
