//! Individual trust checks.
//!
//! Each check is a pure function over a certificate or an algorithm name;
//! [`TrustValidator`](super::TrustValidator) chains them.

use chrono::{DateTime, Utc};
use eidas_crypto::{HashAlgorithm, KeyLengthPolicy};

use super::{Certificate, SignatureInfo, TrustAnchorSet, TrustError};

/// First certificate in the signature's key info.
///
/// ## Errors
///
/// [`TrustError::MalformedSignature`] when there is none;
/// [`TrustError::InvalidCertificate`] when it does not parse.
pub fn extract_signer_certificate(signature: &SignatureInfo) -> Result<Certificate, TrustError> {
    let encoded = signature.certificates.first().ok_or_else(|| {
        TrustError::MalformedSignature("no X.509 certificate in key info".to_string())
    })?;
    Certificate::from_base64(encoded)
}

/// Every certificate in the signature's key info.
///
/// ## Errors
///
/// [`TrustError::InvalidCertificate`] when one does not parse.
pub fn signature_chain(signature: &SignatureInfo) -> Result<Vec<Certificate>, TrustError> {
    signature
        .certificates
        .iter()
        .map(|encoded| Certificate::from_base64(encoded))
        .collect()
}

/// Rejects certificates used outside `[notBefore, notAfter]`.
///
/// ## Errors
///
/// [`TrustError::ExpiredCertificate`].
pub fn check_validity_period(
    cert: &Certificate,
    enforce: bool,
    now: DateTime<Utc>,
) -> Result<(), TrustError> {
    if !enforce {
        return Ok(());
    }
    if now < cert.not_before() || now > cert.not_after() {
        return Err(TrustError::ExpiredCertificate {
            subject: cert.subject().to_string(),
            not_before: cert.not_before(),
            not_after: cert.not_after(),
        });
    }
    Ok(())
}

/// Rejects certificates whose subject equals their issuer.
///
/// ## Errors
///
/// [`TrustError::SelfSignedCertificate`].
pub fn check_not_self_signed(cert: &Certificate, disallow: bool) -> Result<(), TrustError> {
    if disallow && cert.is_self_issued() {
        return Err(TrustError::SelfSignedCertificate(cert.subject().to_string()));
    }
    Ok(())
}

/// Digest algorithm URI to sign with. Blank input selects SHA-512.
///
/// ## Errors
///
/// [`TrustError::WeakAlgorithm`] for SHA-1, [`TrustError::UnapprovedAlgorithm`]
/// for names that are not a digest.
pub fn normalize_digest_algorithm(name: Option<&str>) -> Result<&'static str, TrustError> {
    let name = name.map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Ok(HashAlgorithm::Sha512.digest_uri());
    }
    let hash = HashAlgorithm::resolve(name)
        .ok_or_else(|| TrustError::UnapprovedAlgorithm(name.to_string()))?;
    if hash == HashAlgorithm::Sha1 {
        return Err(TrustError::WeakAlgorithm(name.to_string()));
    }
    Ok(hash.digest_uri())
}

/// Rejects signature algorithms that are not whitelisted.
///
/// ## Errors
///
/// [`TrustError::UnapprovedAlgorithm`].
pub fn check_signature_algorithm_whitelisted<S: AsRef<str>>(
    algorithm: Option<&str>,
    whitelist: &[S],
) -> Result<(), TrustError> {
    let algorithm = algorithm.map(str::trim).unwrap_or_default();
    if algorithm.is_empty() || !whitelist.iter().any(|w| w.as_ref().trim() == algorithm) {
        return Err(TrustError::UnapprovedAlgorithm(algorithm.to_string()));
    }
    Ok(())
}

/// Rejects certificates signed with a hash weaker than 256 bits, or with an
/// algorithm that cannot be identified.
///
/// ## Errors
///
/// [`TrustError::WeakAlgorithm`].
pub fn check_certificate_signature_hash(cert: &Certificate) -> Result<(), TrustError> {
    let name = cert
        .signature_algorithm()
        .ok_or_else(|| TrustError::WeakAlgorithm("unrecognised certificate signature".to_string()))?;
    eidas_crypto::algorithm::check_signing_algorithm_name(name)
        .map(|_| ())
        .map_err(|_| TrustError::WeakAlgorithm(name.to_string()))
}

/// Rejects short keys.
///
/// ## Errors
///
/// [`TrustError::WeakKey`], also for unrecognised key types.
pub fn check_key_length(cert: &Certificate, policy: &KeyLengthPolicy) -> Result<(), TrustError> {
    let (algorithm, bits) = cert
        .public_key()
        .ok_or_else(|| TrustError::WeakKey("unrecognised public key".to_string()))?;
    policy
        .check(algorithm, bits)
        .map_err(|e| TrustError::WeakKey(e.to_string()))
}

/// Requires the subject `C=` attribute to equal `expected`, ignoring case.
///
/// ## Errors
///
/// [`TrustError::CountryMismatch`].
pub fn check_certificate_country(cert: &Certificate, expected: &str) -> Result<(), TrustError> {
    match cert.country() {
        Some(country) if country.eq_ignore_ascii_case(expected.trim()) => Ok(()),
        found => Err(TrustError::CountryMismatch {
            expected: expected.to_string(),
            found: found.map(str::to_string),
        }),
    }
}

/// Succeeds when the signer, the first certificate of `chain`, is a trust
/// anchor or reaches one through issuer links inside `chain` whose
/// signatures verify.
///
/// ## Errors
///
/// [`TrustError::UntrustedCertificate`], also for an empty chain.
pub fn check_trust_anchor(
    chain: &[Certificate],
    anchors: &TrustAnchorSet,
) -> Result<(), TrustError> {
    let Some(signer) = chain.first() else {
        return Err(TrustError::UntrustedCertificate("empty chain".to_string()));
    };
    let mut current = signer;
    for _ in 0..chain.len() {
        if anchors.contains(current) {
            return Ok(());
        }
        match chain
            .iter()
            .find(|cert| *cert != current && current.is_issued_by(cert))
        {
            Some(issuer) => current = issuer,
            None => break,
        }
    }
    Err(TrustError::UntrustedCertificate(signer.subject().to_string()))
}
