//! Field checks shared by both half-flows.

use std::sync::LazyLock;

use regex::Regex;

use crate::attribute::{uris, AttributeCatalog};
use crate::types::{check_subject, AuthenticationResponse, NameIdFormat, SpType};

/// Longest requester id accepted.
pub const MAX_REQUESTER_ID_LENGTH: usize = 1024;

/// Shape of a country-prefixed identifier: `ES/AT/02635542Y`.
///
/// The pattern is a constant, so a failure here is a programming error.
static PREFIXED_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]{2}/[A-Z]{2}/.+$").expect("PREFIXED_IDENTIFIER is a valid regex pattern")
});

/// Result of comparing the requested and asserted NameID formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameIdOutcome {
    /// The asserted NameID is acceptable.
    Accepted,
    /// The asserted format differs from a specific requested format. The
    /// response must be turned into an `InvalidNameIDPolicy` failure.
    PolicyMismatch,
}

/// Checks the requester id of a request.
///
/// A private SP must send a requester id when the counter-party requires
/// one. When present it must be an absolute URI of at most
/// [`MAX_REQUESTER_ID_LENGTH`] characters.
///
/// ## Errors
///
/// Returns a description of the violated rule.
pub fn check_requester_id(
    requester_id: Option<&str>,
    sp_type: Option<SpType>,
    required: bool,
) -> Result<(), String> {
    let requester_id = requester_id.map(str::trim).filter(|id| !id.is_empty());
    match requester_id {
        None if required && sp_type == Some(SpType::Private) => {
            Err("requester id is mandatory for private service providers".to_string())
        }
        None => Ok(()),
        Some(id) if id.chars().count() > MAX_REQUESTER_ID_LENGTH => Err(format!(
            "requester id exceeds {MAX_REQUESTER_ID_LENGTH} characters"
        )),
        Some(id) => url::Url::parse(id)
            .map(|_| ())
            .map_err(|e| format!("requester id '{id}' is not an absolute URI: {e}")),
    }
}

/// Formats a node accepts: persistent, transient and unspecified plus the
/// configured extras.
fn accepted_formats<'a>(configured: &'a [String]) -> impl Iterator<Item = &'a str> {
    NameIdFormat::BASELINE
        .into_iter()
        .map(|f| f.uri())
        .chain(configured.iter().map(|f| f.trim()))
}

/// Checks a requested NameID format against the local and target sets.
///
/// An absent format passes. A target that publishes no formats is not
/// consulted.
///
/// ## Errors
///
/// Returns a description naming the unsupported format.
pub fn check_requested_name_id_format(
    requested: Option<&str>,
    locally_configured: &[String],
    target_published: &[String],
) -> Result<(), String> {
    let Some(format) = requested.map(str::trim).filter(|f| !f.is_empty()) else {
        return Ok(());
    };
    if !accepted_formats(locally_configured).any(|f| f == format) {
        return Err(format!("NameID format {format} is not supported locally"));
    }
    if !target_published.is_empty() && !target_published.iter().any(|f| f.trim() == format) {
        return Err(format!("NameID format {format} is not published by the target"));
    }
    Ok(())
}

/// Checks the NameID of a successful response against the request.
///
/// Missing formats count as unspecified on both sides.
///
/// ## Errors
///
/// Returns a description when a format is not accepted or the subject is
/// malformed. A mismatch between a specific requested format and the
/// asserted one is not an error; it yields [`NameIdOutcome::PolicyMismatch`].
pub fn check_response_name_id(
    requested_format: Option<&str>,
    response: &AuthenticationResponse,
    locally_configured: &[String],
) -> Result<NameIdOutcome, String> {
    let unspecified = NameIdFormat::Unspecified.uri();
    let requested = requested_format.map_or(unspecified, str::trim);
    let asserted = response
        .subject_name_id_format
        .as_deref()
        .map_or(unspecified, str::trim);

    for format in [requested, asserted] {
        if !accepted_formats(locally_configured).any(|f| f == format) {
            return Err(format!("NameID format {format} is not accepted"));
        }
    }

    let subject = response.subject.as_deref().unwrap_or_default();
    match NameIdFormat::from_uri(asserted) {
        Some(format) => check_subject(subject, format)?,
        None if subject.trim().is_empty() => return Err("NameID subject is blank".to_string()),
        None => {}
    }

    if requested != unspecified && requested != asserted {
        return Ok(NameIdOutcome::PolicyMismatch);
    }
    Ok(NameIdOutcome::Accepted)
}

/// Checks identifier attributes carry the expected country prefix.
///
/// Person and legal person identifiers must look like `CC/CC/value`. All
/// identifiers, representative ones included, must start with `country`,
/// ignoring case.
///
/// ## Errors
///
/// Returns a description naming the offending attribute.
pub fn check_identifier_prefixes(attributes: &AttributeCatalog, country: &str) -> Result<(), String> {
    for name_uri in [uris::PERSON_IDENTIFIER, uris::LEGAL_PERSON_IDENTIFIER] {
        for value in attributes.values(name_uri) {
            if !PREFIXED_IDENTIFIER.is_match(&value.marshal()) {
                return Err(format!("{name_uri} is not of the form CC/CC/value"));
            }
        }
    }

    for name_uri in uris::COUNTRY_PREFIXED_IDENTIFIERS {
        for value in attributes.values(name_uri) {
            let marshalled = value.marshal();
            let prefix = marshalled.get(..2).unwrap_or_default();
            if !prefix.eq_ignore_ascii_case(country) {
                return Err(format!("{name_uri} value is not issued by {country}"));
            }
        }
    }
    Ok(())
}
