//! NameID subject rules.

use super::NameIdFormat;

/// Maximum subject length for persistent and transient NameIDs.
pub const MAX_PERSISTENT_SUBJECT_LENGTH: usize = 256;

/// Maximum subject length for entity NameIDs.
pub const MAX_ENTITY_SUBJECT_LENGTH: usize = 1024;

/// Resolves a NameID format URI, treating an absent format as unspecified.
#[must_use]
pub fn effective_name_id_format(format: Option<&str>) -> Option<NameIdFormat> {
    match format {
        None => Some(NameIdFormat::Unspecified),
        Some(uri) => NameIdFormat::from_uri(uri.trim()),
    }
}

/// Checks a NameID subject against the shape rules of its format.
///
/// ## Errors
///
/// Returns a description of the violated rule.
pub fn check_subject(subject: &str, format: NameIdFormat) -> Result<(), String> {
    if subject.trim().is_empty() {
        return Err("NameID subject is blank".to_string());
    }
    match format {
        NameIdFormat::Persistent | NameIdFormat::Transient => {
            if subject.chars().count() > MAX_PERSISTENT_SUBJECT_LENGTH {
                return Err(format!(
                    "NameID subject exceeds {MAX_PERSISTENT_SUBJECT_LENGTH} characters"
                ));
            }
        }
        NameIdFormat::Entity => {
            if subject.chars().count() > MAX_ENTITY_SUBJECT_LENGTH {
                return Err(format!(
                    "entity NameID exceeds {MAX_ENTITY_SUBJECT_LENGTH} characters"
                ));
            }
            url::Url::parse(subject)
                .map_err(|e| format!("entity NameID is not a URI: {e}"))?;
        }
        NameIdFormat::Unspecified => {}
    }
    Ok(())
}
