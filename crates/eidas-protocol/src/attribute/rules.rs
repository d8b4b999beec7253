//! Minimum data set and value rules.

use super::{eidas_registry, AttributeCatalog, AttributeDefinition, AttributeError, PersonType, TypedValue};
use crate::types::ProtocolVersion;

/// Whether the catalog carries a complete minimum data set.
///
/// When any natural person attribute is present, every mandatory natural
/// person attribute must be; likewise for legal persons. An empty catalog
/// never satisfies the rule.
#[must_use]
pub fn check_mandatory_attributes(catalog: &AttributeCatalog) -> bool {
    if catalog.is_empty() {
        return false;
    }
    [PersonType::NaturalPerson, PersonType::LegalPerson]
        .into_iter()
        .all(|person_type| {
            let present = catalog
                .definitions()
                .any(|d| d.person_type == person_type);
            !present
                || eidas_registry()
                    .mandatory(person_type)
                    .all(|d| catalog.contains(&d.name_uri))
        })
}

/// Whether the catalog is free of representative attributes.
#[must_use]
pub fn check_representative_attributes(catalog: &AttributeCatalog) -> bool {
    !catalog
        .definitions()
        .any(|d| d.person_type.is_representative())
}

/// First required attribute of `requested` that `asserted` lacks or carries
/// without a value.
#[must_use]
pub fn missing_required_attribute<'a>(
    requested: &'a AttributeCatalog,
    asserted: &AttributeCatalog,
) -> Option<&'a AttributeDefinition> {
    requested
        .definitions()
        .filter(|d| d.required)
        .find(|d| asserted.values(&d.name_uri).is_empty())
}

/// Validates every value against its definition.
///
/// Gender codes must be defined by at least one of the protocol versions in
/// use; with none given every known code passes.
///
/// ## Errors
///
/// Returns [`AttributeError::InvalidValue`] for the first offending value.
pub fn validate_attributes<S: AsRef<str>>(
    catalog: &AttributeCatalog,
    protocol_versions: &[S],
) -> Result<(), AttributeError> {
    let versions: Vec<ProtocolVersion> = protocol_versions
        .iter()
        .filter_map(|v| ProtocolVersion::parse(v.as_ref()))
        .collect();

    for (definition, values) in catalog.iter() {
        for value in values {
            let invalid = |reason: String| AttributeError::InvalidValue {
                name_uri: definition.name_uri.clone(),
                reason,
            };

            if !definition.value_type.accepts(&value.value) {
                return Err(invalid(format!(
                    "expected a {} value",
                    definition.value_type.as_str()
                )));
            }
            match &value.value {
                TypedValue::String(text) if text.trim().is_empty() => {
                    return Err(invalid("value is blank".to_string()));
                }
                TypedValue::Gender(gender)
                    if !versions.is_empty()
                        && !versions.iter().any(|v| gender.accepted_by(*v)) =>
                {
                    return Err(invalid(format!(
                        "gender '{}' is not defined by the protocol versions in use",
                        gender.as_str()
                    )));
                }
                _ => {}
            }
        }
    }
    Ok(())
}
