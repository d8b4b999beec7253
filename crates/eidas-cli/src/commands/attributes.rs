//! Attribute registry listing.

use eidas_protocol::attribute::{eidas_registry, AttributeDefinition, PersonType};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::AttributesArgs;
use crate::output::{output, OutputFormat};

const PERSON_TYPES: [PersonType; 4] = [
    PersonType::NaturalPerson,
    PersonType::LegalPerson,
    PersonType::RepresentativeNaturalPerson,
    PersonType::RepresentativeLegalPerson,
];

/// One registered attribute.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct AttributeRow {
    /// Friendly name.
    pub friendly_name: String,
    /// Person type.
    pub person_type: &'static str,
    /// Value codec.
    pub value_type: &'static str,
    /// Part of the minimum data set.
    pub required: bool,
    /// Unique identifier.
    pub unique: bool,
    /// Name URI.
    pub name_uri: String,
}

impl From<&AttributeDefinition> for AttributeRow {
    fn from(definition: &AttributeDefinition) -> Self {
        Self {
            friendly_name: definition.friendly_name.clone(),
            person_type: definition.person_type.as_str(),
            value_type: definition.value_type.as_str(),
            required: definition.required,
            unique: definition.unique_identifier,
            name_uri: definition.name_uri.clone(),
        }
    }
}

/// Lists the registered attribute definitions.
///
/// ## Errors
///
/// Returns an error for an unknown person type.
pub fn run_attributes(args: &AttributesArgs, format: OutputFormat) -> crate::CliResult<()> {
    let person_type = args.person_type.as_deref().map(parse_person_type).transpose()?;
    output(&list(person_type, args.required), format)
}

fn parse_person_type(value: &str) -> crate::CliResult<PersonType> {
    PERSON_TYPES
        .into_iter()
        .find(|t| t.as_str().eq_ignore_ascii_case(value.trim()))
        .ok_or_else(|| {
            crate::CliError::InvalidArgument(format!(
                "unknown person type {value}; expected one of {}",
                PERSON_TYPES.map(PersonType::as_str).join(", ")
            ))
        })
}

fn list(person_type: Option<PersonType>, required_only: bool) -> Vec<AttributeRow> {
    eidas_registry()
        .iter()
        .filter(|d| person_type.map_or(true, |t| d.person_type == t))
        .filter(|d| !required_only || d.required)
        .map(AttributeRow::from)
        .collect()
}
