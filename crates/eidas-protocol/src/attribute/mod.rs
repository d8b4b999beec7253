//! Attribute definitions and the attribute catalog.
//!
//! A catalog maps each [`AttributeDefinition`] to its ordered values. It is
//! built once through [`AttributeCatalogBuilder`] and immutable afterwards.
//! The standard eIDAS definitions live in [`eidas_registry`].

mod catalog;
mod definition;
mod registry;
mod rules;
mod transliteration;
mod value;

pub use catalog::{AttributeCatalog, AttributeCatalogBuilder};
pub use definition::{AttributeDefinition, AttributeValueType, PersonType};
pub use registry::{eidas_registry, uris, AttributeRegistry};
pub use rules::{
    check_mandatory_attributes, check_representative_attributes, missing_required_attribute,
    validate_attributes,
};
pub use transliteration::{is_latin_script, transliterate};
pub use value::{AttributeValue, Gender, TypedValue};

use thiserror::Error;

/// Attribute catalog errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttributeError {
    /// The same definition was put twice.
    #[error("duplicate values for attribute {0}")]
    DuplicateDefinition(String),

    /// Two different definitions share a name URI.
    #[error("non-unique name URIs: {0}")]
    NonUniqueNameUri(String),

    /// A value does not fit its definition.
    #[error("invalid value for attribute {name_uri}: {reason}")]
    InvalidValue {
        /// Name URI of the attribute.
        name_uri: String,
        /// What is wrong with the value.
        reason: String,
    },
}
