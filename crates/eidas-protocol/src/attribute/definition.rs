//! Attribute definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of subject an attribute describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonType {
    /// A natural person.
    NaturalPerson,
    /// A legal person.
    LegalPerson,
    /// A natural person acting as representative.
    RepresentativeNaturalPerson,
    /// A legal person acting as representative.
    RepresentativeLegalPerson,
}

impl PersonType {
    /// Display name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NaturalPerson => "NaturalPerson",
            Self::LegalPerson => "LegalPerson",
            Self::RepresentativeNaturalPerson => "RepresentativeNaturalPerson",
            Self::RepresentativeLegalPerson => "RepresentativeLegalPerson",
        }
    }

    /// Whether this is one of the representative types.
    #[must_use]
    pub const fn is_representative(self) -> bool {
        matches!(
            self,
            Self::RepresentativeNaturalPerson | Self::RepresentativeLegalPerson
        )
    }
}

impl fmt::Display for PersonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value codec of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeValueType {
    /// Free text.
    String,
    /// Calendar date, `YYYY-MM-DD`.
    Date,
    /// Gender code.
    Gender,
    /// Base64 encoded structured value, such as an address.
    Base64,
}

impl AttributeValueType {
    /// Codec name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Date => "date",
            Self::Gender => "gender",
            Self::Base64 => "base64",
        }
    }
}

/// Definition of one attribute.
///
/// Two definitions are the same only when every field matches; the catalog
/// separately requires name URIs to be unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeDefinition {
    /// Unique name URI.
    pub name_uri: String,
    /// Short human-readable name.
    pub friendly_name: String,
    /// Subject kind.
    pub person_type: PersonType,
    /// Part of the minimum data set.
    pub required: bool,
    /// Identifies the subject uniquely.
    pub unique_identifier: bool,
    /// Non-Latin values must come with a Latin transliteration.
    pub transliteration_mandatory: bool,
    /// Value codec.
    pub value_type: AttributeValueType,
}

impl AttributeDefinition {
    /// Creates an optional definition.
    #[must_use]
    pub fn new(
        name_uri: impl Into<String>,
        friendly_name: impl Into<String>,
        person_type: PersonType,
        value_type: AttributeValueType,
    ) -> Self {
        Self {
            name_uri: name_uri.into(),
            friendly_name: friendly_name.into(),
            person_type,
            required: false,
            unique_identifier: false,
            transliteration_mandatory: false,
            value_type,
        }
    }

    /// Marks the definition as part of the minimum data set.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the definition as a unique identifier.
    #[must_use]
    pub fn unique_identifier(mut self) -> Self {
        self.unique_identifier = true;
        self
    }

    /// Requires transliteration of non-Latin values.
    #[must_use]
    pub fn transliteration_mandatory(mut self) -> Self {
        self.transliteration_mandatory = true;
        self
    }
}

impl fmt::Display for AttributeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.friendly_name, self.name_uri)
    }
}
