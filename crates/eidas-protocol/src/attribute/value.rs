//! Attribute values and their codecs.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::NaiveDate;
use std::fmt;

use super::AttributeValueType;
use crate::types::ProtocolVersion;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// eIDAS gender codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    /// `Male`
    Male,
    /// `Female`
    Female,
    /// `Unspecified`, legacy generation only.
    Unspecified,
    /// `Not Specified`, current generation only.
    NotSpecified,
}

impl Gender {
    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Unspecified => "Unspecified",
            Self::NotSpecified => "Not Specified",
        }
    }

    /// Parses a wire value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Male" => Some(Self::Male),
            "Female" => Some(Self::Female),
            "Unspecified" => Some(Self::Unspecified),
            "Not Specified" => Some(Self::NotSpecified),
            _ => None,
        }
    }

    /// Whether the given protocol generation defines this code.
    #[must_use]
    pub const fn accepted_by(self, version: ProtocolVersion) -> bool {
        match self {
            Self::Male | Self::Female => true,
            Self::Unspecified => matches!(version, ProtocolVersion::V1_1),
            Self::NotSpecified => matches!(version, ProtocolVersion::V1_2),
        }
    }
}

/// A decoded attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypedValue {
    /// Text.
    String(String),
    /// Calendar date.
    Date(NaiveDate),
    /// Gender code.
    Gender(Gender),
    /// Decoded structured value.
    Binary(Vec<u8>),
}

impl TypedValue {
    /// The text, for string values.
    #[must_use]
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Self::Gender(g) => f.write_str(g.as_str()),
            Self::Binary(bytes) => f.write_str(&STANDARD.encode(bytes)),
        }
    }
}

/// One value of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeValue {
    /// The value.
    pub value: TypedValue,
    /// Set on the original of a transliterated value.
    pub non_latin_script_alternate: bool,
}

impl AttributeValue {
    /// Creates a primary value.
    #[must_use]
    pub fn new(value: TypedValue) -> Self {
        Self {
            value,
            non_latin_script_alternate: false,
        }
    }

    /// Creates a primary string value.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::new(TypedValue::String(value.into()))
    }

    /// Flags the value as the non-Latin original of a transliteration.
    #[must_use]
    pub fn as_non_latin_alternate(mut self) -> Self {
        self.non_latin_script_alternate = true;
        self
    }

    /// Wire form of the value.
    #[must_use]
    pub fn marshal(&self) -> String {
        self.value.to_string()
    }
}

impl AttributeValueType {
    /// Decodes a wire value.
    ///
    /// ## Errors
    ///
    /// Returns the reason the value does not fit the codec.
    pub fn unmarshal(self, raw: &str) -> Result<TypedValue, String> {
        match self {
            Self::String => Ok(TypedValue::String(raw.to_string())),
            Self::Date => NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
                .map(TypedValue::Date)
                .map_err(|e| format!("'{raw}' is not a YYYY-MM-DD date: {e}")),
            Self::Gender => Gender::parse(raw)
                .map(TypedValue::Gender)
                .ok_or_else(|| format!("'{raw}' is not a gender code")),
            Self::Base64 => STANDARD
                .decode(raw.trim())
                .map(TypedValue::Binary)
                .map_err(|e| format!("value is not base64: {e}")),
        }
    }

    /// Whether a decoded value belongs to this codec.
    #[must_use]
    pub const fn accepts(self, value: &TypedValue) -> bool {
        matches!(
            (self, value),
            (Self::String, TypedValue::String(_))
                | (Self::Date, TypedValue::Date(_))
                | (Self::Gender, TypedValue::Gender(_))
                | (Self::Base64, TypedValue::Binary(_))
        )
    }
}
