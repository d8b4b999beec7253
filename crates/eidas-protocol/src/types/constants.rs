//! eIDAS and SAML constants.

use serde::{Deserialize, Serialize};

// ============================================================================
// HTTP methods and bindings
// ============================================================================

/// HTTP method a message arrived with or must be sent with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// HTTP GET (Redirect binding).
    Get,
    /// HTTP POST (POST binding).
    Post,
}

impl HttpMethod {
    /// Method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }

    /// Parses a method name, ignoring case.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("GET") {
            Some(Self::Get)
        } else if value.eq_ignore_ascii_case("POST") {
            Some(Self::Post)
        } else {
            None
        }
    }

    /// SAML binding carried by this method.
    #[must_use]
    pub const fn binding(self) -> SamlBinding {
        match self {
            Self::Get => SamlBinding::HttpRedirect,
            Self::Post => SamlBinding::HttpPost,
        }
    }
}

/// SAML binding types used between eIDAS nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamlBinding {
    /// HTTP POST binding.
    HttpPost,
    /// HTTP Redirect binding.
    HttpRedirect,
}

impl SamlBinding {
    /// Returns the URI for this binding.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::HttpPost => "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST",
            Self::HttpRedirect => "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect",
        }
    }

    /// Parses a binding from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST" => Some(Self::HttpPost),
            "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect" => Some(Self::HttpRedirect),
            _ => None,
        }
    }
}

// ============================================================================
// Name ID Formats
// ============================================================================

/// Name ID formats recognised by eIDAS nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NameIdFormat {
    /// Unspecified name ID format.
    #[default]
    Unspecified,
    /// Persistent identifier format.
    Persistent,
    /// Transient identifier format.
    Transient,
    /// Entity identifier format.
    Entity,
}

impl NameIdFormat {
    /// Formats every Connector accepts regardless of configuration.
    pub const BASELINE: [Self; 3] = [Self::Persistent, Self::Transient, Self::Unspecified];

    /// Returns the URI for this name ID format.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::Unspecified => "urn:oasis:names:tc:SAML:1.1:nameid-format:unspecified",
            Self::Persistent => "urn:oasis:names:tc:SAML:2.0:nameid-format:persistent",
            Self::Transient => "urn:oasis:names:tc:SAML:2.0:nameid-format:transient",
            Self::Entity => "urn:oasis:names:tc:SAML:2.0:nameid-format:entity",
        }
    }

    /// Parses a name ID format from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            "urn:oasis:names:tc:SAML:1.1:nameid-format:unspecified" => Some(Self::Unspecified),
            "urn:oasis:names:tc:SAML:2.0:nameid-format:persistent" => Some(Self::Persistent),
            "urn:oasis:names:tc:SAML:2.0:nameid-format:transient" => Some(Self::Transient),
            "urn:oasis:names:tc:SAML:2.0:nameid-format:entity" => Some(Self::Entity),
            _ => None,
        }
    }
}

// ============================================================================
// Protocol versions
// ============================================================================

/// eIDAS protocol generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProtocolVersion {
    /// Version 1.1, the legacy generation.
    #[serde(rename = "1.1")]
    V1_1,
    /// Version 1.2, the current generation.
    #[serde(rename = "1.2")]
    V1_2,
}

impl ProtocolVersion {
    /// Version string as published in metadata.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V1_1 => "1.1",
            Self::V1_2 => "1.2",
        }
    }

    /// Parses a version string. Unknown versions yield `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "1.1" => Some(Self::V1_1),
            "1.2" => Some(Self::V1_2),
            _ => None,
        }
    }

    /// Whether this is the legacy generation.
    #[must_use]
    pub const fn is_legacy(self) -> bool {
        matches!(self, Self::V1_1)
    }

    /// Highest known version in a published list, ignoring unknown entries.
    #[must_use]
    pub fn highest<S: AsRef<str>>(versions: &[S]) -> Option<Self> {
        versions.iter().filter_map(|v| Self::parse(v.as_ref())).max()
    }

    /// Highest known version, or the legacy generation when none is
    /// published. Nodes that predate version publication speak 1.1.
    #[must_use]
    pub fn highest_or_legacy<S: AsRef<str>>(versions: &[S]) -> Self {
        Self::highest(versions).unwrap_or(Self::V1_1)
    }
}

/// Whether two published version lists share a version. An empty list on
/// either side is not a mismatch.
#[must_use]
pub fn protocol_versions_compatible<S: AsRef<str>, T: AsRef<str>>(local: &[S], remote: &[T]) -> bool {
    if local.is_empty() || remote.is_empty() {
        return true;
    }
    local
        .iter()
        .any(|l| remote.iter().any(|r| l.as_ref().trim() == r.as_ref().trim()))
}

// ============================================================================
// Status Codes
// ============================================================================

/// SAML 2.0 top-level status codes.
pub mod status_codes {
    /// Request succeeded.
    pub const SUCCESS: &str = "urn:oasis:names:tc:SAML:2.0:status:Success";

    /// Request could not be performed due to an error on the sender's part.
    pub const REQUESTER: &str = "urn:oasis:names:tc:SAML:2.0:status:Requester";

    /// Request could not be performed due to an error on the responder's part.
    pub const RESPONDER: &str = "urn:oasis:names:tc:SAML:2.0:status:Responder";
}

/// SAML 2.0 second-level status codes used by eIDAS nodes.
pub mod sub_status_codes {
    /// Authentication failed.
    pub const AUTHN_FAILED: &str = "urn:oasis:names:tc:SAML:2.0:status:AuthnFailed";

    /// Invalid attribute name or value.
    pub const INVALID_ATTR_NAME_OR_VALUE: &str =
        "urn:oasis:names:tc:SAML:2.0:status:InvalidAttrNameOrValue";

    /// Requested name ID policy not supported.
    pub const INVALID_NAMEID_POLICY: &str = "urn:oasis:names:tc:SAML:2.0:status:InvalidNameIDPolicy";

    /// Request denied.
    pub const REQUEST_DENIED: &str = "urn:oasis:names:tc:SAML:2.0:status:RequestDenied";
}
