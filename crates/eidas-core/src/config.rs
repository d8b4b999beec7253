//! Node configuration.
//!
//! A node is configured from a single TOML document. Every section has
//! defaults, so an empty file yields a Connector that trusts nothing and a
//! ProxyService that is not bound to any country.
//!
//! ```toml
//! [connector]
//! metadata_url = "https://connector.example.eu/metadata"
//!
//! [connector.services.ES]
//! metadata_url = "https://proxy.example.es/metadata"
//! skew_before_ms = -500
//! skew_after_ms = 500
//!
//! [trust]
//! trust_anchors = ["/etc/eidas/anchors/es.pem"]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Service provider category, as declared in the request or in metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpType {
    /// Public sector service provider.
    Public,
    /// Private sector service provider.
    Private,
}

impl SpType {
    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }

    /// Parses the wire value, ignoring case.
    #[must_use]
    pub fn from_str_opt(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("public") {
            Some(Self::Public)
        } else if value.eq_ignore_ascii_case("private") {
            Some(Self::Private)
        } else {
            None
        }
    }
}

/// Top level node configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Connector role settings.
    #[serde(default)]
    pub connector: ConnectorConfig,
    /// ProxyService role settings.
    #[serde(default)]
    pub proxy_service: ProxyServiceConfig,
    /// Certificate and algorithm policy.
    #[serde(default)]
    pub trust: TrustConfig,
    /// Correlation and anti-replay cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Connector role configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// This Connector's own metadata URL. Used as the issuer of outbound
    /// requests and of responses handed back to service providers.
    #[serde(default)]
    pub metadata_url: Option<String>,
    /// Protocol versions this Connector speaks.
    #[serde(default = "default_protocol_versions")]
    pub protocol_versions: Vec<String>,
    /// NameID formats accepted in addition to persistent, transient and
    /// unspecified.
    #[serde(default)]
    pub name_id_formats: Vec<String>,
    /// SP type asserted for every service provider behind this Connector.
    #[serde(default)]
    pub sp_type: Option<SpType>,
    /// Enforce the `CC/CC/value` shape on identifier attributes.
    #[serde(default = "default_true")]
    pub validate_prefix_country_code_identifiers: bool,
    /// Require the asserted country to match the requested country even when
    /// the ProxyService metadata does not declare a node country.
    #[serde(default)]
    pub check_citizen_certificate_service_certificate: bool,
    /// Per-country ProxyService settings, keyed by ISO 3166 alpha-2 code.
    #[serde(default)]
    pub services: BTreeMap<String, ServiceConfig>,
}

/// Settings for one remote ProxyService.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Metadata URL of the ProxyService.
    pub metadata_url: String,
    /// Clock skew applied to NotBefore checks, in milliseconds.
    #[serde(default)]
    pub skew_before_ms: i64,
    /// Clock skew applied to NotOnOrAfter checks, in milliseconds.
    #[serde(default)]
    pub skew_after_ms: i64,
}

/// ProxyService role configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyServiceConfig {
    /// Country served by this ProxyService.
    #[serde(default)]
    pub country_code: String,
    /// This ProxyService's own metadata URL.
    #[serde(default)]
    pub metadata_url: Option<String>,
    /// Expected destination for HTTP-POST requests.
    #[serde(default)]
    pub post_destination: Option<String>,
    /// Expected destination for HTTP-Redirect requests.
    #[serde(default)]
    pub redirect_destination: Option<String>,
    /// Levels of assurance published by this ProxyService.
    #[serde(default)]
    pub published_loas: Vec<String>,
    /// NameID formats published by this ProxyService.
    #[serde(default = "default_proxy_name_id_formats")]
    pub name_id_formats: Vec<String>,
    /// Protocol versions this ProxyService speaks.
    #[serde(default = "default_protocol_versions")]
    pub protocol_versions: Vec<String>,
    /// Reject requests whose protocol binding differs from the HTTP method.
    #[serde(default = "default_true")]
    pub validate_binding: bool,
    /// Require a requester id from private service providers.
    #[serde(default)]
    pub requester_id_required: bool,
    /// Attribute name URIs this ProxyService cannot deliver.
    #[serde(default)]
    pub unsupported_attributes: Vec<String>,
    /// Rewrite unique identifiers to `ORIGIN/DESTINATION/value`.
    #[serde(default)]
    pub prefix_identifiers_country_code: bool,
}

/// Certificate and algorithm policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustConfig {
    /// Reject certificates outside their validity period.
    #[serde(default = "default_true")]
    pub check_validity_period: bool,
    /// Reject self-signed signing certificates.
    #[serde(default = "default_true")]
    pub disallow_self_signed: bool,
    /// Accepted XML signature algorithm URIs.
    #[serde(default = "default_signature_whitelist")]
    pub signature_algorithm_whitelist: Vec<String>,
    /// Digest algorithm for generated signatures. Blank means SHA-512.
    #[serde(default)]
    pub digest_algorithm: Option<String>,
    /// Minimum RSA modulus length in bits.
    #[serde(default = "default_min_rsa_key_bits")]
    pub min_rsa_key_bits: u32,
    /// Minimum elliptic curve field size in bits.
    #[serde(default = "default_min_ec_key_bits")]
    pub min_ec_key_bits: u32,
    /// PEM files holding the trust anchors.
    #[serde(default)]
    pub trust_anchors: Vec<PathBuf>,
}

/// Cache lifetimes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of correlation entries in seconds.
    #[serde(default = "default_correlation_ttl")]
    pub correlation_ttl_secs: u64,
    /// Lifetime of anti-replay records in seconds.
    #[serde(default = "default_anti_replay_ttl")]
    pub anti_replay_ttl_secs: u64,
}

const fn default_true() -> bool {
    true
}

fn default_protocol_versions() -> Vec<String> {
    vec!["1.2".to_string(), "1.1".to_string()]
}

fn default_proxy_name_id_formats() -> Vec<String> {
    vec![
        "urn:oasis:names:tc:SAML:2.0:nameid-format:persistent".to_string(),
        "urn:oasis:names:tc:SAML:2.0:nameid-format:transient".to_string(),
        "urn:oasis:names:tc:SAML:1.1:nameid-format:unspecified".to_string(),
    ]
}

fn default_signature_whitelist() -> Vec<String> {
    [
        "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256",
        "http://www.w3.org/2001/04/xmldsig-more#rsa-sha384",
        "http://www.w3.org/2001/04/xmldsig-more#rsa-sha512",
        "http://www.w3.org/2007/05/xmldsig-more#sha256-rsa-MGF1",
        "http://www.w3.org/2007/05/xmldsig-more#sha384-rsa-MGF1",
        "http://www.w3.org/2007/05/xmldsig-more#sha512-rsa-MGF1",
        "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha256",
        "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha384",
        "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha512",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

const fn default_min_rsa_key_bits() -> u32 {
    2048
}

const fn default_min_ec_key_bits() -> u32 {
    256
}

const fn default_correlation_ttl() -> u64 {
    1800
}

const fn default_anti_replay_ttl() -> u64 {
    3600
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            metadata_url: None,
            protocol_versions: default_protocol_versions(),
            name_id_formats: Vec::new(),
            sp_type: None,
            validate_prefix_country_code_identifiers: true,
            check_citizen_certificate_service_certificate: false,
            services: BTreeMap::new(),
        }
    }
}

impl Default for ProxyServiceConfig {
    fn default() -> Self {
        Self {
            country_code: String::new(),
            metadata_url: None,
            post_destination: None,
            redirect_destination: None,
            published_loas: Vec::new(),
            name_id_formats: default_proxy_name_id_formats(),
            protocol_versions: default_protocol_versions(),
            validate_binding: true,
            requester_id_required: false,
            unsupported_attributes: Vec::new(),
            prefix_identifiers_country_code: false,
        }
    }
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            check_validity_period: true,
            disallow_self_signed: true,
            signature_algorithm_whitelist: default_signature_whitelist(),
            digest_algorithm: None,
            min_rsa_key_bits: default_min_rsa_key_bits(),
            min_ec_key_bits: default_min_ec_key_bits(),
            trust_anchors: Vec::new(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            correlation_ttl_secs: default_correlation_ttl(),
            anti_replay_ttl_secs: default_anti_replay_ttl(),
        }
    }
}

impl ConnectorConfig {
    /// Looks up the ProxyService settings for a country, ignoring case.
    #[must_use]
    pub fn service(&self, country_code: &str) -> Option<&ServiceConfig> {
        self.services.get(&country_code.to_ascii_uppercase())
    }
}

impl NodeConfig {
    /// Parses a TOML document and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error when the document is malformed or inconsistent.
    pub fn from_toml_str(document: &str) -> Result<Self> {
        let config: Self = toml::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read, parsed or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&document)?;
        tracing::debug!(path = %path.display(), services = config.connector.services.len(), "node configuration loaded");
        Ok(config)
    }

    /// Checks cross-field consistency.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first inconsistency found.
    pub fn validate(&self) -> Result<()> {
        for (country, service) in &self.connector.services {
            if !is_country_code(country) {
                return Err(Error::Config(format!(
                    "connector.services key '{country}' is not an upper-case ISO 3166 alpha-2 code"
                )));
            }
            if service.metadata_url.trim().is_empty() {
                return Err(Error::Config(format!(
                    "connector.services.{country}.metadata_url is blank"
                )));
            }
        }

        let proxy = &self.proxy_service;
        if proxy.metadata_url.is_some() && !is_country_code(&proxy.country_code) {
            return Err(Error::Config(format!(
                "proxy_service.country_code '{}' is not an ISO 3166 alpha-2 code",
                proxy.country_code
            )));
        }

        if self.trust.min_rsa_key_bits < 1024 {
            return Err(Error::Config(format!(
                "trust.min_rsa_key_bits {} is below 1024",
                self.trust.min_rsa_key_bits
            )));
        }
        if self.trust.signature_algorithm_whitelist.is_empty() {
            return Err(Error::Config(
                "trust.signature_algorithm_whitelist is empty".to_string(),
            ));
        }
        if self.cache.correlation_ttl_secs == 0 || self.cache.anti_replay_ttl_secs == 0 {
            return Err(Error::Config("cache TTLs must be positive".to_string()));
        }

        Ok(())
    }
}

fn is_country_code(value: &str) -> bool {
    value.len() == 2 && value.bytes().all(|b| b.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_yields_defaults() {
        let config = NodeConfig::from_toml_str("").unwrap();
        assert_eq!(config.connector.protocol_versions, vec!["1.2", "1.1"]);
        assert!(config.connector.validate_prefix_country_code_identifiers);
        assert!(config.trust.disallow_self_signed);
        assert_eq!(config.trust.min_rsa_key_bits, 2048);
        assert_eq!(config.proxy_service.name_id_formats.len(), 3);
    }

    #[test]
    fn services_are_looked_up_case_insensitively() {
        let config = NodeConfig::from_toml_str(
            r#"
            [connector]
            metadata_url = "https://connector.example.eu/metadata"
            sp_type = "private"

            [connector.services.ES]
            metadata_url = "https://proxy.example.es/metadata"
            skew_before_ms = -250
            "#,
        )
        .unwrap();

        let service = config.connector.service("es").unwrap();
        assert_eq!(service.metadata_url, "https://proxy.example.es/metadata");
        assert_eq!(service.skew_before_ms, -250);
        assert_eq!(service.skew_after_ms, 0);
        assert_eq!(config.connector.sp_type, Some(SpType::Private));
        assert!(config.connector.service("FR").is_none());
    }

    #[test]
    fn lower_case_service_key_is_rejected() {
        let err = NodeConfig::from_toml_str(
            r#"
            [connector.services.es]
            metadata_url = "https://proxy.example.es/metadata"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn proxy_with_metadata_requires_country() {
        let err = NodeConfig::from_toml_str(
            r#"
            [proxy_service]
            metadata_url = "https://proxy.example.es/metadata"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("country_code"));
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let err = NodeConfig::from_toml_str("[connector").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[cache]\ncorrelation_ttl_secs = 60").unwrap();

        let config = NodeConfig::load(file.path()).unwrap();
        assert_eq!(config.cache.correlation_ttl_secs, 60);
        assert_eq!(config.cache.anti_replay_ttl_secs, 3600);
    }

    #[test]
    fn sp_type_parsing_ignores_case() {
        assert_eq!(SpType::from_str_opt("PRIVATE"), Some(SpType::Private));
        assert_eq!(SpType::from_str_opt("public"), Some(SpType::Public));
        assert_eq!(SpType::from_str_opt("other"), None);
    }
}
