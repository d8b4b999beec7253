//! Configuration checking.

use std::path::Path;

use eidas_core::NodeConfig;
use eidas_protocol::trust::TrustValidator;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{output, success, OutputFormat};

/// A resolved configuration setting.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct SettingRow {
    /// Configuration section.
    pub section: &'static str,
    /// Setting name.
    pub setting: String,
    /// Effective value.
    pub value: String,
}

/// Loads a configuration file, checks it and prints the effective settings.
///
/// ## Errors
///
/// Returns an error when the file cannot be read, is inconsistent, or names
/// unreadable trust anchors.
pub fn run_check_config(path: &Path, format: OutputFormat) -> crate::CliResult<()> {
    let config = NodeConfig::load(path)?;
    let validator = TrustValidator::from_config(&config.trust)
        .map_err(|e| crate::CliError::Certificate(e.to_string()))?;
    let digest = validator
        .signing_digest_algorithm()
        .map_err(|e| crate::CliError::InvalidArgument(format!("trust.digest_algorithm: {e}")))?;

    tracing::debug!(path = %path.display(), anchors = validator.anchors().len(), "configuration checked");
    output(&settings(&config, validator.anchors().len(), digest), format)?;
    if format == OutputFormat::Table {
        success(&format!("{} is valid", path.display()));
    }
    Ok(())
}

fn settings(config: &NodeConfig, anchors: usize, digest: &str) -> Vec<SettingRow> {
    let row = |section, setting: &str, value: String| SettingRow {
        section,
        setting: setting.to_string(),
        value,
    };
    let or_unset = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

    let connector = &config.connector;
    let mut rows = vec![
        row("connector", "metadata_url", or_unset(&connector.metadata_url)),
        row("connector", "protocol_versions", connector.protocol_versions.join(", ")),
        row(
            "connector",
            "sp_type",
            connector.sp_type.map_or_else(|| "-".to_string(), |t| t.as_str().to_string()),
        ),
    ];
    rows.extend(connector.services.iter().map(|(country, service)| {
        row("connector", &format!("services.{country}"), service.metadata_url.clone())
    }));

    let proxy = &config.proxy_service;
    rows.extend([
        row("proxy_service", "country_code", proxy.country_code.clone()),
        row("proxy_service", "metadata_url", or_unset(&proxy.metadata_url)),
        row("proxy_service", "published_loas", proxy.published_loas.join(", ")),
        row("trust", "signature_algorithms", config.trust.signature_algorithm_whitelist.len().to_string()),
        row("trust", "digest_algorithm", digest.to_string()),
        row("trust", "anchors", anchors.to_string()),
        row("cache", "correlation_ttl_secs", config.cache.correlation_ttl_secs.to_string()),
        row("cache", "anti_replay_ttl_secs", config.cache.anti_replay_ttl_secs.to_string()),
    ]);
    rows
}
