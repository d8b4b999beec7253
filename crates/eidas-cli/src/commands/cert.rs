//! Signer certificate inspection.

use chrono::{DateTime, Utc};
use eidas_core::NodeConfig;
use eidas_protocol::trust::{
    check_certificate_country, check_certificate_signature_hash, check_key_length,
    check_not_self_signed, check_trust_anchor, check_validity_period, Certificate, TrustAnchorSet,
    TrustPolicy, TrustValidator,
};

use super::{require_all_passed, CheckRow};
use crate::cli::InspectCertArgs;
use crate::output::{info, output, warning, OutputFormat};

/// Runs the certificate checks against the first certificate of a PEM file.
///
/// Without `--config` the default policy applies and no anchor is trusted,
/// so the anchor check fails.
///
/// ## Errors
///
/// Returns an error when the file holds no certificate or any check fails.
pub fn run_inspect_cert(args: &InspectCertArgs, format: OutputFormat) -> crate::CliResult<()> {
    let pem = std::fs::read(&args.pem)?;
    let chain =
        Certificate::from_pem(&pem).map_err(|e| crate::CliError::Certificate(e.to_string()))?;
    let Some(leaf) = chain.first() else {
        return Err(crate::CliError::Certificate(format!(
            "{} holds no certificate",
            args.pem.display()
        )));
    };

    let validator = match &args.config {
        Some(path) => TrustValidator::from_config(&NodeConfig::load(path)?.trust)
            .map_err(|e| crate::CliError::Certificate(e.to_string()))?,
        None => {
            warning("no configuration given, no trust anchor is loaded");
            TrustValidator::new(TrustPolicy::default(), TrustAnchorSet::default())
        }
    };

    if format == OutputFormat::Table {
        info(&format!("subject:     {}", leaf.subject()));
        info(&format!("issuer:      {}", leaf.issuer()));
        info(&format!("valid:       {} .. {}", leaf.not_before(), leaf.not_after()));
        info(&format!("fingerprint: {}", leaf.fingerprint()));
    }

    let rows = inspect(&chain, &validator, args.country.as_deref(), Utc::now());
    output(&rows, format)?;
    require_all_passed(&rows)
}

/// Runs every check independently so that all failures are reported.
fn inspect(
    chain: &[Certificate],
    validator: &TrustValidator,
    country: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<CheckRow> {
    let Some(leaf) = chain.first() else {
        return Vec::new();
    };
    let policy = validator.policy();

    let mut rows = vec![
        CheckRow::from_result(
            "validity period",
            check_validity_period(leaf, policy.check_validity_period, now),
        ),
        CheckRow::from_result(
            "not self-signed",
            check_not_self_signed(leaf, policy.disallow_self_signed),
        ),
        CheckRow::from_result("signature hash", check_certificate_signature_hash(leaf)),
        CheckRow::from_result("key length", check_key_length(leaf, &policy.key_length)),
        CheckRow::from_result("trust anchor", check_trust_anchor(chain, validator.anchors())),
    ];
    if let Some(country) = country {
        rows.push(CheckRow::from_result(
            "country",
            check_certificate_country(leaf, country),
        ));
    }
    rows
}
