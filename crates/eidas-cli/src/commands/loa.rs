//! Level of assurance rule evaluation.

use eidas_protocol::attribute::AttributeCatalog;
use eidas_protocol::loa::{
    adapt_for_legacy_target, choose_comparison_operator, extrapolate_for_exact_comparison,
    published_serves_any_requested, request_satisfies_published, response_satisfies_published,
    response_satisfies_request, LevelOfAssurance, LevelsOfAssurance, NotifiedLevel, NOTIFIED_LOA_PREFIX,
};
use eidas_protocol::types::{AuthenticationRequest, ProtocolVersion};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::LoaCommand;
use crate::output::{info, output, OutputFormat};

/// One evaluated rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct RuleRow {
    /// Rule name.
    pub rule: &'static str,
    /// Whether it holds.
    pub holds: bool,
}

/// One level of a wire list.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct LevelRow {
    /// Position in the list.
    pub position: usize,
    /// Level URI.
    pub level: String,
}

/// Runs a level of assurance command.
///
/// ## Errors
///
/// Returns an error for an unknown protocol version, or when no notified
/// level is left for a legacy target.
pub fn run_loa(cmd: LoaCommand, format: OutputFormat) -> crate::CliResult<()> {
    match cmd {
        LoaCommand::Check {
            requested,
            published,
            asserted,
            protocol_version,
        } => {
            let version = ProtocolVersion::parse(&protocol_version).ok_or_else(|| {
                crate::CliError::InvalidArgument(format!("unknown protocol version {protocol_version}"))
            })?;
            let requested = parse_levels(&requested);
            let published = parse_levels(&published);
            let asserted = asserted.as_deref().map(parse_level);

            if format == OutputFormat::Table {
                info(&format!("comparison: {}", choose_comparison_operator(&requested).as_str()));
            }
            output(&evaluate(&requested, &published, asserted.as_ref(), version), format)
        }
        LoaCommand::Wire {
            levels,
            target_versions,
        } => {
            let wire = wire_levels(parse_levels(&levels), &target_versions)?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&wire)?);
                    Ok(())
                }
                OutputFormat::Table => {
                    info(&format!("comparison: {}", wire.comparison.as_str()));
                    let rows: Vec<LevelRow> = wire
                        .levels
                        .iter()
                        .enumerate()
                        .map(|(i, level)| LevelRow {
                            position: i + 1,
                            level: level.uri().to_string(),
                        })
                        .collect();
                    output(&rows, format)
                }
            }
        }
    }
}

/// Parses a level URI or one of the shorthands `low`, `substantial` and
/// `high`.
fn parse_level(value: &str) -> LevelOfAssurance {
    let value = value.trim();
    NotifiedLevel::ALL
        .into_iter()
        .find(|level| {
            level
                .uri()
                .strip_prefix(NOTIFIED_LOA_PREFIX)
                .is_some_and(|name| name.eq_ignore_ascii_case(value))
        })
        .map_or_else(|| LevelOfAssurance::from_uri(value), LevelOfAssurance::Notified)
}

fn parse_levels(values: &[String]) -> Vec<LevelOfAssurance> {
    values.iter().map(|v| parse_level(v)).collect()
}

fn evaluate(
    requested: &[LevelOfAssurance],
    published: &[LevelOfAssurance],
    asserted: Option<&LevelOfAssurance>,
    version: ProtocolVersion,
) -> Vec<RuleRow> {
    let mut rows = Vec::new();
    if !published.is_empty() {
        rows.push(RuleRow {
            rule: "request served by published",
            holds: request_satisfies_published(requested, published, version),
        });
        rows.push(RuleRow {
            rule: "any requested level published",
            holds: published_serves_any_requested(requested, published),
        });
    }
    if let Some(asserted) = asserted {
        rows.push(RuleRow {
            rule: "response satisfies request",
            holds: response_satisfies_request(requested, asserted),
        });
        if !published.is_empty() {
            rows.push(RuleRow {
                rule: "response is published",
                holds: response_satisfies_published(asserted, published, version),
            });
        }
    }
    rows
}

/// Levels a Connector sends for `levels` to a target publishing
/// `target_versions`.
fn wire_levels(
    levels: Vec<LevelOfAssurance>,
    target_versions: &[String],
) -> crate::CliResult<LevelsOfAssurance> {
    let probe = AuthenticationRequest::new("_probe", "eidas-cli", "EU", AttributeCatalog::empty())
        .with_levels_of_assurance(LevelsOfAssurance::new(levels));
    let adapted = adapt_for_legacy_target(probe, target_versions)
        .map_err(|e| crate::CliError::InvalidArgument(e.to_string()))?;
    Ok(extrapolate_for_exact_comparison(&adapted.levels_of_assurance.levels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use eidas_protocol::loa::LoaComparison;

    #[test]
    fn shorthands_and_uris() {
        assert_eq!(parse_level("High"), LevelOfAssurance::HIGH);
        assert_eq!(parse_level(NotifiedLevel::Low.uri()), LevelOfAssurance::LOW);
        assert!(!parse_level("urn:example:loa:gold").is_notified());
    }

    #[test]
    fn stronger_assertion_satisfies_minimum_request() {
        let rows = evaluate(
            &[LevelOfAssurance::SUBSTANTIAL],
            &[LevelOfAssurance::HIGH],
            Some(&LevelOfAssurance::HIGH),
            ProtocolVersion::parse("1.2").unwrap(),
        );
        assert!(rows.iter().all(|row| row.holds), "{rows:?}");
    }

    #[test]
    fn legacy_target_drops_non_notified_levels() {
        let levels = vec![parse_level("urn:example:loa:gold"), LevelOfAssurance::LOW];

        let modern = wire_levels(levels.clone(), &["1.2".to_string()]).unwrap();
        assert_eq!(modern.comparison, LoaComparison::Exact);
        assert_eq!(modern.levels.len(), 4);

        let legacy = wire_levels(levels, &["1.1".to_string()]).unwrap();
        assert_eq!(legacy.comparison, LoaComparison::Minimum);
        assert_eq!(legacy.levels, vec![LevelOfAssurance::LOW]);
    }

    #[test]
    fn legacy_target_without_notified_level_is_an_error() {
        let levels = vec![parse_level("urn:example:loa:gold")];
        assert!(wire_levels(levels, &[]).is_err());
    }
}
