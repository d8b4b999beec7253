//! Command implementations.

pub mod attributes;
pub mod cert;
pub mod config;
pub mod loa;

pub use attributes::run_attributes;
pub use cert::run_inspect_cert;
pub use config::run_check_config;
pub use loa::run_loa;

use serde::Serialize;
use tabled::Tabled;

/// Outcome of one named check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct CheckRow {
    /// Check name.
    pub check: String,
    /// Whether the check passed.
    pub passed: bool,
    /// Failure reason or observed value.
    pub detail: String,
}

impl CheckRow {
    /// Builds a row from a check result.
    pub fn from_result<E: std::fmt::Display>(check: &str, result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self {
                check: check.to_string(),
                passed: true,
                detail: String::new(),
            },
            Err(e) => Self {
                check: check.to_string(),
                passed: false,
                detail: e.to_string(),
            },
        }
    }
}

/// Fails with the number of failed rows, if any.
pub fn require_all_passed(rows: &[CheckRow]) -> crate::CliResult<()> {
    match rows.iter().filter(|row| !row.passed).count() {
        0 => Ok(()),
        failed => Err(crate::CliError::ChecksFailed(failed)),
    }
}
