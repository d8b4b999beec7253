//! Reconciliation of requested, published and asserted levels of assurance.
//!
//! The legacy protocol generation (1.1) knows only notified levels and has no
//! NameID negotiation, while 1.2 adds non-notified levels that can only be
//! matched exactly. The functions here absorb that difference. All of them
//! are pure.

use thiserror::Error;

use super::{LevelOfAssurance, LevelsOfAssurance, LoaComparison, NotifiedLevel};
use crate::types::{AuthenticationRequest, NameIdFormat, ProtocolVersion};

/// Level of assurance reconciliation failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoaError {
    /// The requested levels cannot be honoured.
    #[error("invalid level of assurance: {0}")]
    InvalidLoa(String),
}

/// Rewrites a request for a target whose highest protocol version is the
/// legacy generation.
///
/// Non-notified levels are dropped and a missing NameID format defaults to
/// unspecified. Targets that publish no version are treated as legacy.
/// Idempotent.
///
/// ## Errors
///
/// Returns [`LoaError::InvalidLoa`] when no notified level remains.
pub fn adapt_for_legacy_target<S: AsRef<str>>(
    request: AuthenticationRequest,
    target_protocol_versions: &[S],
) -> Result<AuthenticationRequest, LoaError> {
    if !ProtocolVersion::highest_or_legacy(target_protocol_versions).is_legacy() {
        return Ok(request);
    }

    let notified: Vec<LevelOfAssurance> = request
        .levels_of_assurance
        .levels
        .iter()
        .filter(|loa| loa.is_notified())
        .cloned()
        .collect();

    if notified.is_empty() {
        return Err(LoaError::InvalidLoa(format!(
            "request {} carries no notified level for a legacy target",
            request.id
        )));
    }

    let name_id_format = request
        .name_id_format
        .clone()
        .unwrap_or_else(|| NameIdFormat::Unspecified.uri().to_string());

    Ok(request
        .with_levels_of_assurance(LevelsOfAssurance::new(notified))
        .with_name_id_format(Some(name_id_format)))
}

/// EXACT when any level is non-notified, MINIMUM otherwise.
#[must_use]
pub fn choose_comparison_operator(loas: &[LevelOfAssurance]) -> LoaComparison {
    if loas.iter().any(|loa| !loa.is_notified()) {
        LoaComparison::Exact
    } else {
        LoaComparison::Minimum
    }
}

/// Builds the wire list for a request.
///
/// Under EXACT comparison every notified level below HIGH is followed by the
/// notified levels above it, so that a counter-party may still assert a
/// stronger notified level: `[SUBSTANTIAL, X]` becomes
/// `[SUBSTANTIAL, HIGH, X]`. Lists that compare with MINIMUM are returned
/// unchanged.
#[must_use]
pub fn extrapolate_for_exact_comparison(loas: &[LevelOfAssurance]) -> LevelsOfAssurance {
    let comparison = choose_comparison_operator(loas);
    if comparison == LoaComparison::Minimum {
        return LevelsOfAssurance {
            comparison,
            levels: loas.to_vec(),
        };
    }

    let mut levels: Vec<LevelOfAssurance> = Vec::with_capacity(loas.len() + 2);
    for loa in loas {
        push_unique(&mut levels, loa.clone());
        if let Some(level) = loa.notified() {
            for stronger in level.stronger() {
                push_unique(&mut levels, LevelOfAssurance::Notified(stronger));
            }
        }
    }

    LevelsOfAssurance { comparison, levels }
}

fn push_unique(levels: &mut Vec<LevelOfAssurance>, loa: LevelOfAssurance) {
    if !levels.contains(&loa) {
        levels.push(loa);
    }
}

/// Whether an asserted level satisfies the requested ones.
///
/// True when the asserted level is literally requested, or when every
/// requested level is notified and the asserted level ranks at least as high
/// as the weakest of them.
#[must_use]
pub fn response_satisfies_request(
    request_loas: &[LevelOfAssurance],
    response_loa: &LevelOfAssurance,
) -> bool {
    if request_loas.contains(response_loa) {
        return true;
    }
    if !request_loas.iter().all(LevelOfAssurance::is_notified) {
        return false;
    }
    let (Some(asserted), Some(weakest)) = (
        response_loa.notified(),
        request_loas.iter().filter_map(LevelOfAssurance::notified).min(),
    ) else {
        return false;
    };
    asserted.rank() >= weakest.rank()
}

/// Whether an asserted level is one the ProxyService published.
///
/// Under the legacy protocol a notified level stronger than every published
/// notified level is also accepted. With no notified level published that
/// exception never applies.
#[must_use]
pub fn response_satisfies_published(
    response_loa: &LevelOfAssurance,
    published_loas: &[LevelOfAssurance],
    protocol_version: ProtocolVersion,
) -> bool {
    if published_loas.contains(response_loa) {
        return true;
    }
    if !protocol_version.is_legacy() {
        return false;
    }
    match (response_loa.notified(), highest_notified(published_loas)) {
        (Some(asserted), Some(highest)) => asserted > highest,
        _ => false,
    }
}

/// Whether requested levels can be served by the published ones.
///
/// Every requested notified level must be at most some published notified
/// level, and every non-notified level must be published verbatim. Under the
/// legacy protocol the first requested level must also equal the single
/// highest published notified level. An empty request is always satisfied.
#[must_use]
pub fn request_satisfies_published(
    request_loas: &[LevelOfAssurance],
    published_loas: &[LevelOfAssurance],
    protocol_version: ProtocolVersion,
) -> bool {
    let Some(first) = request_loas.first() else {
        return true;
    };

    let each_served = request_loas.iter().all(|requested| match requested.notified() {
        Some(level) => published_loas
            .iter()
            .filter_map(LevelOfAssurance::notified)
            .any(|published| published >= level),
        None => published_loas.contains(requested),
    });
    if !each_served {
        return false;
    }

    if protocol_version.is_legacy() {
        return highest_notified(published_loas)
            .is_some_and(|highest| first.notified() == Some(highest));
    }

    true
}

/// Whether a ProxyService can serve at least one requested level.
///
/// A requested notified level is served by itself or by any stronger
/// published notified level; a non-notified level only by itself. An empty
/// request is never served.
#[must_use]
pub fn published_serves_any_requested(
    request_loas: &[LevelOfAssurance],
    published_loas: &[LevelOfAssurance],
) -> bool {
    request_loas.iter().any(|requested| {
        published_loas.contains(requested)
            || requested.notified().is_some_and(|level| {
                level
                    .stronger()
                    .any(|stronger| published_loas.contains(&LevelOfAssurance::Notified(stronger)))
            })
    })
}

fn highest_notified(loas: &[LevelOfAssurance]) -> Option<NotifiedLevel> {
    loas.iter().filter_map(LevelOfAssurance::notified).max()
}
