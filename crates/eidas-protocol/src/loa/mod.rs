//! Levels of assurance.
//!
//! A level of assurance is either one of the three notified eIDAS levels,
//! which are totally ordered, or a non-notified URI that can only be compared
//! for equality.

mod reconciler;

pub use reconciler::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// URI prefix shared by the notified levels.
pub const NOTIFIED_LOA_PREFIX: &str = "http://eidas.europa.eu/LoA/";

/// The notified eIDAS levels, ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifiedLevel {
    /// `http://eidas.europa.eu/LoA/low`
    Low,
    /// `http://eidas.europa.eu/LoA/substantial`
    Substantial,
    /// `http://eidas.europa.eu/LoA/high`
    High,
}

impl NotifiedLevel {
    /// All levels, weakest first.
    pub const ALL: [Self; 3] = [Self::Low, Self::Substantial, Self::High];

    /// Level URI.
    #[must_use]
    pub const fn uri(self) -> &'static str {
        match self {
            Self::Low => "http://eidas.europa.eu/LoA/low",
            Self::Substantial => "http://eidas.europa.eu/LoA/substantial",
            Self::High => "http://eidas.europa.eu/LoA/high",
        }
    }

    /// Parses a level URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.uri() == uri)
    }

    /// Numeric rank, higher is stronger.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Substantial => 2,
            Self::High => 3,
        }
    }

    /// Levels strictly stronger than this one, weakest first.
    pub fn stronger(self) -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(move |level| *level > self)
    }
}

/// A level of assurance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LevelOfAssurance {
    /// One of the notified eIDAS levels.
    Notified(NotifiedLevel),
    /// Any other level URI.
    NonNotified(String),
}

impl LevelOfAssurance {
    /// Notified LOW.
    pub const LOW: Self = Self::Notified(NotifiedLevel::Low);
    /// Notified SUBSTANTIAL.
    pub const SUBSTANTIAL: Self = Self::Notified(NotifiedLevel::Substantial);
    /// Notified HIGH.
    pub const HIGH: Self = Self::Notified(NotifiedLevel::High);

    /// Classifies a level URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Self {
        let uri = uri.trim();
        NotifiedLevel::from_uri(uri).map_or_else(|| Self::NonNotified(uri.to_string()), Self::Notified)
    }

    /// Level URI.
    #[must_use]
    pub fn uri(&self) -> &str {
        match self {
            Self::Notified(level) => level.uri(),
            Self::NonNotified(uri) => uri,
        }
    }

    /// Whether this is a notified level.
    #[must_use]
    pub const fn is_notified(&self) -> bool {
        matches!(self, Self::Notified(_))
    }

    /// The notified level, if any.
    #[must_use]
    pub const fn notified(&self) -> Option<NotifiedLevel> {
        match self {
            Self::Notified(level) => Some(*level),
            Self::NonNotified(_) => None,
        }
    }
}

impl From<String> for LevelOfAssurance {
    fn from(uri: String) -> Self {
        Self::from_uri(&uri)
    }
}

impl From<&str> for LevelOfAssurance {
    fn from(uri: &str) -> Self {
        Self::from_uri(uri)
    }
}

impl From<LevelOfAssurance> for String {
    fn from(loa: LevelOfAssurance) -> Self {
        match loa {
            LevelOfAssurance::Notified(level) => level.uri().to_string(),
            LevelOfAssurance::NonNotified(uri) => uri,
        }
    }
}

impl fmt::Display for LevelOfAssurance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uri())
    }
}

/// Comparison operator attached to requested levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoaComparison {
    /// Any level at least as strong as the weakest requested one.
    #[default]
    Minimum,
    /// One of the requested levels exactly.
    Exact,
}

impl LoaComparison {
    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minimum => "minimum",
            Self::Exact => "exact",
        }
    }
}

/// Requested levels of assurance: an ordered list plus its comparison.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LevelsOfAssurance {
    /// Comparison operator.
    pub comparison: LoaComparison,
    /// Levels in request order.
    pub levels: Vec<LevelOfAssurance>,
}

impl LevelsOfAssurance {
    /// Creates a list with the comparison chosen from its content.
    #[must_use]
    pub fn new(levels: Vec<LevelOfAssurance>) -> Self {
        Self {
            comparison: choose_comparison_operator(&levels),
            levels,
        }
    }

    /// Creates a list from level URIs.
    #[must_use]
    pub fn from_uris<S: AsRef<str>>(uris: &[S]) -> Self {
        Self::new(uris.iter().map(|u| LevelOfAssurance::from_uri(u.as_ref())).collect())
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Whether `loa` appears literally in the list.
    #[must_use]
    pub fn contains(&self, loa: &LevelOfAssurance) -> bool {
        self.levels.contains(loa)
    }

    /// Weakest notified level in the list.
    #[must_use]
    pub fn minimum_notified(&self) -> Option<NotifiedLevel> {
        self.levels.iter().filter_map(LevelOfAssurance::notified).min()
    }
}
