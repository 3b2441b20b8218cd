//! Assignment method model.
//!
//! Records *how* a participant came to hold an activity in a period.
//! The method doubles as scoring input: only preference-ranked
//! assignments earn satisfaction points.
//!
//! # Labels
//!
//! | Variant | Label |
//! |---------|-------|
//! | `Unassigned` | `""` |
//! | `Preference(r)` | `Pref_r` |
//! | `Random` | `Random` |
//! | `ForcedMinimum` | `Forced_minimum` |
//! | `ManualOverride` | `Manual_Override` |
//!
//! Labels are derived from the variant; serialized tables carry the label.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseMethodError;

/// How an assignment was made.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum AssignmentMethod {
    /// No activity held for the period.
    #[default]
    Unassigned,
    /// Satisfied at the given 1-based preference rank.
    Preference(usize),
    /// Unranked backfill from the open-seat pool.
    Random,
    /// Added solely to satisfy an activity minimum.
    ForcedMinimum,
    /// Set outside the engine by an administrator.
    ManualOverride,
}

impl AssignmentMethod {
    /// Whether this method denotes a held activity.
    pub fn is_assigned(&self) -> bool {
        !matches!(self, Self::Unassigned)
    }

    /// The preference rank, if this is a preference assignment.
    pub fn preference_rank(&self) -> Option<usize> {
        match self {
            Self::Preference(rank) => Some(*rank),
            _ => None,
        }
    }

    /// Whether the engine filled this slot without a matching preference.
    pub fn is_system_fill(&self) -> bool {
        matches!(self, Self::Random | Self::ForcedMinimum)
    }

    /// Sort key for reporting: preferences by rank, then fills, overrides, empty.
    pub fn ordinal(&self) -> usize {
        match self {
            Self::Preference(rank) => *rank,
            Self::Random => usize::MAX - 3,
            Self::ForcedMinimum => usize::MAX - 2,
            Self::ManualOverride => usize::MAX - 1,
            Self::Unassigned => usize::MAX,
        }
    }
}

impl fmt::Display for AssignmentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unassigned => Ok(()),
            Self::Preference(rank) => write!(f, "Pref_{rank}"),
            Self::Random => f.write_str("Random"),
            Self::ForcedMinimum => f.write_str("Forced_minimum"),
            Self::ManualOverride => f.write_str("Manual_Override"),
        }
    }
}

impl FromStr for AssignmentMethod {
    type Err = ParseMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        match label {
            "" => Ok(Self::Unassigned),
            "Random" => Ok(Self::Random),
            "Forced_minimum" => Ok(Self::ForcedMinimum),
            "Manual_Override" => Ok(Self::ManualOverride),
            _ => label
                .strip_prefix("Pref_")
                .and_then(|rank| rank.parse::<usize>().ok())
                .filter(|&rank| rank > 0)
                .map(Self::Preference)
                .ok_or_else(|| ParseMethodError(label.to_string())),
        }
    }
}

impl From<AssignmentMethod> for String {
    fn from(method: AssignmentMethod) -> Self {
        method.to_string()
    }
}

impl TryFrom<String> for AssignmentMethod {
    type Error = ParseMethodError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
