//! Unassigned-participant diagnosis.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{ActivityInstance, Roster};

/// Why a participant holds nothing in a period.
///
/// Checks run in declaration order; the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnassignedReason {
    /// The period has no instances.
    NoActivitiesOffered,
    /// Every instance in the period is at capacity.
    AllActivitiesFull,
    /// Every open instance is an activity the participant holds in another period.
    OnlyRepeatsAvailable,
    /// The participant listed nothing for the period.
    NoPreferencesListed,
    /// None of the listed activities can be taken.
    PreferencesNotAvailable,
    /// No known cause. Indicates a logic defect.
    Unknown,
}

impl fmt::Display for UnassignedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoActivitiesOffered => "no activities offered",
            Self::AllActivitiesFull => "all activities full",
            Self::OnlyRepeatsAvailable => "no activity available without repeating across periods",
            Self::NoPreferencesListed => "no preferences listed",
            Self::PreferencesNotAvailable => "preferences not available",
            Self::Unknown => "unknown reason",
        };
        f.write_str(text)
    }
}

/// Explains why participant `idx` is unassigned in `period`.
pub fn diagnose(roster: &Roster, idx: usize, period: &str) -> UnassignedReason {
    let offered: Vec<&ActivityInstance> = roster.instances_in(period).collect();
    if offered.is_empty() {
        return UnassignedReason::NoActivitiesOffered;
    }

    let open: Vec<&ActivityInstance> = offered.into_iter().filter(|i| !i.is_full()).collect();
    if open.is_empty() {
        return UnassignedReason::AllActivitiesFull;
    }

    let participant = roster.participant(idx);
    if open
        .iter()
        .all(|i| participant.holds_elsewhere(&i.activity, period))
    {
        return UnassignedReason::OnlyRepeatsAvailable;
    }

    if !participant.has_preferences(period) {
        return UnassignedReason::NoPreferencesListed;
    }

    let takeable = participant
        .preferences_for(period)
        .iter()
        .any(|a| roster.has_room(period, a) && !participant.holds_elsewhere(a, period));
    if !takeable {
        return UnassignedReason::PreferencesNotAvailable;
    }

    UnassignedReason::Unknown
}
