//! Participant (camper) model.
//!
//! A participant submits ranked activity preferences per period, holds at
//! most one assignment per period, and carries a score history that feeds
//! the fairness ordering of later runs.
//!
//! # Invariants
//! - At most one assignment per period (enforced by the map shape).
//! - The same activity never appears as the assignment of two periods.
//!   `Roster` checks this on every mutation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::AssignmentMethod;

/// An activity held by a participant in one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Assigned activity identifier.
    pub activity: String,
    /// How the assignment was made.
    pub method: AssignmentMethod,
}

impl Assignment {
    /// Creates a new assignment.
    pub fn new(activity: impl Into<String>, method: AssignmentMethod) -> Self {
        Self {
            activity: activity.into(),
            method,
        }
    }
}

/// A participant to be allocated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// Unique participant identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Ranked preferences per period (period → activities, rank 1 first).
    pub preferences: BTreeMap<String, Vec<String>>,
    /// Current assignments (period → assignment). Absent = unassigned.
    pub assignments: BTreeMap<String, Assignment>,
    /// Weekly satisfaction scores, oldest first.
    pub score_history: Vec<u32>,
    /// Did not receive a first choice last week.
    pub missed_first_choice: bool,
}

impl Participant {
    /// Creates a participant with no preferences.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            preferences: BTreeMap::new(),
            assignments: BTreeMap::new(),
            score_history: Vec::new(),
            missed_first_choice: false,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets ranked preferences for a period.
    ///
    /// Blank entries are dropped and duplicates removed; first occurrence
    /// keeps its rank.
    pub fn with_preferences<I, S>(mut self, period: impl Into<String>, activities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ranked: Vec<String> = Vec::new();
        for activity in activities {
            let activity = activity.into().trim().to_string();
            if !activity.is_empty() && !ranked.contains(&activity) {
                ranked.push(activity);
            }
        }
        self.preferences.insert(period.into(), ranked);
        self
    }

    /// Seeds the score history with a prior score.
    pub fn with_prior_score(mut self, score: u32) -> Self {
        self.score_history.push(score);
        self
    }

    /// Sets the full score history (oldest first).
    pub fn with_score_history(mut self, history: Vec<u32>) -> Self {
        self.score_history = history;
        self
    }

    /// Flags the participant as having missed a first choice last week.
    pub fn with_missed_first_choice(mut self, missed: bool) -> Self {
        self.missed_first_choice = missed;
        self
    }

    /// Ranked preferences for a period (empty if none listed).
    pub fn preferences_for(&self, period: &str) -> &[String] {
        self.preferences
            .get(period)
            .map(|p| p.as_slice())
            .unwrap_or(&[])
    }

    /// Whether the participant listed any preference for the period.
    pub fn has_preferences(&self, period: &str) -> bool {
        !self.preferences_for(period).is_empty()
    }

    /// The 1-based rank of `activity` in the period's preferences.
    pub fn preference_rank(&self, period: &str, activity: &str) -> Option<usize> {
        self.preferences_for(period)
            .iter()
            .position(|a| a == activity)
            .map(|idx| idx + 1)
    }

    /// The activity ranked `rank` (1-based) for the period.
    pub fn preference_at(&self, period: &str, rank: usize) -> Option<&str> {
        rank.checked_sub(1)
            .and_then(|idx| self.preferences_for(period).get(idx))
            .map(|a| a.as_str())
    }

    /// Longest preference list across periods.
    pub fn max_preference_len(&self) -> usize {
        self.preferences.values().map(Vec::len).max().unwrap_or(0)
    }

    /// The assignment held in a period.
    pub fn assignment(&self, period: &str) -> Option<&Assignment> {
        self.assignments.get(period)
    }

    /// Whether the participant holds an activity in the period.
    pub fn is_assigned(&self, period: &str) -> bool {
        self.assignments.contains_key(period)
    }

    /// Assignment method for a period (`Unassigned` when empty).
    pub fn method(&self, period: &str) -> AssignmentMethod {
        self.assignment(period)
            .map(|a| a.method)
            .unwrap_or(AssignmentMethod::Unassigned)
    }

    /// Whether the activity is held in any period.
    pub fn holds(&self, activity: &str) -> bool {
        self.assignments.values().any(|a| a.activity == activity)
    }

    /// Whether the activity is held in a period other than `period`.
    pub fn holds_elsewhere(&self, activity: &str, period: &str) -> bool {
        self.assignments
            .iter()
            .any(|(p, a)| p != period && a.activity == activity)
    }

    /// Sum of all weekly scores.
    pub fn cumulative_score(&self) -> u64 {
        self.score_history.iter().map(|&s| u64::from(s)).sum()
    }

    /// Most recent weekly score.
    pub fn latest_score(&self) -> Option<u32> {
        self.score_history.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_builder() {
        let p = Participant::new("C1")
            .with_name("Dana")
            .with_preferences("Aleph", ["Art", "Swim"])
            .with_prior_score(7)
            .with_missed_first_choice(true);

        assert_eq!(p.id, "C1");
        assert_eq!(p.name, "Dana");
        assert_eq!(p.preferences_for("Aleph"), ["Art", "Swim"]);
        assert_eq!(p.score_history, vec![7]);
        assert!(p.missed_first_choice);
    }

    #[test]
    fn test_preferences_deduplicated() {
        let p = Participant::new("C1").with_preferences("Aleph", ["Art", " ", "Swim", "Art", "Drama"]);
        assert_eq!(p.preferences_for("Aleph"), ["Art", "Swim", "Drama"]);
        assert_eq!(p.preference_rank("Aleph", "Drama"), Some(3));
        assert_eq!(p.preference_rank("Aleph", "Chess"), None);
        assert_eq!(p.preference_at("Aleph", 2), Some("Swim"));
        assert_eq!(p.preference_at("Aleph", 0), None);
        assert_eq!(p.preference_at("Beth", 1), None);
    }

    #[test]
    fn test_holds_elsewhere() {
        let mut p = Participant::new("C1");
        p.assignments.insert(
            "Aleph".into(),
            Assignment::new("Art", AssignmentMethod::Preference(1)),
        );

        assert!(p.holds("Art"));
        assert!(p.holds_elsewhere("Art", "Beth"));
        assert!(!p.holds_elsewhere("Art", "Aleph"));
        assert!(p.is_assigned("Aleph"));
        assert_eq!(p.method("Aleph"), AssignmentMethod::Preference(1));
        assert_eq!(p.method("Beth"), AssignmentMethod::Unassigned);
    }

    #[test]
    fn test_scores() {
        let p = Participant::new("C1").with_score_history(vec![3, 9, 4]);
        assert_eq!(p.cumulative_score(), 16);
        assert_eq!(p.latest_score(), Some(4));
        assert_eq!(Participant::new("C2").cumulative_score(), 0);
        assert_eq!(Participant::new("C2").latest_score(), None);
    }

    #[test]
    fn test_max_preference_len() {
        let p = Participant::new("C1")
            .with_preferences("Aleph", ["A", "B", "C"])
            .with_preferences("Beth", ["A"]);
        assert_eq!(p.max_preference_len(), 3);
        assert!(!p.has_preferences("Gimmel"));
    }
}
