//! Weekly satisfaction scoring.
//!
//! A participant's weekly score is the sum over periods of the points for
//! the assignment method: rank 1..n map to `preference_points`, everything
//! else (random, forced, override, unassigned) scores 0. Scores are appended
//! to `score_history` and feed the priority ordering of the next run.
//!
//! Manual overrides are reconciled here: methods are re-derived from the
//! participant's preferences and the latest history entry is recomputed.

use std::collections::BTreeMap;
use tracing::debug;

use crate::config::AllocationConfig;
use crate::error::{AllocationError, AllocationResult};
use crate::models::{Assignment, AssignmentMethod, Participant, Roster};

/// Converts assignments into weekly scores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scorer {
    points: Vec<u32>,
}

impl Scorer {
    /// Creates a scorer with points for rank 1, 2, ...
    pub fn new(points: Vec<u32>) -> Self {
        Self { points }
    }

    /// Scorer using the configured preference points.
    pub fn from_config(config: &AllocationConfig) -> Self {
        Self::new(config.preference_points.clone())
    }

    /// Points earned by one assignment method.
    pub fn points_for(&self, method: AssignmentMethod) -> u32 {
        method
            .preference_rank()
            .and_then(|rank| self.points.get(rank - 1))
            .copied()
            .unwrap_or(0)
    }

    /// Weekly score of a participant over the given periods.
    pub fn weekly_score(&self, participant: &Participant, periods: &[String]) -> u32 {
        periods
            .iter()
            .map(|p| self.points_for(participant.method(p)))
            .sum()
    }

    /// Appends each participant's weekly score to their history.
    ///
    /// Also refreshes the missed-first-choice flag: set when some period
    /// with listed preferences did not end on rank 1. Returns the scores in
    /// roster order.
    pub fn record(&self, roster: &mut Roster, periods: &[String]) -> AllocationResult<Vec<u32>> {
        let mut scores = Vec::with_capacity(roster.participant_count());
        for idx in 0..roster.participant_count() {
            let participant = roster.participant(idx);
            let score = self.weekly_score(participant, periods);
            let missed = periods.iter().any(|p| {
                participant.has_preferences(p)
                    && participant.method(p) != AssignmentMethod::Preference(1)
            });

            roster.push_score(idx, score)?;
            roster.set_missed_first_choice(idx, missed)?;
            scores.push(score);
        }
        debug!(participants = scores.len(), "weekly scores recorded");
        Ok(scores)
    }

    /// Re-derives methods after outside edits and recomputes the latest score.
    ///
    /// For each period: an activity found in the participant's preferences
    /// becomes `Preference(rank)`; an unchanged random or forced fill keeps
    /// its method (compared against `before`); anything else is
    /// `ManualOverride`.
    ///
    /// # Errors
    /// `idx` is not a roster position.
    pub fn reconcile(
        &self,
        roster: &mut Roster,
        idx: usize,
        before: &BTreeMap<String, Assignment>,
        periods: &[String],
    ) -> AllocationResult<u32> {
        for period in periods {
            let participant = roster
                .get_participant(idx)
                .ok_or_else(|| AllocationError::UnknownParticipant(format!("#{idx}")))?;
            let Some(current) = participant.assignment(period) else {
                continue;
            };
            let method = match participant.preference_rank(period, &current.activity) {
                Some(rank) => AssignmentMethod::Preference(rank),
                None => match before.get(period) {
                    Some(prev) if prev.activity == current.activity && prev.method.is_system_fill() => {
                        prev.method
                    }
                    _ => AssignmentMethod::ManualOverride,
                },
            };
            roster.set_method(idx, period, method)?;
        }

        let score = self.weekly_score(roster.participant(idx), periods);
        roster.replace_latest_score(idx, score)?;
        Ok(score)
    }

    /// Applies an administrator edit and reconciles the participant.
    ///
    /// `activity = None` clears the period. Returns the recomputed score.
    ///
    /// # Errors
    /// Unknown participant, or an edit that breaks capacity or cross-period
    /// uniqueness (the previous assignment is kept).
    pub fn apply_override(
        &self,
        roster: &mut Roster,
        participant_id: &str,
        period: &str,
        activity: Option<&str>,
        periods: &[String],
    ) -> AllocationResult<u32> {
        let idx = roster
            .participant_index(participant_id)
            .ok_or_else(|| AllocationError::UnknownParticipant(participant_id.to_string()))?;
        let before = roster.participant(idx).assignments.clone();

        roster.override_assignment(participant_id, period, activity)?;
        self.reconcile(roster, idx, &before, periods)
    }
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(vec![5, 4, 3, 2, 1])
    }
}
