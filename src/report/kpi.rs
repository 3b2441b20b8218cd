//! Allocation quality metrics (KPIs).
//!
//! Summarizes a finished allocation for dashboards and run comparison.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Slots | participants x configured periods |
//! | First-choice rate | `Pref_1` slots / assigned slots |
//! | Unsatisfied | Participants with preferences who received none of them |
//! | Fill rate | Enrolled seats / total capacity |
//! | Under minimum | Instances with enrollment below minimum |
//! | Demand | First-choice requests per activity |

use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{AssignmentMethod, Roster};

/// Allocation performance indicators.
#[derive(Debug, Clone, Serialize)]
pub struct AllocationKpi {
    /// Number of participants.
    pub participant_count: usize,
    /// Participant-period slots considered.
    pub total_slots: usize,
    /// Slots holding an activity.
    pub assigned_slots: usize,
    /// Slots left empty.
    pub unassigned_slots: usize,
    /// Participants assigned in every period.
    pub fully_assigned: usize,
    /// Slot count per method label (empty label excluded).
    pub method_counts: BTreeMap<String, usize>,
    /// Fraction of assigned slots satisfied at rank 1 (0.0..1.0).
    pub first_choice_rate: f64,
    /// Participants who listed preferences but received none of them.
    pub unsatisfied: usize,
    /// Mean number of listed preferences per participant.
    pub avg_preferences: f64,
    /// Seats across remaining instances.
    pub total_capacity: u32,
    /// Enrolled seats / total capacity (0.0..1.0).
    pub fill_rate: f64,
    /// Instances at capacity.
    pub full_instances: usize,
    /// Instances with no enrollment.
    pub empty_instances: usize,
    /// Instances below their minimum.
    pub under_minimum_instances: usize,
    /// First-choice requests per activity, across periods.
    pub demand: BTreeMap<String, usize>,
}

impl AllocationKpi {
    /// Computes KPIs from a roster and the configured period order.
    pub fn calculate(roster: &Roster, periods: &[String]) -> Self {
        let mut assigned_slots = 0;
        let mut fully_assigned = 0;
        let mut first_choice = 0;
        let mut unsatisfied = 0;
        let mut listed = 0;
        let mut method_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut demand: BTreeMap<String, usize> = BTreeMap::new();

        for participant in roster.participants() {
            let mut held = 0;
            let mut wanted = false;
            let mut satisfied = false;

            for period in periods {
                let method = participant.method(period);
                let prefs = participant.preferences_for(period);
                listed += prefs.len();
                if let Some(first) = prefs.first() {
                    *demand.entry(first.clone()).or_default() += 1;
                    wanted = true;
                }
                if !method.is_assigned() {
                    continue;
                }

                held += 1;
                *method_counts.entry(method.to_string()).or_default() += 1;
                if method == AssignmentMethod::Preference(1) {
                    first_choice += 1;
                }
                if method.preference_rank().is_some() {
                    satisfied = true;
                }
            }

            assigned_slots += held;
            if held == periods.len() {
                fully_assigned += 1;
            }
            if wanted && !satisfied {
                unsatisfied += 1;
            }
        }

        let participant_count = roster.participant_count();
        let total_slots = participant_count * periods.len();

        let mut total_capacity = 0;
        let mut total_enrolled = 0;
        let mut full_instances = 0;
        let mut empty_instances = 0;
        let mut under_minimum_instances = 0;
        for instance in roster.instances() {
            total_capacity += instance.capacity;
            total_enrolled += instance.enrolled_count();
            if instance.is_full() {
                full_instances += 1;
            }
            if instance.enrolled.is_empty() {
                empty_instances += 1;
            }
            if !instance.meets_minimum() {
                under_minimum_instances += 1;
            }
        }

        let first_choice_rate = if assigned_slots == 0 {
            0.0
        } else {
            first_choice as f64 / assigned_slots as f64
        };

        let avg_preferences = if participant_count == 0 {
            0.0
        } else {
            listed as f64 / participant_count as f64
        };

        let fill_rate = if total_capacity == 0 {
            0.0
        } else {
            f64::from(total_enrolled) / f64::from(total_capacity)
        };

        Self {
            participant_count,
            total_slots,
            assigned_slots,
            unassigned_slots: total_slots - assigned_slots,
            fully_assigned,
            method_counts,
            first_choice_rate,
            unsatisfied,
            avg_preferences,
            total_capacity,
            fill_rate,
            full_instances,
            empty_instances,
            under_minimum_instances,
            demand,
        }
    }

    /// Whether the allocation meets the given quality thresholds.
    pub fn meets_thresholds(&self, min_first_choice_rate: f64, max_unassigned: usize) -> bool {
        self.first_choice_rate >= min_first_choice_rate && self.unassigned_slots <= max_unassigned
    }
}
