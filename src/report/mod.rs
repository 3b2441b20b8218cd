//! Allocation output tables.
//!
//! Plain serializable rows for the three outputs consumed downstream:
//! the assignment table, the unassigned table, and capacity utilization.
//! Rows are ordered deterministically (roster order, then configured
//! period order; instances by period then activity), so a fixed seed
//! reproduces byte-identical serialized tables.

mod kpi;

pub use kpi::AllocationKpi;

use serde::Serialize;

use crate::allocator::{diagnose, UnassignedReason};
use crate::models::{AssignmentMethod, Roster};

/// One period cell of the assignment table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodAssignment {
    pub period: String,
    /// Assigned activity, empty when unassigned.
    pub activity: String,
    pub method: AssignmentMethod,
}

/// One participant's row of the assignment table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentRow {
    pub participant: String,
    pub name: String,
    /// Cells in configured period order.
    pub periods: Vec<PeriodAssignment>,
    /// Most recent weekly score (0 when no history).
    pub latest_score: u32,
    pub cumulative_score: u64,
}

/// A participant left empty in a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnassignedRow {
    pub participant: String,
    pub period: String,
    pub reason: UnassignedReason,
}

/// Enrollment state of one activity instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityRow {
    pub period: String,
    pub activity: String,
    pub enrolled: u32,
    pub capacity: u32,
    pub minimum: u32,
    pub remaining: u32,
    pub meets_minimum: bool,
    /// enrolled / capacity (0.0..=1.0).
    pub fill_rate: f64,
}

/// Assignment table: every participant, every configured period.
pub fn assignment_table(roster: &Roster, periods: &[String]) -> Vec<AssignmentRow> {
    roster
        .participants()
        .iter()
        .map(|p| AssignmentRow {
            participant: p.id.clone(),
            name: p.name.clone(),
            periods: periods
                .iter()
                .map(|period| PeriodAssignment {
                    period: period.clone(),
                    activity: p
                        .assignment(period)
                        .map(|a| a.activity.clone())
                        .unwrap_or_default(),
                    method: p.method(period),
                })
                .collect(),
            latest_score: p.latest_score().unwrap_or(0),
            cumulative_score: p.cumulative_score(),
        })
        .collect()
}

/// Unassigned table: one row per empty (participant, period) with its cause.
pub fn unassigned_table(roster: &Roster, periods: &[String]) -> Vec<UnassignedRow> {
    let mut rows = Vec::new();
    for (idx, participant) in roster.participants().iter().enumerate() {
        for period in periods {
            if !participant.is_assigned(period) {
                rows.push(UnassignedRow {
                    participant: participant.id.clone(),
                    period: period.clone(),
                    reason: diagnose(roster, idx, period),
                });
            }
        }
    }
    rows
}

/// Capacity utilization of every remaining instance.
pub fn capacity_utilization(roster: &Roster) -> Vec<CapacityRow> {
    roster
        .instances()
        .map(|i| CapacityRow {
            period: i.period.clone(),
            activity: i.activity.clone(),
            enrolled: i.enrolled_count(),
            capacity: i.capacity,
            minimum: i.minimum,
            remaining: i.remaining(),
            meets_minimum: i.meets_minimum(),
            fill_rate: i.fill_rate(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityCatalog, ActivitySpec, Participant};

    fn sample() -> (Roster, Vec<String>) {
        let catalog = ActivityCatalog::new()
            .with_offering("P1", "Art", ActivitySpec::new(2, 1))
            .with_offering("P2", "Swim", ActivitySpec::new(1, 0));
        let participants = vec![
            Participant::new("C1")
                .with_name("Dana")
                .with_score_history(vec![3, 5])
                .with_preferences("P1", ["Art"]),
            Participant::new("C2"),
        ];
        let mut roster = Roster::new(&catalog, participants);
        roster.assign(0, "P1", "Art", AssignmentMethod::Preference(1)).unwrap();
        roster.assign(1, "P2", "Swim", AssignmentMethod::Random).unwrap();
        (roster, vec!["P1".into(), "P2".into()])
    }

    #[test]
    fn test_assignment_table() {
        let (roster, periods) = sample();
        let table = assignment_table(&roster, &periods);

        assert_eq!(table.len(), 2);
        assert_eq!(table[0].name, "Dana");
        assert_eq!(table[0].periods[0].activity, "Art");
        assert_eq!(table[0].periods[1].activity, "");
        assert_eq!(table[0].periods[1].method, AssignmentMethod::Unassigned);
        assert_eq!(table[0].latest_score, 5);
        assert_eq!(table[0].cumulative_score, 8);
        assert_eq!(table[1].latest_score, 0);
    }

    #[test]
    fn test_assignment_table_serializes_labels() {
        let (roster, periods) = sample();
        let json = serde_json::to_string(&assignment_table(&roster, &periods)).unwrap();
        assert!(json.contains(r#""method":"Pref_1""#));
        assert!(json.contains(r#""method":"Random""#));
        assert!(json.contains(r#""method":"""#));
    }

    #[test]
    fn test_unassigned_table() {
        let (roster, periods) = sample();
        let rows = unassigned_table(&roster, &periods);

        assert_eq!(
            rows,
            vec![
                UnassignedRow {
                    participant: "C1".into(),
                    period: "P2".into(),
                    reason: UnassignedReason::AllActivitiesFull,
                },
                UnassignedRow {
                    participant: "C2".into(),
                    period: "P1".into(),
                    reason: UnassignedReason::NoPreferencesListed,
                },
            ]
        );
    }

    #[test]
    fn test_capacity_utilization() {
        let (roster, _) = sample();
        let rows = capacity_utilization(&roster);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].activity, "Art");
        assert_eq!(rows[0].remaining, 1);
        assert!(rows[0].meets_minimum);
        assert!((rows[0].fill_rate - 0.5).abs() < 1e-10);
        assert_eq!(rows[1].remaining, 0);
        assert!((rows[1].fill_rate - 1.0).abs() < 1e-10);
    }
}
