//! Built-in priority rules.
//!
//! All rules return lower scores for participants who should be served
//! first.

use super::{PriorityRule, RuleScore};
use crate::config::PriorityRuleKind;
use crate::models::Participant;

/// Lowest cumulative satisfaction first.
///
/// Sums the whole score history, so chronically under-served participants
/// rise to the front over successive runs.
#[derive(Debug, Clone, Copy)]
pub struct CumulativeScore;

impl PriorityRule for CumulativeScore {
    fn name(&self) -> &'static str {
        "CUMULATIVE"
    }

    fn evaluate(&self, participant: &Participant) -> RuleScore {
        participant.cumulative_score() as f64
    }

    fn description(&self) -> &'static str {
        "Lowest cumulative score first"
    }
}

/// Lowest most-recent weekly score first.
///
/// Participants without history score 0.
#[derive(Debug, Clone, Copy)]
pub struct LatestScore;

impl PriorityRule for LatestScore {
    fn name(&self) -> &'static str {
        "LATEST"
    }

    fn evaluate(&self, participant: &Participant) -> RuleScore {
        f64::from(participant.latest_score().unwrap_or(0))
    }

    fn description(&self) -> &'static str {
        "Lowest latest weekly score first"
    }
}

/// Participants who missed their first choice last week first.
#[derive(Debug, Clone, Copy)]
pub struct MissedFirstChoice;

impl PriorityRule for MissedFirstChoice {
    fn name(&self) -> &'static str {
        "MISSED_FIRST"
    }

    fn evaluate(&self, participant: &Participant) -> RuleScore {
        if participant.missed_first_choice {
            0.0
        } else {
            1.0
        }
    }

    fn description(&self) -> &'static str {
        "Missed first choice last week first"
    }
}

/// Instantiates a built-in rule.
pub fn from_kind(kind: PriorityRuleKind) -> Box<dyn PriorityRule> {
    match kind {
        PriorityRuleKind::CumulativeScore => Box::new(CumulativeScore),
        PriorityRuleKind::LatestScore => Box::new(LatestScore),
        PriorityRuleKind::MissedFirstChoice => Box::new(MissedFirstChoice),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cumulative_score() {
        let p = Participant::new("C1").with_score_history(vec![5, 3]);
        assert!((CumulativeScore.evaluate(&p) - 8.0).abs() < 1e-10);
    }

    #[test]
    fn test_latest_score() {
        let p = Participant::new("C1").with_score_history(vec![5, 3]);
        assert!((LatestScore.evaluate(&p) - 3.0).abs() < 1e-10);
        assert!((LatestScore.evaluate(&Participant::new("C2"))).abs() < 1e-10);
    }

    #[test]
    fn test_missed_first_choice() {
        let missed = Participant::new("C1").with_missed_first_choice(true);
        let served = Participant::new("C2");
        assert!(MissedFirstChoice.evaluate(&missed) < MissedFirstChoice.evaluate(&served));
    }

    #[test]
    fn test_from_kind() {
        assert_eq!(from_kind(PriorityRuleKind::CumulativeScore).name(), "CUMULATIVE");
        assert_eq!(from_kind(PriorityRuleKind::LatestScore).name(), "LATEST");
        assert_eq!(
            from_kind(PriorityRuleKind::MissedFirstChoice).description(),
            "Missed first choice last week first"
        );
    }
}
