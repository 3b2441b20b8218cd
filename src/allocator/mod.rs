//! Allocation engine.
//!
//! Runs one allocation cycle over a [`Roster`]:
//!
//! 1. [`round::allocate_period`] for each configured period, in order.
//! 2. Minimum enforcement with the configured [`MinimumStrategy`].
//! 3. Weekly scores appended through [`Scorer::record`].
//! 4. A final [`Roster::check_invariants`]; a failure is returned as an error.
//!
//! Every shuffle draws from one RNG threaded through the phases, so a fixed
//! seed reproduces the run exactly.

pub mod diagnosis;
pub mod minimum;
pub mod round;

pub use diagnosis::{diagnose, UnassignedReason};
pub use minimum::{AllocationWarning, MinimumReport};
pub use round::{RoundParams, RoundReport};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;

use crate::config::{AllocationConfig, MinimumStrategy};
use crate::error::{AllocationResult, ConfigError};
use crate::models::Roster;
use crate::priority::PriorityEngine;
use crate::report::{unassigned_table, UnassignedRow};
use crate::scoring::Scorer;

/// Result of one allocation run.
#[derive(Debug, Clone, Serialize)]
pub struct AllocationOutcome {
    /// Preference depth used.
    pub max_rank: usize,
    /// Round reports, in period order.
    pub rounds: Vec<RoundReport>,
    /// Minimum-enforcement changes.
    pub minimum: MinimumReport,
    /// Weekly scores appended, in roster order.
    pub scores: Vec<u32>,
    /// Final unassigned participants with diagnosed reasons.
    pub unassigned: Vec<UnassignedRow>,
}

impl AllocationOutcome {
    /// Non-fatal advisories for the caller.
    pub fn warnings(&self) -> &[AllocationWarning] {
        &self.minimum.warnings
    }
}

/// Allocation engine configured for one camp schedule.
///
/// # Example
/// ```
/// use u_allocate::allocator::Allocator;
/// use u_allocate::config::AllocationConfig;
/// use u_allocate::models::{ActivityCatalog, ActivitySpec, Participant, Roster};
///
/// let catalog = ActivityCatalog::new()
///     .with_offering("Aleph", "Art", ActivitySpec::new(2, 0))
///     .with_offering("Aleph", "Swim", ActivitySpec::new(2, 0));
/// let mut roster = Roster::new(&catalog, vec![
///     Participant::new("C1").with_preferences("Aleph", ["Art", "Swim"]),
///     Participant::new("C2").with_preferences("Aleph", ["Swim", "Art"]),
/// ]);
///
/// let allocator = Allocator::new(AllocationConfig::new(["Aleph"]).with_seed(7)).unwrap();
/// let outcome = allocator.allocate(&mut roster).unwrap();
/// assert!(outcome.unassigned.is_empty());
/// assert_eq!(roster.participant(0).assignment("Aleph").unwrap().activity, "Art");
/// ```
#[derive(Debug, Clone)]
pub struct Allocator {
    config: AllocationConfig,
    priority: PriorityEngine,
    scorer: Scorer,
}

impl Allocator {
    /// Creates an allocator from a validated configuration.
    ///
    /// # Errors
    /// Returns the first configuration problem found.
    pub fn new(config: AllocationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            priority: PriorityEngine::from_kinds(&config.priority),
            scorer: Scorer::from_config(&config),
            config,
        })
    }

    /// Replaces the priority engine (custom rules).
    pub fn with_priority_engine(mut self, engine: PriorityEngine) -> Self {
        self.priority = engine;
        self
    }

    /// The run configuration.
    pub fn config(&self) -> &AllocationConfig {
        &self.config
    }

    /// The scorer used after allocation (also for later overrides).
    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    /// Allocates with the configured seed, or OS entropy when unset.
    pub fn allocate(&self, roster: &mut Roster) -> AllocationResult<AllocationOutcome> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        self.allocate_with_rng(roster, &mut rng)
    }

    /// Allocates using the given random source.
    ///
    /// # Errors
    /// Only on a broken roster invariant. Infeasibility is reported in the
    /// outcome.
    pub fn allocate_with_rng<R: Rng + ?Sized>(
        &self,
        roster: &mut Roster,
        rng: &mut R,
    ) -> AllocationResult<AllocationOutcome> {
        let periods = &self.config.periods;
        let max_rank = self.config.effective_max_rank(roster.max_preference_len());
        let params = RoundParams {
            max_rank,
            fill_without_preferences: self.config.fill_without_preferences,
        };

        info!(
            participants = roster.participant_count(),
            periods = periods.len(),
            max_rank,
            "allocation started"
        );

        let mut rounds = Vec::with_capacity(periods.len());
        for period in periods {
            rounds.push(round::allocate_period(roster, period, &self.priority, &params, rng)?);
        }

        let minimum = match self.config.strategy {
            MinimumStrategy::CancelAndReallocate => {
                minimum::cancel_and_reallocate(roster, periods, &self.priority, &params, rng)?
            }
            MinimumStrategy::ForceFill => minimum::force_fill(roster, periods, rng)?,
            MinimumStrategy::Disabled => MinimumReport::default(),
        };

        let scores = self.scorer.record(roster, periods)?;
        roster.check_invariants()?;
        let unassigned = unassigned_table(roster, periods);

        info!(
            canceled = minimum.canceled.len(),
            forced = minimum.forced,
            warnings = minimum.warnings.len(),
            unassigned = unassigned.len(),
            "allocation finished"
        );

        Ok(AllocationOutcome {
            max_rank,
            rounds,
            minimum,
            scores,
            unassigned,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PriorityRuleKind;
    use crate::models::{ActivityCatalog, ActivitySpec, AssignmentMethod, Participant};
    use rand::rngs::SmallRng;

    fn three_period_catalog() -> ActivityCatalog {
        ActivityCatalog::new()
            .with_activity("Art", ["P1", "P2", "P3"], ActivitySpec::new(2, 1))
            .with_activity("Swim", ["P1", "P2", "P3"], ActivitySpec::new(2, 1))
    }

    #[test]
    fn test_new_rejects_bad_config() {
        assert_eq!(
            Allocator::new(AllocationConfig::default()).unwrap_err(),
            ConfigError::NoPeriods
        );
    }

    #[test]
    fn test_allocate_records_scores() {
        let catalog = ActivityCatalog::new().with_offering("P1", "Art", ActivitySpec::new(5, 0));
        let mut roster = Roster::new(
            &catalog,
            vec![Participant::new("C1").with_prior_score(3).with_preferences("P1", ["Art"])],
        );
        let allocator = Allocator::new(AllocationConfig::new(["P1"]).with_seed(1)).unwrap();

        let outcome = allocator.allocate(&mut roster).unwrap();
        assert_eq!(outcome.max_rank, 1);
        assert_eq!(outcome.scores, vec![5]);
        assert_eq!(roster.participant(0).score_history, vec![3, 5]);
    }

    #[test]
    fn test_two_activities_across_three_periods() {
        // With only two activities, the third period must repeat: left unassigned.
        let participants = vec![
            Participant::new("C1")
                .with_preferences("P1", ["Art", "Swim"])
                .with_preferences("P2", ["Swim", "Art"])
                .with_preferences("P3", ["Art", "Swim"]),
        ];
        let mut roster = Roster::new(&three_period_catalog(), participants);
        let allocator = Allocator::new(
            AllocationConfig::new(["P1", "P2", "P3"])
                .with_seed(3)
                .with_strategy(MinimumStrategy::Disabled),
        )
        .unwrap();

        let outcome = allocator.allocate(&mut roster).unwrap();
        let p = roster.participant(0);
        assert_eq!(p.method("P1"), AssignmentMethod::Preference(1));
        assert_eq!(p.method("P2"), AssignmentMethod::Preference(1));
        assert!(!p.is_assigned("P3"));
        assert_eq!(outcome.unassigned.len(), 1);
        assert_eq!(outcome.unassigned[0].reason, UnassignedReason::OnlyRepeatsAvailable);
    }

    #[test]
    fn test_same_seed_same_result() {
        let participants: Vec<_> = (0..12)
            .map(|i| {
                Participant::new(format!("C{i:02}"))
                    .with_preferences("P1", ["Art", "Swim"])
                    .with_preferences("P2", ["Swim", "Art"])
            })
            .collect();
        let allocator = Allocator::new(AllocationConfig::new(["P1", "P2"]).with_seed(99)).unwrap();

        let mut first = Roster::new(&three_period_catalog(), participants.clone());
        let mut second = Roster::new(&three_period_catalog(), participants);
        allocator.allocate(&mut first).unwrap();
        allocator.allocate(&mut second).unwrap();

        for (a, b) in first.participants().iter().zip(second.participants()) {
            assert_eq!(a.assignments, b.assignments);
        }
    }

    #[test]
    fn test_allocate_with_rng_and_custom_engine() {
        let catalog = ActivityCatalog::new().with_offering("P1", "Art", ActivitySpec::new(1, 0));
        let participants = vec![
            Participant::new("C1").with_preferences("P1", ["Art"]),
            Participant::new("C2")
                .with_missed_first_choice(true)
                .with_preferences("P1", ["Art"]),
        ];
        let mut roster = Roster::new(&catalog, participants);
        let allocator = Allocator::new(
            AllocationConfig::new(["P1"]).with_priority(vec![PriorityRuleKind::MissedFirstChoice]),
        )
        .unwrap();
        let mut rng = SmallRng::seed_from_u64(11);

        let outcome = allocator.allocate_with_rng(&mut roster, &mut rng).unwrap();
        assert_eq!(roster.participant(1).method("P1"), AssignmentMethod::Preference(1));
        assert_eq!(outcome.unassigned[0].participant, "C1");
        assert_eq!(outcome.unassigned[0].reason, UnassignedReason::AllActivitiesFull);
        assert!(outcome.warnings().is_empty());
    }

    #[test]
    fn test_allocate_deserialized_roster() {
        let catalog = ActivityCatalog::new()
            .with_offering("P1", "Pottery", ActivitySpec::new(10, 3))
            .with_offering("P1", "Swim", ActivitySpec::new(10, 0));
        let saved = Roster::new(
            &catalog,
            vec![Participant::new("C1").with_preferences("P1", ["Pottery", "Swim"])],
        );
        let json = serde_json::to_string(&saved).unwrap();
        let mut roster: Roster = serde_json::from_str(&json).unwrap();
        let allocator = Allocator::new(AllocationConfig::new(["P1"]).with_seed(2)).unwrap();

        let outcome = allocator.allocate(&mut roster).unwrap();
        assert_eq!(outcome.minimum.canceled.len(), 1);
        assert_eq!(roster.participant(0).method("P1"), AssignmentMethod::Preference(2));
    }

    #[test]
    fn test_empty_roster() {
        let mut roster = Roster::new(&three_period_catalog(), Vec::new());
        let allocator = Allocator::new(AllocationConfig::new(["P1"]).with_seed(0)).unwrap();
        let outcome = allocator.allocate(&mut roster).unwrap();
        assert_eq!(outcome.max_rank, 0);
        assert!(outcome.scores.is_empty());
        // Every instance is under its minimum of 1 and gets canceled.
        assert_eq!(outcome.minimum.canceled.len(), 2);
    }
}
