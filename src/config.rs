//! Allocation run configuration.
//!
//! One [`AllocationConfig`] is passed into every engine invocation. It
//! carries the period order, the preference depth, the minimum-enrollment
//! policy, scoring weights, and the random seed.
//!
//! All fields have defaults, so a config can be deserialized from a sparse
//! JSON or TOML document by an external loader.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::ConfigError;

/// How under-subscribed activities are resolved after the rounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MinimumStrategy {
    /// Cancel instances below minimum and reallocate their participants.
    #[default]
    CancelAndReallocate,
    /// Force uninvolved participants into activities below minimum.
    ForceFill,
    /// Leave minimums unenforced.
    Disabled,
}

/// Built-in fairness rules used to order participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorityRuleKind {
    /// Lowest cumulative score first.
    CumulativeScore,
    /// Lowest most-recent weekly score first.
    LatestScore,
    /// Participants who missed their first choice last week first.
    MissedFirstChoice,
}

/// Configuration for one allocation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    /// Periods in processing order.
    pub periods: Vec<String>,
    /// Deepest preference rank considered. `None` = longest list in the roster.
    pub max_rank: Option<usize>,
    /// Minimum-enrollment policy.
    pub strategy: MinimumStrategy,
    /// RNG seed. `None` = OS entropy.
    pub seed: Option<u64>,
    /// Points for rank 1, 2, ...; deeper ranks score 0.
    pub preference_points: Vec<u32>,
    /// Random-fill participants who listed no preferences for a period.
    pub fill_without_preferences: bool,
    /// Priority rules, applied in sequence.
    pub priority: Vec<PriorityRuleKind>,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            periods: Vec::new(),
            max_rank: None,
            strategy: MinimumStrategy::default(),
            seed: None,
            preference_points: vec![5, 4, 3, 2, 1],
            fill_without_preferences: false,
            priority: vec![PriorityRuleKind::CumulativeScore],
        }
    }
}

impl AllocationConfig {
    /// Creates a config for the given period order.
    pub fn new<I, S>(periods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            periods: periods.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Sets the deepest preference rank.
    pub fn with_max_rank(mut self, max_rank: usize) -> Self {
        self.max_rank = Some(max_rank);
        self
    }

    /// Sets the minimum-enrollment strategy.
    pub fn with_strategy(mut self, strategy: MinimumStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the points per preference rank.
    pub fn with_preference_points(mut self, points: Vec<u32>) -> Self {
        self.preference_points = points;
        self
    }

    /// Enables random fill for participants without preferences.
    pub fn with_fill_without_preferences(mut self, enabled: bool) -> Self {
        self.fill_without_preferences = enabled;
        self
    }

    /// Replaces the priority rules.
    pub fn with_priority(mut self, rules: Vec<PriorityRuleKind>) -> Self {
        self.priority = rules;
        self
    }

    /// Effective preference depth for a roster whose longest list is `observed`.
    pub fn effective_max_rank(&self, observed: usize) -> usize {
        self.max_rank.unwrap_or(observed)
    }

    /// Checks the configuration.
    ///
    /// # Errors
    /// Empty or duplicate periods, a zero `max_rank`, or no priority rules.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.periods.is_empty() {
            return Err(ConfigError::NoPeriods);
        }
        let mut seen = HashSet::new();
        for period in &self.periods {
            if !seen.insert(period.as_str()) {
                return Err(ConfigError::DuplicatePeriod(period.clone()));
            }
        }
        if self.max_rank == Some(0) {
            return Err(ConfigError::ZeroMaxRank);
        }
        if self.priority.is_empty() {
            return Err(ConfigError::EmptyPriority);
        }
        Ok(())
    }
}
