//! Fairness ordering of participants.
//!
//! Before each period is allocated, unassigned participants are ordered by
//! priority rules so that those served worst in earlier runs are considered
//! first within every demand pool.
//!
//! # Usage
//!
//! ```
//! use u_allocate::priority::{rules, PriorityEngine};
//!
//! let engine = PriorityEngine::new()
//!     .with_rule(rules::MissedFirstChoice)
//!     .with_rule(rules::CumulativeScore);
//! ```
//!
//! # Score Convention
//! **Lower score = served first.** Ties that survive every rule keep
//! insertion order (the sort is stable).

mod engine;
pub mod rules;

pub use engine::PriorityEngine;

use crate::models::Participant;
use std::fmt::Debug;

/// Score returned by a priority rule. Lower = served first.
pub type RuleScore = f64;

/// A rule that ranks participants for service order.
pub trait PriorityRule: Send + Sync + Debug {
    /// Rule name (e.g., "CUMULATIVE").
    fn name(&self) -> &'static str;

    /// Evaluates a participant; lower = served first.
    fn evaluate(&self, participant: &Participant) -> RuleScore;

    /// Rule description.
    fn description(&self) -> &'static str {
        self.name()
    }
}
