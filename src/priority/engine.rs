//! Sequential priority engine.
//!
//! Applies rules in order; a later rule is consulted only when every
//! earlier rule ties. Exhausted ties keep the incoming order.

use std::cmp::Ordering;
use std::sync::Arc;

use super::{rules, PriorityRule, RuleScore};
use crate::config::PriorityRuleKind;
use crate::models::Participant;

/// Composable participant ordering.
///
/// # Example
/// ```
/// use u_allocate::models::Participant;
/// use u_allocate::priority::{rules, PriorityEngine};
///
/// let participants = vec![
///     Participant::new("happy").with_prior_score(15),
///     Participant::new("unlucky").with_prior_score(2),
/// ];
/// let engine = PriorityEngine::new().with_rule(rules::CumulativeScore);
/// let mut order = vec![0, 1];
/// engine.sort(&participants, &mut order);
/// assert_eq!(order, vec![1, 0]);
/// ```
#[derive(Clone)]
pub struct PriorityEngine {
    rules: Vec<Arc<dyn PriorityRule>>,
    epsilon: f64,
}

impl PriorityEngine {
    /// Creates an engine with no rules (keeps insertion order).
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            epsilon: 1e-9,
        }
    }

    /// Builds an engine from configured rule kinds.
    pub fn from_kinds(kinds: &[PriorityRuleKind]) -> Self {
        Self {
            rules: kinds
                .iter()
                .map(|&k| -> Arc<dyn PriorityRule> { Arc::from(rules::from_kind(k)) })
                .collect(),
            epsilon: 1e-9,
        }
    }

    /// Appends a rule.
    pub fn with_rule<R: PriorityRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Number of rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Compares two participants; `Less` = `a` is served first.
    pub fn compare(&self, a: &Participant, b: &Participant) -> Ordering {
        for rule in &self.rules {
            let score_a = rule.evaluate(a);
            let score_b = rule.evaluate(b);

            if (score_a - score_b).abs() > self.epsilon {
                return score_a.partial_cmp(&score_b).unwrap_or(Ordering::Equal);
            }
        }
        Ordering::Equal
    }

    /// Stable-sorts participant positions by priority.
    pub fn sort(&self, participants: &[Participant], order: &mut [usize]) {
        order.sort_by(|&a, &b| self.compare(&participants[a], &participants[b]));
    }

    /// Scores from each rule for one participant.
    pub fn evaluate(&self, participant: &Participant) -> Vec<RuleScore> {
        self.rules.iter().map(|r| r.evaluate(participant)).collect()
    }
}

impl Default for PriorityEngine {
    fn default() -> Self {
        Self::from_kinds(&[PriorityRuleKind::CumulativeScore])
    }
}

impl std::fmt::Debug for PriorityEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriorityEngine")
            .field(
                "rules",
                &self.rules.iter().map(|r| r.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
