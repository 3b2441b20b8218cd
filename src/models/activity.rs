//! Activity catalog and per-period activity instances.
//!
//! An activity may be offered in several periods. Each (activity, period)
//! pair is an [`ActivityInstance`] with its own enrollment; capacity is
//! per instance while the minimum is usually shared across instances.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Capacity and minimum thresholds for one offering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySpec {
    /// Maximum enrollment.
    pub capacity: u32,
    /// Minimum enrollment for the activity to run.
    pub minimum: u32,
}

impl ActivitySpec {
    /// Creates a spec.
    pub fn new(capacity: u32, minimum: u32) -> Self {
        Self { capacity, minimum }
    }
}

/// Activities offered per period (period → activity → spec).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityCatalog {
    /// Offerings keyed by period, then activity.
    pub periods: BTreeMap<String, BTreeMap<String, ActivitySpec>>,
}

impl ActivityCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers an activity in a period.
    pub fn with_offering(
        mut self,
        period: impl Into<String>,
        activity: impl Into<String>,
        spec: ActivitySpec,
    ) -> Self {
        self.offer(period, activity, spec);
        self
    }

    /// Offers an activity in each listed period with the same spec.
    pub fn with_activity<I, S>(mut self, activity: impl Into<String>, periods: I, spec: ActivitySpec) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let activity = activity.into();
        for period in periods {
            self.offer(period, activity.clone(), spec);
        }
        self
    }

    /// Offers an activity in a period, replacing any earlier spec.
    pub fn offer(&mut self, period: impl Into<String>, activity: impl Into<String>, spec: ActivitySpec) {
        self.periods
            .entry(period.into())
            .or_default()
            .insert(activity.into(), spec);
    }

    /// Spec of an offering.
    pub fn spec(&self, period: &str, activity: &str) -> Option<ActivitySpec> {
        self.periods.get(period)?.get(activity).copied()
    }

    /// Number of (activity, period) offerings.
    pub fn offering_count(&self) -> usize {
        self.periods.values().map(BTreeMap::len).sum()
    }
}

/// Key of an activity instance. Orders by period, then activity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstanceKey {
    /// Period name.
    pub period: String,
    /// Activity identifier.
    pub activity: String,
}

impl InstanceKey {
    /// Creates a key.
    pub fn new(period: impl Into<String>, activity: impl Into<String>) -> Self {
        Self {
            period: period.into(),
            activity: activity.into(),
        }
    }
}

impl std::fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.activity, self.period)
    }
}

/// One (activity, period) offering with live enrollment.
///
/// `|enrolled| <= capacity` always holds; `Roster` refuses enrollments
/// beyond capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityInstance {
    /// Activity identifier.
    pub activity: String,
    /// Period name.
    pub period: String,
    /// Maximum enrollment.
    pub capacity: u32,
    /// Minimum enrollment.
    pub minimum: u32,
    /// Enrolled participant IDs.
    pub enrolled: BTreeSet<String>,
}

impl ActivityInstance {
    /// Creates an empty instance.
    pub fn new(activity: impl Into<String>, period: impl Into<String>, spec: ActivitySpec) -> Self {
        Self {
            activity: activity.into(),
            period: period.into(),
            capacity: spec.capacity,
            minimum: spec.minimum,
            enrolled: BTreeSet::new(),
        }
    }

    /// Instance key.
    pub fn key(&self) -> InstanceKey {
        InstanceKey::new(&self.period, &self.activity)
    }

    /// Current enrollment count.
    #[inline]
    pub fn enrolled_count(&self) -> u32 {
        self.enrolled.len() as u32
    }

    /// Free seats.
    #[inline]
    pub fn remaining(&self) -> u32 {
        self.capacity.saturating_sub(self.enrolled_count())
    }

    /// Whether no seats remain.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    /// Whether enrollment reaches the minimum.
    #[inline]
    pub fn meets_minimum(&self) -> bool {
        self.enrolled_count() >= self.minimum
    }

    /// Fraction of capacity in use (0.0 for zero capacity).
    pub fn fill_rate(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            f64::from(self.enrolled_count()) / f64::from(self.capacity)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_builder() {
        let catalog = ActivityCatalog::new()
            .with_activity("Art", ["Aleph", "Beth"], ActivitySpec::new(10, 3))
            .with_offering("Aleph", "Swim", ActivitySpec::new(5, 0));

        assert_eq!(catalog.offering_count(), 3);
        assert_eq!(catalog.spec("Beth", "Art"), Some(ActivitySpec::new(10, 3)));
        assert_eq!(catalog.spec("Beth", "Swim"), None);
        assert_eq!(catalog.spec("Gimmel", "Art"), None);
    }

    #[test]
    fn test_instance_counts() {
        let mut inst = ActivityInstance::new("Art", "Aleph", ActivitySpec::new(2, 2));
        assert_eq!(inst.remaining(), 2);
        assert!(!inst.meets_minimum());

        inst.enrolled.insert("C1".into());
        assert_eq!(inst.remaining(), 1);
        assert!((inst.fill_rate() - 0.5).abs() < 1e-10);

        inst.enrolled.insert("C2".into());
        assert!(inst.is_full());
        assert!(inst.meets_minimum());
    }

    #[test]
    fn test_key_ordering() {
        let mut keys = vec![
            InstanceKey::new("Beth", "Art"),
            InstanceKey::new("Aleph", "Swim"),
            InstanceKey::new("Aleph", "Art"),
        ];
        keys.sort();
        assert_eq!(keys[0], InstanceKey::new("Aleph", "Art"));
        assert_eq!(keys[2].to_string(), "Art@Beth");
    }

    #[test]
    fn test_zero_capacity_fill_rate() {
        let inst = ActivityInstance::new("Art", "Aleph", ActivitySpec::new(0, 0));
        assert!(inst.is_full());
        assert_eq!(inst.fill_rate(), 0.0);
    }
}
