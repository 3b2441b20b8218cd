//! Input validation for allocation runs.
//!
//! Checks the catalog and preference roster before they are handed to the
//! engine. The engine assumes validated input and never calls this itself;
//! loaders run it and report or exclude the offending rows. Detects:
//! - Duplicate participant IDs
//! - Zero-capacity offerings and minimums above capacity
//! - Catalog or preference periods outside the configured period order
//! - Preferences naming an activity not offered in that period
//! - One activity carrying different minimums in different periods

use crate::config::AllocationConfig;
use crate::models::{ActivityCatalog, Participant};
use std::collections::{BTreeMap, HashSet};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two participants share the same ID.
    DuplicateId,
    /// An offering has capacity zero.
    ZeroCapacity,
    /// An offering's minimum exceeds its capacity.
    MinimumAboveCapacity,
    /// A period is not in the configured period order.
    UnknownPeriod,
    /// A preference names an activity not offered in that period.
    InvalidActivityReference,
    /// An activity's minimum differs between periods.
    InconsistentMinimum,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the catalog and participants against the configuration.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(
    catalog: &ActivityCatalog,
    participants: &[Participant],
    config: &AllocationConfig,
) -> ValidationResult {
    let mut errors = Vec::new();
    let periods: HashSet<&str> = config.periods.iter().map(String::as_str).collect();

    // Catalog
    let mut minimums: BTreeMap<&str, BTreeMap<u32, Vec<&str>>> = BTreeMap::new();
    for (period, activities) in &catalog.periods {
        if !periods.contains(period.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownPeriod,
                format!("Catalog period '{period}' is not configured"),
            ));
        }
        for (activity, spec) in activities {
            if spec.capacity == 0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::ZeroCapacity,
                    format!("Activity '{activity}' in period '{period}' has zero capacity"),
                ));
            }
            if spec.minimum > spec.capacity {
                errors.push(ValidationError::new(
                    ValidationErrorKind::MinimumAboveCapacity,
                    format!(
                        "Activity '{activity}' in period '{period}' has minimum {} above capacity {}",
                        spec.minimum, spec.capacity
                    ),
                ));
            }
            minimums
                .entry(activity.as_str())
                .or_default()
                .entry(spec.minimum)
                .or_default()
                .push(period.as_str());
        }
    }

    for (activity, by_minimum) in &minimums {
        if by_minimum.len() > 1 {
            let found: Vec<String> = by_minimum
                .iter()
                .map(|(min, periods)| format!("{min} in {}", periods.join("/")))
                .collect();
            errors.push(ValidationError::new(
                ValidationErrorKind::InconsistentMinimum,
                format!("Activity '{activity}' has differing minimums: {}", found.join(", ")),
            ));
        }
    }

    // Participants
    let mut ids = HashSet::new();
    for participant in participants {
        if !ids.insert(participant.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate participant ID: {}", participant.id),
            ));
        }

        for (period, activities) in &participant.preferences {
            if !periods.contains(period.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownPeriod,
                    format!(
                        "Participant '{}' lists preferences for unknown period '{period}'",
                        participant.id
                    ),
                ));
                continue;
            }
            for activity in activities {
                if catalog.spec(period, activity).is_none() {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::InvalidActivityReference,
                        format!(
                            "Participant '{}' prefers '{activity}', not offered in period '{period}'",
                            participant.id
                        ),
                    ));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
