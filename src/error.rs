//! Error types.
//!
//! Infeasibility (full activities, unmet minimums) is never an error: it is
//! reported as data through unassigned reasons and warnings. The errors here
//! signal invalid configuration or a broken engine invariant.

use thiserror::Error;

/// Engine invariant violations.
///
/// Returned by [`Roster`](crate::models::Roster) mutations and by the final
/// invariant check of an allocation run. Seeing one means a logic defect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// Enrolling would exceed the instance capacity.
    #[error("activity '{activity}' in period '{period}' is at capacity ({capacity})")]
    CapacityExceeded {
        activity: String,
        period: String,
        capacity: u32,
    },

    /// The participant already holds an activity in the period.
    #[error("participant '{participant}' is already assigned in period '{period}'")]
    AlreadyAssigned { participant: String, period: String },

    /// The participant holds the activity in another period.
    #[error("participant '{participant}' already holds '{activity}' in another period")]
    RepeatedActivity {
        participant: String,
        activity: String,
    },

    /// No instance exists for the (activity, period) pair.
    #[error("activity '{activity}' is not offered in period '{period}'")]
    UnknownInstance { activity: String, period: String },

    /// No participant with the given ID.
    #[error("unknown participant '{0}'")]
    UnknownParticipant(String),

    /// Participant and instance state disagree.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

/// Invalid allocation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No periods configured.
    #[error("at least one period is required")]
    NoPeriods,

    /// A period appears twice in the period order.
    #[error("duplicate period '{0}'")]
    DuplicatePeriod(String),

    /// `max_rank` was set to zero.
    #[error("max_rank must be at least 1")]
    ZeroMaxRank,

    /// No priority rules configured.
    #[error("at least one priority rule is required")]
    EmptyPriority,
}

/// Unrecognized assignment method label.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized assignment method '{0}'")]
pub struct ParseMethodError(pub String);

/// Result type for engine operations.
pub type AllocationResult<T> = Result<T, AllocationError>;
