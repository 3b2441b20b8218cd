//! Minimum-enrollment enforcement.
//!
//! Runs after every period has been allocated. Two strategies:
//!
//! - **Cancel and reallocate**: remove every instance below its minimum,
//!   give each unassigned participant their best remaining takeable
//!   preference, and repeat until no instance is below minimum. A final
//!   random-fill sweep places whoever still has nothing.
//! - **Force fill**: for each activity whose total enrollment is below its
//!   minimum, add participants who hold it in no period, chosen at random,
//!   until the minimum is met or no candidate fits.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, warn};

use super::round::{pending_in, random_fill, RoundParams};
use crate::error::AllocationResult;
use crate::models::{AssignmentMethod, InstanceKey, Roster};
use crate::priority::PriorityEngine;

/// Non-fatal outcome the caller should surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AllocationWarning {
    /// Force fill could not bring an activity to its minimum.
    MinimumShortfall {
        activity: String,
        required: u32,
        enrolled: u32,
    },
}

impl std::fmt::Display for AllocationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MinimumShortfall {
                activity,
                required,
                enrolled,
            } => write!(
                f,
                "'{activity}' has {enrolled} enrolled, below its minimum of {required}"
            ),
        }
    }
}

/// What the enforcement phase changed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MinimumReport {
    /// Instances removed, in cancellation order.
    pub canceled: Vec<InstanceKey>,
    /// Participants re-placed on a ranked preference after a cancellation.
    pub reallocated: usize,
    /// Seats given by the closing random-fill sweep.
    pub random_filled: usize,
    /// Participants forced into under-subscribed activities.
    pub forced: usize,
    /// Minimums left unmet.
    pub warnings: Vec<AllocationWarning>,
}

/// Cancels under-subscribed instances and reallocates until stable.
///
/// Only instances in `periods` are considered.
pub fn cancel_and_reallocate<R: Rng + ?Sized>(
    roster: &mut Roster,
    periods: &[String],
    engine: &PriorityEngine,
    params: &RoundParams,
    rng: &mut R,
) -> AllocationResult<MinimumReport> {
    let mut report = MinimumReport::default();

    loop {
        let under: Vec<InstanceKey> = periods
            .iter()
            .flat_map(|p| roster.instances_in(p))
            .filter(|i| !i.meets_minimum())
            .map(|i| i.key())
            .collect();
        if under.is_empty() {
            break;
        }

        for key in under {
            let displaced = roster.cancel_instance(&key)?;
            warn!(instance = %key, displaced = displaced.len(), "instance canceled below minimum");
            report.canceled.push(key);
        }

        for period in periods {
            for idx in pending_in(roster, period, engine) {
                let participant = roster.participant(idx);
                let best = (1..=params.max_rank).find_map(|rank| {
                    participant
                        .preference_at(period, rank)
                        .filter(|a| roster.has_room(period, a) && !participant.holds_elsewhere(a, period))
                        .map(|a| (a.to_string(), rank))
                });
                if let Some((activity, rank)) = best {
                    roster.assign(idx, period, &activity, AssignmentMethod::Preference(rank))?;
                    report.reallocated += 1;
                }
            }
        }
    }

    for period in periods {
        let pending = pending_in(roster, period, engine);
        report.random_filled += random_fill(roster, period, &pending, params, rng)?;
    }

    debug!(
        canceled = report.canceled.len(),
        reallocated = report.reallocated,
        random = report.random_filled,
        "cancel-and-reallocate finished"
    );
    Ok(report)
}

/// Forces participants into activities whose enrollment is below minimum.
///
/// An activity's minimum is the largest minimum among its instances in
/// `periods`, compared against enrollment summed across those instances.
/// Candidates are participants holding the activity in no period; each is
/// placed in the first period (in `periods` order) where the instance has
/// room and they hold nothing.
pub fn force_fill<R: Rng + ?Sized>(
    roster: &mut Roster,
    periods: &[String],
    rng: &mut R,
) -> AllocationResult<MinimumReport> {
    let mut report = MinimumReport::default();

    for activity in roster.activity_names() {
        let (required, mut enrolled) = periods
            .iter()
            .filter_map(|p| roster.instance(p, &activity))
            .fold((0u32, 0u32), |(req, enr), i| {
                (req.max(i.minimum), enr + i.enrolled_count())
            });
        if enrolled >= required {
            continue;
        }

        let mut pool: Vec<usize> = (0..roster.participant_count())
            .filter(|&idx| !roster.participant(idx).holds(&activity))
            .collect();
        pool.shuffle(rng);

        for idx in pool {
            if enrolled >= required {
                break;
            }
            let target = periods
                .iter()
                .find(|p| roster.has_room(p, &activity) && !roster.participant(idx).is_assigned(p))
                .cloned();
            if let Some(period) = target {
                roster.assign(idx, &period, &activity, AssignmentMethod::ForcedMinimum)?;
                enrolled += 1;
                report.forced += 1;
            }
        }

        if enrolled < required {
            warn!(%activity, required, enrolled, "minimum not met after force fill");
            report.warnings.push(AllocationWarning::MinimumShortfall {
                activity,
                required,
                enrolled,
            });
        }
    }

    debug!(forced = report.forced, shortfalls = report.warnings.len(), "force fill finished");
    Ok(report)
}
