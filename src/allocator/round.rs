//! Per-period round allocation.
//!
//! # Algorithm
//!
//! 1. Collect participants unassigned in the period, ordered by the
//!    priority engine (lowest historical satisfaction first).
//! 2. For rank r = 1..=K: gather each participant's rank-r choice into
//!    per-activity demand lists (skipping unoffered activities and ones
//!    already held in another period). Shuffle each list, re-sort it by
//!    priority (so randomness only breaks priority ties), and admit up to
//!    the remaining capacity with method `Pref_r`.
//! 3. Random fill: shuffle a pool with one entry per free seat and give
//!    each remaining participant the first seat they can take.
//! 4. Diagnose whoever is still unassigned.
//!
//! # Complexity
//! O(K * n log n + n * s) where n = participants, s = free seats.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use super::diagnosis::{diagnose, UnassignedReason};
use crate::error::AllocationResult;
use crate::models::{AssignmentMethod, Roster};
use crate::priority::PriorityEngine;

/// Per-round settings derived from the run configuration.
#[derive(Debug, Clone, Copy)]
pub struct RoundParams {
    /// Deepest preference rank processed.
    pub max_rank: usize,
    /// Random-fill participants without preferences for the period.
    pub fill_without_preferences: bool,
}

/// What one period's round produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoundReport {
    /// Period name.
    pub period: String,
    /// Admissions per preference rank (index 0 = rank 1).
    pub by_rank: Vec<usize>,
    /// Seats given by random fill.
    pub random_filled: usize,
    /// Participants left unassigned, with the diagnosed cause.
    pub unassigned: Vec<(String, UnassignedReason)>,
}

impl RoundReport {
    /// Total participants placed by this round.
    pub fn assigned(&self) -> usize {
        self.by_rank.iter().sum::<usize>() + self.random_filled
    }
}

/// Positions of participants unassigned in `period`, in priority order.
pub fn pending_in(roster: &Roster, period: &str, engine: &PriorityEngine) -> Vec<usize> {
    let mut pending: Vec<usize> = (0..roster.participant_count())
        .filter(|&idx| !roster.participant(idx).is_assigned(period))
        .collect();
    engine.sort(roster.participants(), &mut pending);
    pending
}

/// Runs preference rounds and random fill for one period.
///
/// Never exceeds capacity, never touches participants already assigned in
/// the period, and never repeats an activity held in another period.
///
/// # Errors
/// Only on a broken roster invariant; infeasibility is reported in
/// [`RoundReport::unassigned`].
pub fn allocate_period<R: Rng + ?Sized>(
    roster: &mut Roster,
    period: &str,
    engine: &PriorityEngine,
    params: &RoundParams,
    rng: &mut R,
) -> AllocationResult<RoundReport> {
    let mut report = RoundReport {
        period: period.to_string(),
        by_rank: vec![0; params.max_rank],
        ..Default::default()
    };
    let mut pending = pending_in(roster, period, engine);

    for rank in 1..=params.max_rank {
        if pending.is_empty() {
            break;
        }

        let mut demand: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for &idx in &pending {
            let participant = roster.participant(idx);
            let Some(activity) = participant.preference_at(period, rank) else {
                continue;
            };
            if !roster.is_offered(period, activity) || participant.holds_elsewhere(activity, period) {
                continue;
            }
            demand.entry(activity.to_string()).or_default().push(idx);
        }

        for (activity, mut demanders) in demand {
            let free = roster
                .instance(period, &activity)
                .map_or(0, |i| i.remaining() as usize);
            if free == 0 {
                continue;
            }

            demanders.shuffle(rng);
            engine.sort(roster.participants(), &mut demanders);

            for &idx in demanders.iter().take(free) {
                roster.assign(idx, period, &activity, AssignmentMethod::Preference(rank))?;
                report.by_rank[rank - 1] += 1;
            }
        }

        pending.retain(|&idx| !roster.participant(idx).is_assigned(period));
        debug!(
            period,
            rank,
            admitted = report.by_rank[rank - 1],
            pending = pending.len(),
            "preference rank processed"
        );
    }

    report.random_filled = random_fill(roster, period, &pending, params, rng)?;
    pending.retain(|&idx| !roster.participant(idx).is_assigned(period));

    report.unassigned = pending
        .iter()
        .map(|&idx| {
            (
                roster.participant(idx).id.clone(),
                diagnose(roster, idx, period),
            )
        })
        .collect();

    debug!(
        period,
        assigned = report.assigned(),
        random = report.random_filled,
        unassigned = report.unassigned.len(),
        "period allocated"
    );
    Ok(report)
}

/// Fills free seats of `period` for the given participants, in order.
///
/// Participants with no preferences for the period are skipped unless
/// `params.fill_without_preferences` is set. Returns the number of seats
/// filled.
pub fn random_fill<R: Rng + ?Sized>(
    roster: &mut Roster,
    period: &str,
    candidates: &[usize],
    params: &RoundParams,
    rng: &mut R,
) -> AllocationResult<usize> {
    let mut seats: Vec<String> = roster
        .instances_in(period)
        .flat_map(|i| std::iter::repeat(i.activity.clone()).take(i.remaining() as usize))
        .collect();
    if seats.is_empty() {
        return Ok(0);
    }
    seats.shuffle(rng);

    let mut filled = 0;
    for &idx in candidates {
        let participant = roster.participant(idx);
        if participant.is_assigned(period) {
            continue;
        }
        if !params.fill_without_preferences && !participant.has_preferences(period) {
            continue;
        }

        let pick = seats
            .iter()
            .position(|a| !participant.holds_elsewhere(a, period) && roster.has_room(period, a));
        if let Some(pos) = pick {
            let activity = seats.remove(pos);
            roster.assign(idx, period, &activity, AssignmentMethod::Random)?;
            filled += 1;
        }
    }
    Ok(filled)
}
