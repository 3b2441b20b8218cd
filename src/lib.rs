//! Preference-driven activity allocation for recurring multi-period schedules.
//!
//! Assigns participants to capacity-limited activities across fixed periods,
//! honoring ranked preferences, per-activity minimum enrollment, and a
//! fairness rule that serves participants who scored worse in earlier runs
//! first. Infeasibility never aborts a run: participants left empty carry a
//! diagnosed reason and unmet minimums surface as warnings.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Participant`, `ActivityCatalog`,
//!   `ActivityInstance`, `AssignmentMethod`, and the `Roster` arena
//! - **`config`**: `AllocationConfig` (period order, preference depth,
//!   minimum strategy, scoring points, seed)
//! - **`priority`**: Fairness ordering rules and the sequential `PriorityEngine`
//! - **`allocator`**: Round allocation, minimum enforcement, unassigned diagnosis
//! - **`scoring`**: Weekly satisfaction scores and manual-override reconciliation
//! - **`report`**: Assignment, unassigned, and capacity tables; `AllocationKpi`
//! - **`validation`**: Input integrity checks for loaders
//!
//! # Example
//!
//! ```
//! use u_allocate::allocator::Allocator;
//! use u_allocate::config::{AllocationConfig, MinimumStrategy};
//! use u_allocate::models::{ActivityCatalog, ActivitySpec, Participant, Roster};
//! use u_allocate::report;
//!
//! let catalog = ActivityCatalog::new()
//!     .with_activity("Art", ["Aleph", "Beth"], ActivitySpec::new(10, 0))
//!     .with_activity("Swim", ["Aleph", "Beth"], ActivitySpec::new(10, 0));
//! let campers = vec![
//!     Participant::new("C1")
//!         .with_preferences("Aleph", ["Art", "Swim"])
//!         .with_preferences("Beth", ["Art", "Swim"]),
//! ];
//! let mut roster = Roster::new(&catalog, campers);
//!
//! let config = AllocationConfig::new(["Aleph", "Beth"])
//!     .with_strategy(MinimumStrategy::CancelAndReallocate)
//!     .with_seed(42);
//! let allocator = Allocator::new(config).unwrap();
//! allocator.allocate(&mut roster).unwrap();
//!
//! let table = report::assignment_table(&roster, &allocator.config().periods);
//! assert_eq!(table[0].periods[0].activity, "Art");
//! assert_eq!(table[0].periods[1].activity, "Swim"); // Art is not repeated
//! assert_eq!(table[0].latest_score, 9);
//! ```
//!
//! # Determinism
//!
//! All randomness flows from one RNG seeded by `AllocationConfig::seed`;
//! identical inputs and seed give identical assignments.

pub mod allocator;
pub mod config;
pub mod error;
pub mod models;
pub mod priority;
pub mod report;
pub mod scoring;
pub mod validation;
