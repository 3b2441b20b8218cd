//! Allocation domain models.
//!
//! Provides the data types shared by every phase of an allocation run:
//! participants with ranked preferences, the activity catalog, per-period
//! activity instances, and the [`Roster`] arena that owns them.
//!
//! # Domain Mappings
//!
//! | u-allocate | Summer camp | School | Conference |
//! |------------|-------------|--------|------------|
//! | Participant | Camper | Student | Attendee |
//! | Activity | Hug / elective | Course | Workshop |
//! | Period | Block (Aleph, Beth, ...) | Semester slot | Session |
//! | ActivityInstance | Hug in a block | Section | Workshop run |

mod activity;
mod method;
mod participant;
mod roster;

pub use activity::{ActivityCatalog, ActivityInstance, ActivitySpec, InstanceKey};
pub use method::AssignmentMethod;
pub use participant::{Assignment, Participant};
pub use roster::Roster;
