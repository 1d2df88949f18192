//! Cohort Allocation Engine
//!
//! Interactive, stateful division of a roster into capacity-bounded groups
//! with one leader per group.
//!
//! # Operations
//!
//! - [`AllocationEngine::partition_randomly`] / [`AllocationEngine::reorganize`]:
//!   plan a shuffled division, then [`AllocationEngine::commit`] it
//! - [`AllocationEngine::move_participant`]: manual reassignment
//! - [`AllocationEngine::randomize_participant`]: random placement, surfacing a
//!   [`CapacityConflict`] when every group is full
//! - [`AllocationEngine::set_leader`]: leader promotion
//! - [`AllocationEngine::unassigned_participants`]: completeness query
//!
//! # Example
//!
//! ```rust
//! use cohort_alloc::{AllocationEngine, Placement};
//! use cohort_model::{Participant, Roster};
//!
//! let roster = Roster::new((1..=6).map(|i| Participant::new(format!("p{i}"), format!("P{i}"))).collect()).unwrap();
//! let mut engine = AllocationEngine::new(roster.clone(), 3).unwrap();
//!
//! let plan = engine.partition_randomly(roster.participants(), 3).unwrap();
//! assert!(!plan.is_uneven());
//! engine.commit(plan, false).unwrap();
//!
//! assert_eq!(engine.partition().len(), 2);
//! assert!(engine.unassigned_participants().is_empty());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod engine;
mod error;
mod plan;

// Re-exports
pub use engine::{
    AllocationEngine, CapacityConflict, CapacitySummary, ConflictChoice, MoveOutcome, Placement,
};
pub use error::{AllocError, AllocResult, ConfirmationReason};
pub use plan::{divide, DivisionPlan};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
