//! Cohort Data Model
//!
//! Shared types for team-assignment ingestion and allocation.
//!
//! # Overview
//!
//! - **Participant / Roster**: the authoritative, read-only set of people
//! - **AssignmentProposal**: an external candidate grouping, pending validation
//! - **Partition**: the engine's own grouping, edited and persisted
//! - **PartitionSnapshot**: the id-only form handed to persistence
//!
//! # Example
//!
//! ```rust
//! use cohort_model::{Group, Participant, Partition, Roster};
//!
//! let roster = Roster::new(vec![Participant::new("p1", "Ana")]).unwrap();
//!
//! let mut group = Group::new(1);
//! group.members.push(roster.get("p1").unwrap().clone());
//!
//! let partition = Partition::from_groups(vec![group]).unwrap();
//! assert!(partition.check_invariants().is_ok());
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod participant;
pub mod partition;
pub mod proposal;
pub mod snapshot;

// Re-exports
pub use error::ModelError;
pub use participant::{Participant, ParticipantId, Roster};
pub use partition::{Group, MemberNotes, Partition};
pub use proposal::{AssignmentProposal, ProposedGroup, ProposedMember};
pub use snapshot::{PartitionSnapshot, SnapshotGroup, SnapshotMember};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for model types
    pub use crate::{
        AssignmentProposal, Group, MemberNotes, ModelError, Participant, ParticipantId, Partition,
        ProposedGroup, ProposedMember, Roster,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
