//! Error types for the allocation engine
//!
//! Only programmer-error-class violations are errors here. Capacity
//! conflicts are returned as a choice request, not an error.

use cohort_model::{ModelError, ParticipantId};

/// Why a plan needs explicit confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationReason {
    /// Last group will be smaller than the group size
    UnevenGroups,
    /// Plan replaces a non-empty partition
    ReplacesExisting,
}

impl std::fmt::Display for ConfirmationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnevenGroups => f.write_str("groups would be uneven"),
            Self::ReplacesExisting => f.write_str("the current division would be replaced"),
        }
    }
}

/// Allocation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
    /// Group size must be at least one
    #[error("invalid group size: {0} (minimum 1)")]
    InvalidGroupSize(usize),

    /// Participant is not on the roster
    #[error("participant not on roster: '{0}'")]
    UnknownParticipant(ParticipantId),

    /// Participant listed twice in a division request
    #[error("participant listed more than once: '{0}'")]
    DuplicateParticipant(ParticipantId),

    /// No group with that number
    #[error("group not found: {0}")]
    UnknownGroup(u32),

    /// Leader must be a member of the group
    #[error("participant '{participant_id}' is not a member of group {group_number}")]
    LeaderNotInGroup {
        group_number: u32,
        participant_id: ParticipantId,
    },

    /// Fresh division requested while groups already exist
    #[error("partition is not empty; reorganize instead")]
    PartitionNotEmpty,

    /// Plan needs the caller's confirmation
    #[error("confirmation required: {0}")]
    ConfirmationRequired(ConfirmationReason),

    /// Operation needs at least one group
    #[error("no groups exist")]
    NoGroups,

    /// Resulting partition violates an invariant
    #[error("invalid partition: {0}")]
    InvalidPartition(#[from] ModelError),
}

/// Result type alias for allocation operations
pub type AllocResult<T> = Result<T, AllocError>;
