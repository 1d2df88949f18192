//! Error types for the data model

use crate::participant::ParticipantId;

/// Errors raised while building or restoring model values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Roster lists the same participant twice
    #[error("duplicate roster id: '{0}'")]
    DuplicateRosterId(ParticipantId),

    /// Snapshot references a participant missing from the roster
    #[error("unknown participant in snapshot: '{0}'")]
    UnknownParticipant(ParticipantId),

    /// Participant listed in more than one group
    #[error("participant '{0}' assigned more than once")]
    DuplicateAssignment(ParticipantId),

    /// Leader id is not a member of its group
    #[error("leader '{leader_id}' is not a member of group {group_number}")]
    LeaderOutsideGroup {
        group_number: u32,
        leader_id: ParticipantId,
    },

    /// Group numbers are not exactly 1..N
    #[error("group numbers must be 1..{expected_max}, found {found:?}")]
    NonContiguousNumbering { expected_max: u32, found: Vec<u32> },
}
