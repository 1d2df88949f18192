//! Session-level error types
//!
//! Wraps the errors of every layer the session drives, plus collaborator
//! failures, so callers handle a single type.

use crate::collaborators::CollaboratorError;
use crate::config::ConfigError;
use crate::pipeline::IngestionError;
use cohort_alloc::AllocError;
use cohort_model::ModelError;

/// Session errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Configuration rejected
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Roster source failed or returned an unusable roster
    #[error("roster unavailable: {0}")]
    Roster(#[source] CollaboratorError),

    /// Roster contained the same participant twice
    #[error(transparent)]
    InvalidRoster(#[from] ModelError),

    /// Proposal source failed
    #[error("automated grouping unavailable: {0}")]
    Proposal(#[source] CollaboratorError),

    /// Proposal could not be accepted
    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    /// Allocation operation rejected
    #[error(transparent)]
    Allocation(#[from] AllocError),

    /// Division store failed
    #[error("division store failed: {0}")]
    Persistence(#[source] CollaboratorError),
}

impl SessionError {
    /// Whether the caller has to ask the operator before retrying
    ///
    /// True for rejected proposals and for plans that need confirmation.
    #[must_use]
    pub fn requires_operator(&self) -> bool {
        matches!(
            self,
            Self::Ingestion(IngestionError::Rejected(_))
                | Self::Allocation(AllocError::ConfirmationRequired(_))
        )
    }
}

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;
