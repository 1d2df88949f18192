//! Cohort Core - grouping sessions
//!
//! Ties the ingestion layer and the allocation engine to the outside world:
//! - Loads the roster for a class
//! - Requests automated proposals and runs them through ingestion
//! - Falls back to a random division when the automated path fails
//! - Persists divisions and relays them, best effort, downstream
//!
//! # Architecture
//!
//! ```text
//! RosterSource ──→ GroupingSession ──→ AllocationEngine
//!                     │    ▲
//! ProposalSource ─────┘    └── IngestionPipeline
//!                     │
//!                     ├──→ DivisionStore       (awaited)
//!                     └──→ SecondaryDelivery   (spawned, failures are warnings)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use cohort_core::prelude::*;
//!
//! # async fn example(roster_source: &dyn RosterSource, collaborators: Collaborators) -> Result<(), SessionError> {
//! let config = EngineConfig::from_toml_str("group_size = 3")?;
//! let mut session = GroupingSession::load_roster(config, "class-7", roster_source, collaborators).await?;
//!
//! match session.request_automated_division("build a weather station").await? {
//!     AutomatedDivision::Accepted { report, .. } => println!("{} warning(s)", report.warning_count()),
//!     AutomatedDivision::Fallback { plan, .. } => session.engine_mut().commit(plan, true)?,
//! }
//!
//! let receipt = session.save(DivisionId::new(), "build a weather station").await?;
//! if let Some(warning) = receipt.delivery.warning().await {
//!     eprintln!("{warning}");
//! }
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod collaborators;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod session;

// Re-exports for convenience
pub use collaborators::{
    CollaboratorError, DeliveryParticipant, DeliveryPayload, DivisionId, DivisionStore,
    ProposalRequest, ProposalSource, RosterSource, SecondaryDelivery,
};
pub use config::{ConfigError, EngineConfig};
pub use error::{SessionError, SessionResult};
pub use pipeline::{AcceptedProposal, IngestionError, IngestionPipeline};
pub use session::{AutomatedDivision, Collaborators, DeliveryHandle, GroupingSession, SaveReceipt};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a grouping session
    pub use crate::{
        AutomatedDivision, Collaborators, DivisionId, DivisionStore, EngineConfig,
        GroupingSession, ProposalSource, RosterSource, SecondaryDelivery, SessionError,
    };
    pub use cohort_alloc::{AllocationEngine, ConflictChoice, Placement};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
