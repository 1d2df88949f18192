//! Cohort Ingestion Layer
//!
//! The trusted boundary between the untrusted proposal source and the
//! allocation engine.
//!
//! # Stages
//!
//! - **Normalize**: unwrap envelopes, undo extra escaping, strip fences
//! - **Validate**: parse into a typed, sanitized `AssignmentProposal`
//! - **Check**: cross-validate against the roster into a `ValidationReport`
//! - **Repair**: renumber and de-duplicate, then re-check
//!
//! # Architecture
//!
//! ```text
//! raw → PayloadNormalizer → SchemaValidator → RosterIntegrityChecker ─┬─ valid ──→ accepted
//!                                                                     └─ invalid → RepairEngine → accepted | incomplete
//! ```
//!
//! # Example
//!
//! ```rust
//! use cohort_ingest::prelude::*;
//! use cohort_model::{Participant, Roster};
//!
//! let roster = Roster::new(vec![Participant::new("p1", "Ana")]).unwrap();
//! let raw = serde_json::json!(["```json\n{\"groups\":[{\"groupNumber\":1,\"leaderId\":\"p1\",\"members\":[{\"id\":\"p1\",\"displayName\":\"Ana\"}]}]}\n```"]);
//!
//! let text = PayloadNormalizer::default().normalize(raw).unwrap().text;
//! let proposal = SchemaValidator::new().parse(&text).unwrap();
//! let report = RosterIntegrityChecker::new().check(&proposal, &roster);
//! assert!(report.is_valid);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod integrity;
pub mod normalize;
pub mod repair;
pub mod sanitize;
pub mod schema;

// Re-exports for convenience
pub use error::{IngestError, IngestResult, RepairIncomplete};
pub use integrity::{
    GroupReport, IntegrityIssue, IntegrityWarning, IssueKind, RosterIntegrityChecker,
    ValidationReport,
};
pub use normalize::{
    Normalized, PayloadNormalizer, Step, StripFence, TextStep, Unescape, UnwrapEnvelope,
    UnwrapSingleton, ValueStep, DEFAULT_ENVELOPE_KEY,
};
pub use repair::{RepairAction, RepairEngine, RepairOutcome};
pub use sanitize::{sanitize_list, sanitize_text};
pub use schema::SchemaValidator;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the ingestion layer
    pub use crate::error::{IngestError, RepairIncomplete};
    pub use crate::integrity::{IssueKind, RosterIntegrityChecker, ValidationReport};
    pub use crate::normalize::PayloadNormalizer;
    pub use crate::repair::{RepairEngine, RepairOutcome};
    pub use crate::schema::SchemaValidator;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
