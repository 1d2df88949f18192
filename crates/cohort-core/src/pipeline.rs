//! Ingestion pipeline
//!
//! Runs an untrusted payload through every ingestion stage and hands back
//! either a proposal the allocation engine may accept, or the reason it may
//! not.

use crate::config::EngineConfig;
use cohort_ingest::{
    IngestError, PayloadNormalizer, RepairAction, RepairEngine, RepairIncomplete, RepairOutcome,
    RosterIntegrityChecker, SchemaValidator, ValidationReport,
};
use cohort_model::{AssignmentProposal, Roster};
use serde_json::Value;

/// Ingestion failures surfaced to the session
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IngestionError {
    /// Payload could not be turned into a proposal at all
    #[error(transparent)]
    Payload(#[from] IngestError),

    /// Proposal disagrees with the roster in ways repair cannot fix
    #[error(transparent)]
    Rejected(#[from] RepairIncomplete),
}

impl IngestionError {
    /// Final report, when the payload got as far as the integrity check
    #[must_use]
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            Self::Payload(_) => None,
            Self::Rejected(incomplete) => Some(&incomplete.report),
        }
    }
}

/// A proposal that passed (possibly after repair) the integrity check
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedProposal {
    /// The proposal to install
    pub proposal: AssignmentProposal,
    /// Report from the last check; valid, possibly with warnings
    pub report: ValidationReport,
    /// Fixes applied on the way; empty if none were needed
    pub repairs: Vec<RepairAction>,
    /// Normalizer steps that fired
    pub normalized_by: Vec<&'static str>,
}

/// normalize → validate → check → repair → check
#[derive(Debug)]
pub struct IngestionPipeline {
    normalizer: PayloadNormalizer,
    validator: SchemaValidator,
    checker: RosterIntegrityChecker,
    repairer: RepairEngine,
}

impl Default for IngestionPipeline {
    fn default() -> Self {
        Self::with_normalizer(PayloadNormalizer::default())
    }
}

impl IngestionPipeline {
    /// Pipeline for a configuration
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_normalizer(PayloadNormalizer::with_envelope_key(config.envelope_key.clone()))
    }

    /// Pipeline with a custom normalizer chain
    #[must_use]
    pub fn with_normalizer(normalizer: PayloadNormalizer) -> Self {
        Self {
            normalizer,
            validator: SchemaValidator::new(),
            checker: RosterIntegrityChecker::new(),
            repairer: RepairEngine::new(),
        }
    }

    /// Ingest a raw payload against the roster
    ///
    /// # Errors
    /// - `IngestionError::Payload` for unsupported, malformed or mis-shaped payloads
    /// - `IngestionError::Rejected` when integrity errors survive repair
    pub fn ingest(&self, raw: Value, roster: &Roster) -> Result<AcceptedProposal, IngestionError> {
        let normalized = self.normalizer.normalize(raw).map_err(|e| {
            tracing::warn!(error = %e, "payload normalization failed");
            e
        })?;

        let proposal = self.validator.parse(&normalized.text).map_err(|e| {
            tracing::warn!(error = %e, "proposal failed schema validation");
            e
        })?;

        let report = self.checker.check(&proposal, roster);
        tracing::info!(
            groups = proposal.len(),
            valid = report.is_valid,
            errors = report.error_count(),
            warnings = report.warning_count(),
            "integrity check complete"
        );

        match self.repairer.repair(&report, proposal, roster) {
            RepairOutcome::AlreadyValid { proposal, report } => Ok(AcceptedProposal {
                proposal,
                report,
                repairs: Vec::new(),
                normalized_by: normalized.applied,
            }),
            RepairOutcome::Repaired {
                proposal,
                report,
                actions,
            } => {
                tracing::info!(repairs = actions.len(), "proposal repaired");
                Ok(AcceptedProposal {
                    proposal,
                    report,
                    repairs: actions,
                    normalized_by: normalized.applied,
                })
            }
            RepairOutcome::Incomplete { report, .. } => {
                for line in report.summary() {
                    tracing::warn!(%line, "unrepaired integrity issue");
                }
                Err(RepairIncomplete { report }.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cohort_ingest::IssueKind;
    use cohort_test_utils::{group, roster, to_payload};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn valid_proposal_passes_untouched() {
        let roster = roster(4);
        let proposal = AssignmentProposal::new(vec![group(1, "p1", &["p1", "p2"]), group(2, "p3", &["p3", "p4"])]);

        let accepted = IngestionPipeline::default().ingest(to_payload(&proposal), &roster).unwrap();
        assert_eq!(accepted.proposal, proposal);
        assert!(accepted.repairs.is_empty());
        assert!(accepted.report.is_valid);
    }

    #[test]
    fn custom_envelope_key_is_honoured() {
        let roster = roster(2);
        let proposal = AssignmentProposal::new(vec![group(1, "p1", &["p1", "p2"])]);
        let text = serde_json::to_string(&to_payload(&proposal)).unwrap();
        let raw = json!([{ "result": text }]);

        let pipeline = IngestionPipeline::new(&EngineConfig::new().with_envelope_key("result"));
        let accepted = pipeline.ingest(raw, &roster).unwrap();
        assert_eq!(accepted.proposal, proposal);
        assert!(!accepted.normalized_by.is_empty());
    }

    #[test]
    fn fixable_issues_are_repaired() {
        let roster = roster(4);
        let proposal = AssignmentProposal::new(vec![group(4, "p3", &["p3", "p4"]), group(2, "p1", &["p1", "p2"])]);

        let accepted = IngestionPipeline::default().ingest(to_payload(&proposal), &roster).unwrap();
        assert_eq!(accepted.repairs.len(), 1);
        assert_eq!(accepted.proposal.groups[0].leader_id.as_str(), "p1");
    }

    #[test]
    fn roster_mismatch_is_rejected_with_report() {
        let roster = roster(3);
        let proposal = AssignmentProposal::new(vec![group(1, "p1", &["p1", "p2"])]);

        let err = IngestionPipeline::default().ingest(to_payload(&proposal), &roster).unwrap_err();
        let report = err.report().unwrap();
        assert!(report.has(IssueKind::UnassignedParticipant));
    }

    #[test]
    fn non_json_text_is_a_payload_error() {
        let err = IngestionPipeline::default().ingest(json!("not json"), &roster(1)).unwrap_err();
        assert!(matches!(err, IngestionError::Payload(IngestError::MalformedPayload { .. })));
        assert!(err.report().is_none());
    }
}
