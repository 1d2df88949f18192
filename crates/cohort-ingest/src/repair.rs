//! Repair engine
//!
//! Applies the mechanical fixes (renumbering, de-duplication) and re-checks.
//! Roster mismatches are never guessed at; they come back as
//! [`RepairOutcome::Incomplete`] for the caller to escalate.

use crate::error::RepairIncomplete;
use crate::integrity::{IssueKind, RosterIntegrityChecker, ValidationReport};
use cohort_model::{AssignmentProposal, ParticipantId, Roster};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A fix the engine applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepairAction {
    /// Groups sorted by number and renumbered 1..N
    Renumbered { from: Vec<u32> },
    /// Later occurrences of a participant dropped
    RemovedDuplicate {
        member_id: ParticipantId,
        group_number: u32,
    },
}

/// Result of a repair attempt
#[derive(Debug, Clone, PartialEq)]
pub enum RepairOutcome {
    /// Proposal was valid on entry; returned unchanged
    AlreadyValid {
        proposal: AssignmentProposal,
        report: ValidationReport,
    },
    /// Fixes applied and the re-check passed
    Repaired {
        proposal: AssignmentProposal,
        report: ValidationReport,
        actions: Vec<RepairAction>,
    },
    /// Re-check still failed
    Incomplete {
        report: ValidationReport,
        actions: Vec<RepairAction>,
    },
}

impl RepairOutcome {
    /// Whether the outcome carries an acceptable proposal
    #[inline]
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::Incomplete { .. })
    }

    /// Final report
    #[must_use]
    pub fn report(&self) -> &ValidationReport {
        match self {
            Self::AlreadyValid { report, .. }
            | Self::Repaired { report, .. }
            | Self::Incomplete { report, .. } => report,
        }
    }

    /// Accepted proposal, or the residual report
    ///
    /// # Errors
    /// - `RepairIncomplete` when the re-check still failed
    pub fn into_result(self) -> Result<AssignmentProposal, RepairIncomplete> {
        match self {
            Self::AlreadyValid { proposal, .. } | Self::Repaired { proposal, .. } => Ok(proposal),
            Self::Incomplete { report, .. } => Err(RepairIncomplete { report }),
        }
    }
}

/// Mechanical repair of recoverable integrity violations
#[derive(Debug, Clone, Copy, Default)]
pub struct RepairEngine {
    checker: RosterIntegrityChecker,
}

impl RepairEngine {
    /// Create repair engine
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Repair a proposal given the report it produced
    #[must_use]
    pub fn repair(
        &self,
        report: &ValidationReport,
        proposal: AssignmentProposal,
        roster: &Roster,
    ) -> RepairOutcome {
        if report.is_valid {
            return RepairOutcome::AlreadyValid {
                proposal,
                report: report.clone(),
            };
        }

        let mut proposal = proposal;
        let mut actions = Vec::new();

        if report.has(IssueKind::DuplicateMember) {
            actions.extend(remove_duplicates(&mut proposal));
        }
        if report.has(IssueKind::NonSequentialNumbering) {
            actions.extend(renumber(&mut proposal));
        }
        for action in &actions {
            tracing::info!(?action, "repair applied");
        }

        let recheck = self.checker.check(&proposal, roster);
        if recheck.is_valid {
            RepairOutcome::Repaired {
                proposal,
                report: recheck,
                actions,
            }
        } else {
            tracing::warn!(
                errors = recheck.error_count(),
                "repair incomplete; proposal needs operator decision"
            );
            RepairOutcome::Incomplete {
                report: recheck,
                actions,
            }
        }
    }
}

/// Keep the first occurrence of every id, scanning groups in given order
fn remove_duplicates(proposal: &mut AssignmentProposal) -> Vec<RepairAction> {
    let mut seen = HashSet::new();
    let mut actions = Vec::new();
    for group in &mut proposal.groups {
        let group_number = group.group_number;
        group.members.retain(|member| {
            if seen.insert(member.id.clone()) {
                true
            } else {
                actions.push(RepairAction::RemovedDuplicate {
                    member_id: member.id.clone(),
                    group_number,
                });
                false
            }
        });
    }
    actions
}

/// Sort groups by current number, then number them 1..N
fn renumber(proposal: &mut AssignmentProposal) -> Option<RepairAction> {
    let from: Vec<u32> = proposal.groups.iter().map(|g| g.group_number).collect();
    proposal.groups.sort_by_key(|g| g.group_number);
    for (group, number) in proposal.groups.iter_mut().zip(1u32..) {
        group.group_number = number;
    }
    let changed = proposal
        .groups
        .iter()
        .map(|g| g.group_number)
        .ne(from.iter().copied());
    changed.then_some(RepairAction::Renumbered { from })
}
