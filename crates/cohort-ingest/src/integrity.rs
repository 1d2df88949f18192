//! Roster integrity checking
//!
//! Cross-validates a proposal against the authoritative roster. The checker
//! never fails: every problem ends up in a fresh [`ValidationReport`].

use cohort_model::{AssignmentProposal, ParticipantId, Roster};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Classification of integrity issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    /// Leader id not in roster
    UnknownLeader,
    /// Leader id not among the group's members
    LeaderNotMember,
    /// Member id not in roster
    UnknownMember,
    /// Member id listed more than once
    DuplicateMember,
    /// Roster participant in no group
    UnassignedParticipant,
    /// Group numbers are not 1..N
    NonSequentialNumbering,
}

impl IssueKind {
    /// Whether the repair engine fixes this class mechanically
    #[inline]
    #[must_use]
    pub fn is_auto_fixable(self) -> bool {
        matches!(self, Self::DuplicateMember | Self::NonSequentialNumbering)
    }
}

/// Fatal integrity issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum IntegrityIssue {
    /// Leader id not in roster
    #[error("leader '{leader_id}' is not on the roster")]
    UnknownLeader { leader_id: ParticipantId },

    /// Leader id not among the group's members
    #[error("leader '{leader_id}' is not a member of the group")]
    LeaderNotMember { leader_id: ParticipantId },

    /// Member id not in roster
    #[error("member '{member_id}' is not on the roster")]
    UnknownMember { member_id: ParticipantId },

    /// Member id listed more than once
    #[error("participant '{member_id}' is assigned more than once")]
    DuplicateMember { member_id: ParticipantId },

    /// Roster participants in no group
    #[error("{count} participant(s) not assigned to any group")]
    UnassignedParticipant {
        count: usize,
        ids: Vec<ParticipantId>,
        names: Vec<String>,
    },

    /// Group numbers are not 1..N
    #[error("group numbers {found:?} are not the sequence 1..{expected_max}")]
    NonSequentialNumbering { found: Vec<u32>, expected_max: u32 },
}

impl IntegrityIssue {
    /// Classification
    #[must_use]
    pub fn kind(&self) -> IssueKind {
        match self {
            Self::UnknownLeader { .. } => IssueKind::UnknownLeader,
            Self::LeaderNotMember { .. } => IssueKind::LeaderNotMember,
            Self::UnknownMember { .. } => IssueKind::UnknownMember,
            Self::DuplicateMember { .. } => IssueKind::DuplicateMember,
            Self::UnassignedParticipant { .. } => IssueKind::UnassignedParticipant,
            Self::NonSequentialNumbering { .. } => IssueKind::NonSequentialNumbering,
        }
    }

    /// Whether the repair engine fixes this issue mechanically
    #[inline]
    #[must_use]
    pub fn is_auto_fixable(&self) -> bool {
        self.kind().is_auto_fixable()
    }
}

/// Advisory finding; never affects validity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum IntegrityWarning {
    /// Group has no members
    #[error("group has no members")]
    EmptyGroup,

    /// Group has exactly one member
    #[error("group has a single member")]
    SingletonGroup,

    /// Member has no strengths
    #[error("member '{member_id}' has no strengths")]
    MissingStrengths { member_id: ParticipantId },

    /// Member has no points of attention
    #[error("member '{member_id}' has no points of attention")]
    MissingAttention { member_id: ParticipantId },
}

/// Findings for one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupReport {
    /// Group number as proposed
    pub group_number: u32,
    /// Fatal issues
    pub errors: Vec<IntegrityIssue>,
    /// Advisory findings
    pub warnings: Vec<IntegrityWarning>,
}

/// Result of one integrity check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// True iff there are no errors anywhere
    pub is_valid: bool,
    /// Proposal-wide issues
    pub global_errors: Vec<IntegrityIssue>,
    /// Per-group findings, in proposal order
    pub per_group: Vec<GroupReport>,
}

impl ValidationReport {
    fn new(global_errors: Vec<IntegrityIssue>, per_group: Vec<GroupReport>) -> Self {
        let is_valid = global_errors.is_empty() && per_group.iter().all(|g| g.errors.is_empty());
        Self {
            is_valid,
            global_errors,
            per_group,
        }
    }

    /// Every error, global ones first
    pub fn errors(&self) -> impl Iterator<Item = &IntegrityIssue> {
        self.global_errors
            .iter()
            .chain(self.per_group.iter().flat_map(|g| g.errors.iter()))
    }

    /// Total number of errors
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    /// Total number of warnings
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.per_group.iter().map(|g| g.warnings.len()).sum()
    }

    /// Distinct kinds of errors present
    #[must_use]
    pub fn issue_kinds(&self) -> HashSet<IssueKind> {
        self.errors().map(IntegrityIssue::kind).collect()
    }

    /// Whether an error of this kind is present
    #[must_use]
    pub fn has(&self, kind: IssueKind) -> bool {
        self.errors().any(|e| e.kind() == kind)
    }

    /// Whether every error is auto-fixable
    #[must_use]
    pub fn is_repairable(&self) -> bool {
        !self.is_valid && self.errors().all(IntegrityIssue::is_auto_fixable)
    }

    /// Human-facing summary lines
    #[must_use]
    pub fn summary(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for issue in &self.global_errors {
            match issue {
                IntegrityIssue::UnassignedParticipant { count, names, .. } => {
                    lines.push(format!("{count} participant(s) not assigned: {}", names.join(", ")));
                }
                other => lines.push(other.to_string()),
            }
        }
        for group in &self.per_group {
            for issue in &group.errors {
                lines.push(format!("group {}: {issue}", group.group_number));
            }
            for warning in &group.warnings {
                lines.push(format!("group {} (warning): {warning}", group.group_number));
            }
        }
        lines
    }
}

/// Checks proposals against the roster
#[derive(Debug, Clone, Copy, Default)]
pub struct RosterIntegrityChecker;

impl RosterIntegrityChecker {
    /// Create checker
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Check a proposal against the roster
    #[must_use]
    pub fn check(&self, proposal: &AssignmentProposal, roster: &Roster) -> ValidationReport {
        let per_group = proposal
            .groups
            .iter()
            .map(|group| {
                let mut errors = Vec::new();
                if !roster.contains(group.leader_id.as_str()) {
                    errors.push(IntegrityIssue::UnknownLeader {
                        leader_id: group.leader_id.clone(),
                    });
                }
                if !group.has_member(&group.leader_id) {
                    errors.push(IntegrityIssue::LeaderNotMember {
                        leader_id: group.leader_id.clone(),
                    });
                }
                for member in &group.members {
                    if !roster.contains(member.id.as_str()) {
                        errors.push(IntegrityIssue::UnknownMember {
                            member_id: member.id.clone(),
                        });
                    }
                }

                let mut warnings = Vec::new();
                match group.members.len() {
                    0 => warnings.push(IntegrityWarning::EmptyGroup),
                    1 => warnings.push(IntegrityWarning::SingletonGroup),
                    _ => {}
                }
                for member in &group.members {
                    if member.strengths.is_empty() {
                        warnings.push(IntegrityWarning::MissingStrengths {
                            member_id: member.id.clone(),
                        });
                    }
                    if member.attention.is_empty() {
                        warnings.push(IntegrityWarning::MissingAttention {
                            member_id: member.id.clone(),
                        });
                    }
                }

                GroupReport {
                    group_number: group.group_number,
                    errors,
                    warnings,
                }
            })
            .collect();

        let mut global_errors = Vec::new();
        global_errors.extend(duplicate_members(proposal));
        if let Some(issue) = unassigned_participants(proposal, roster) {
            global_errors.push(issue);
        }
        if let Some(issue) = non_sequential_numbering(proposal) {
            global_errors.push(issue);
        }

        let report = ValidationReport::new(global_errors, per_group);
        if report.is_valid {
            tracing::debug!(warnings = report.warning_count(), "proposal passed integrity check");
        } else {
            tracing::debug!(errors = report.error_count(), "proposal failed integrity check");
        }
        report
    }
}

fn duplicate_members(proposal: &AssignmentProposal) -> Vec<IntegrityIssue> {
    let mut counts: HashMap<&ParticipantId, usize> = HashMap::new();
    let mut first_seen = Vec::new();
    for id in proposal.member_ids() {
        let count = counts.entry(id).or_insert(0);
        *count += 1;
        if *count == 2 {
            first_seen.push(id);
        }
    }
    first_seen
        .into_iter()
        .map(|id| IntegrityIssue::DuplicateMember {
            member_id: id.clone(),
        })
        .collect()
}

fn unassigned_participants(proposal: &AssignmentProposal, roster: &Roster) -> Option<IntegrityIssue> {
    let assigned: HashSet<&ParticipantId> = proposal.member_ids().collect();
    let missing: Vec<_> = roster.iter().filter(|p| !assigned.contains(&p.id)).collect();
    if missing.is_empty() {
        return None;
    }
    Some(IntegrityIssue::UnassignedParticipant {
        count: missing.len(),
        ids: missing.iter().map(|p| p.id.clone()).collect(),
        names: missing.iter().map(|p| p.display_name.clone()).collect(),
    })
}

fn non_sequential_numbering(proposal: &AssignmentProposal) -> Option<IntegrityIssue> {
    let mut numbers: Vec<u32> = proposal.groups.iter().map(|g| g.group_number).collect();
    numbers.sort_unstable();
    let sequential = numbers.iter().zip(1u32..).all(|(&n, expected)| n == expected);
    if sequential {
        return None;
    }
    Some(IntegrityIssue::NonSequentialNumbering {
        found: numbers,
        expected_max: u32::try_from(proposal.groups.len()).unwrap_or(u32::MAX),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cohort_test_utils::{group, roster, roster_of};

    #[test]
    fn valid_proposal_has_no_errors() {
        let proposal = AssignmentProposal::new(vec![group(1, "p1", &["p1", "p2"]), group(2, "p3", &["p3", "p4"])]);
        let report = RosterIntegrityChecker::new().check(&proposal, &roster(4));

        assert!(report.is_valid);
        assert_eq!(report.error_count(), 0);
        assert!(!report.is_repairable());
    }

    #[test]
    fn leader_outside_group_is_reported_even_if_on_roster() {
        let proposal = AssignmentProposal::new(vec![group(1, "p2", &["p1"]), group(2, "p3", &["p2", "p3"])]);
        let report = RosterIntegrityChecker::new().check(&proposal, &roster(3));

        assert!(!report.is_valid);
        assert_eq!(
            report.per_group[0].errors,
            vec![IntegrityIssue::LeaderNotMember {
                leader_id: ParticipantId::new("p2")
            }]
        );
    }

    #[test]
    fn unknown_leader_and_member() {
        let proposal = AssignmentProposal::new(vec![group(1, "ghost", &["p1", "ghost"])]);
        let report = RosterIntegrityChecker::new().check(&proposal, &roster(1));

        let kinds: Vec<_> = report.per_group[0].errors.iter().map(IntegrityIssue::kind).collect();
        assert_eq!(kinds, vec![IssueKind::UnknownLeader, IssueKind::UnknownMember]);
    }

    #[test]
    fn duplicate_reported_once() {
        let proposal = AssignmentProposal::new(vec![
            group(1, "p1", &["p1", "p2"]),
            group(2, "p3", &["p3", "p2"]),
            group(3, "p4", &["p4", "p2"]),
        ]);
        let report = RosterIntegrityChecker::new().check(&proposal, &roster(4));

        let duplicates: Vec<_> = report
            .global_errors
            .iter()
            .filter(|e| e.kind() == IssueKind::DuplicateMember)
            .collect();
        assert_eq!(duplicates.len(), 1);
        assert!(report.is_repairable());
    }

    #[test]
    fn unassigned_summary_names_people() {
        let roster = roster_of(&[("p1", "Ana"), ("p2", "Bo"), ("p3", "Cy")]);
        let proposal = AssignmentProposal::new(vec![group(1, "p1", &["p1"])]);
        let report = RosterIntegrityChecker::new().check(&proposal, &roster);

        assert!(report.has(IssueKind::UnassignedParticipant));
        assert!(report.summary().contains(&"2 participant(s) not assigned: Bo, Cy".to_string()));
    }

    #[test]
    fn repeated_group_numbers_are_non_sequential() {
        let proposal = AssignmentProposal::new(vec![group(1, "p1", &["p1", "p2"]), group(1, "p3", &["p3", "p4"])]);
        let report = RosterIntegrityChecker::new().check(&proposal, &roster(4));

        assert_eq!(
            report.global_errors,
            vec![IntegrityIssue::NonSequentialNumbering {
                found: vec![1, 1],
                expected_max: 2
            }]
        );
    }

    #[test]
    fn warnings_do_not_affect_validity() {
        let proposal = AssignmentProposal::new(vec![group(1, "p1", &["p1"])]);
        let report = RosterIntegrityChecker::new().check(&proposal, &roster(1));

        assert!(report.is_valid);
        assert_eq!(
            report.per_group[0].warnings,
            vec![
                IntegrityWarning::SingletonGroup,
                IntegrityWarning::MissingStrengths {
                    member_id: ParticipantId::new("p1")
                },
                IntegrityWarning::MissingAttention {
                    member_id: ParticipantId::new("p1")
                },
            ]
        );
    }

    #[test]
    fn empty_group_warns_and_leader_error() {
        let proposal = AssignmentProposal::new(vec![group(1, "p1", &["p1"]), group(2, "p1", &[])]);
        let report = RosterIntegrityChecker::new().check(&proposal, &roster(1));

        assert!(report.per_group[1].warnings.contains(&IntegrityWarning::EmptyGroup));
        assert!(report.per_group[1].errors.iter().any(|e| e.kind() == IssueKind::LeaderNotMember));
    }
}
