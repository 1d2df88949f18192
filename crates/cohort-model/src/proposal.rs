//! Externally produced team-assignment proposals
//!
//! A proposal is transient: it is built per ingestion attempt and either
//! accepted into a [`Partition`](crate::Partition) or discarded.

use crate::participant::ParticipantId;
use serde::{Deserialize, Serialize};

/// Candidate grouping awaiting validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentProposal {
    /// Groups in the order the producer emitted them
    pub groups: Vec<ProposedGroup>,
}

impl AssignmentProposal {
    /// Create proposal from groups
    #[inline]
    #[must_use]
    pub fn new(groups: Vec<ProposedGroup>) -> Self {
        Self { groups }
    }

    /// Every member id in group order, repeats included
    pub fn member_ids(&self) -> impl Iterator<Item = &ParticipantId> {
        self.groups
            .iter()
            .flat_map(|g| g.members.iter().map(|m| &m.id))
    }

    /// Number of groups
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether there are no groups
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// One proposed group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedGroup {
    /// Positive group number
    pub group_number: u32,
    /// Proposed leader
    pub leader_id: ParticipantId,
    /// Proposed members
    pub members: Vec<ProposedMember>,
}

impl ProposedGroup {
    /// Create group
    #[must_use]
    pub fn new(
        group_number: u32,
        leader_id: impl Into<ParticipantId>,
        members: Vec<ProposedMember>,
    ) -> Self {
        Self {
            group_number,
            leader_id: leader_id.into(),
            members,
        }
    }

    /// Whether the id is listed among this group's members
    #[must_use]
    pub fn has_member(&self, id: &ParticipantId) -> bool {
        self.members.iter().any(|m| &m.id == id)
    }
}

/// One proposed member with the producer's notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedMember {
    /// Participant id
    pub id: ParticipantId,
    /// Name as the producer wrote it
    pub display_name: String,
    /// Short free-text strengths
    #[serde(default)]
    pub strengths: Vec<String>,
    /// Short free-text points of attention
    #[serde(default)]
    pub attention: Vec<String>,
}

impl ProposedMember {
    /// Create member with no notes
    #[must_use]
    pub fn new(id: impl Into<ParticipantId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            strengths: Vec::new(),
            attention: Vec::new(),
        }
    }

    /// With strengths
    #[inline]
    #[must_use]
    pub fn with_strengths<I, S>(mut self, strengths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.strengths = strengths.into_iter().map(Into::into).collect();
        self
    }

    /// With points of attention
    #[inline]
    #[must_use]
    pub fn with_attention<I, S>(mut self, attention: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attention = attention.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposal_serializes_wire_names() {
        let proposal = AssignmentProposal::new(vec![ProposedGroup::new(
            1,
            "p1",
            vec![ProposedMember::new("p1", "Ana").with_strengths(["listens"])],
        )]);

        let json = serde_json::to_value(&proposal).unwrap();
        assert_eq!(json["groups"][0]["groupNumber"], 1);
        assert_eq!(json["groups"][0]["leaderId"], "p1");
        assert_eq!(json["groups"][0]["members"][0]["displayName"], "Ana");
        assert_eq!(json["groups"][0]["members"][0]["strengths"][0], "listens");
    }

    #[test]
    fn member_ids_keep_repeats() {
        let proposal = AssignmentProposal::new(vec![
            ProposedGroup::new(1, "a", vec![ProposedMember::new("a", "A")]),
            ProposedGroup::new(2, "a", vec![ProposedMember::new("a", "A")]),
        ]);
        assert_eq!(proposal.member_ids().count(), 2);
    }
}
