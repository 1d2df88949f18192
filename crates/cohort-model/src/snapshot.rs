//! Persistence data contract for partitions
//!
//! Stores ids only; participants are resolved against the roster on load.

use crate::error::ModelError;
use crate::participant::{ParticipantId, Roster};
use crate::partition::{Group, MemberNotes, Partition};
use serde::{Deserialize, Serialize};

/// Stored form of a [`Partition`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSnapshot {
    /// Groups in number order
    pub groups: Vec<SnapshotGroup>,
}

/// Stored form of one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotGroup {
    /// Group number
    pub group_number: u32,
    /// Leader id, if any
    #[serde(default)]
    pub leader_id: Option<ParticipantId>,
    /// Members with their notes
    pub members: Vec<SnapshotMember>,
}

/// Stored form of one member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMember {
    /// Participant id
    pub id: ParticipantId,
    /// Strengths
    #[serde(default)]
    pub strengths: Vec<String>,
    /// Points of attention
    #[serde(default)]
    pub attention: Vec<String>,
}

impl Partition {
    /// Flatten into the stored form
    #[must_use]
    pub fn to_snapshot(&self) -> PartitionSnapshot {
        let groups = self
            .groups()
            .iter()
            .map(|g| SnapshotGroup {
                group_number: g.group_number,
                leader_id: g.leader_id.clone(),
                members: g
                    .members
                    .iter()
                    .map(|m| {
                        let notes = self.notes(&m.id).cloned().unwrap_or_default();
                        SnapshotMember {
                            id: m.id.clone(),
                            strengths: notes.strengths,
                            attention: notes.attention,
                        }
                    })
                    .collect(),
            })
            .collect();
        PartitionSnapshot { groups }
    }

    /// Rebuild from the stored form, resolving members through the roster
    ///
    /// Groups are ordered by stored number and renumbered 1..N.
    ///
    /// # Errors
    /// - `ModelError::UnknownParticipant` for ids missing from the roster
    /// - any partition invariant violation
    pub fn from_snapshot(snapshot: &PartitionSnapshot, roster: &Roster) -> Result<Self, ModelError> {
        let mut stored: Vec<&SnapshotGroup> = snapshot.groups.iter().collect();
        stored.sort_by_key(|g| g.group_number);

        let mut groups = Vec::with_capacity(stored.len());
        let mut notes = Vec::new();
        for sg in stored {
            let mut group = Group::new(sg.group_number);
            for member in &sg.members {
                let participant = roster
                    .get(member.id.as_str())
                    .ok_or_else(|| ModelError::UnknownParticipant(member.id.clone()))?;
                group.members.push(participant.clone());
                notes.push((
                    member.id.clone(),
                    MemberNotes {
                        strengths: member.strengths.clone(),
                        attention: member.attention.clone(),
                    },
                ));
            }
            group.leader_id.clone_from(&sg.leader_id);
            groups.push(group);
        }

        let mut partition = Partition::from_groups(groups)?;
        for (id, member_notes) in notes {
            partition.set_notes(id, member_notes);
        }
        Ok(partition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::Participant;
    use pretty_assertions::assert_eq;

    fn roster() -> Roster {
        Roster::new(vec![
            Participant::new("p1", "Ana"),
            Participant::new("p2", "Bo"),
            Participant::new("p3", "Cy"),
        ])
        .unwrap()
    }

    #[test]
    fn snapshot_restores_partition() {
        let snapshot = PartitionSnapshot {
            groups: vec![
                SnapshotGroup {
                    group_number: 2,
                    leader_id: Some(ParticipantId::new("p3")),
                    members: vec![SnapshotMember {
                        id: ParticipantId::new("p3"),
                        strengths: vec!["design".into()],
                        attention: vec![],
                    }],
                },
                SnapshotGroup {
                    group_number: 1,
                    leader_id: None,
                    members: vec![
                        SnapshotMember {
                            id: ParticipantId::new("p1"),
                            strengths: vec![],
                            attention: vec![],
                        },
                        SnapshotMember {
                            id: ParticipantId::new("p2"),
                            strengths: vec![],
                            attention: vec!["deadlines".into()],
                        },
                    ],
                },
            ],
        };

        let partition = Partition::from_snapshot(&snapshot, &roster()).unwrap();
        assert_eq!(partition.group(1).unwrap().len(), 2);
        assert_eq!(partition.group_of(&ParticipantId::new("p3")), Some(2));

        let mut expected = snapshot.clone();
        expected.groups.swap(0, 1);
        assert_eq!(partition.to_snapshot(), expected);
    }

    #[test]
    fn snapshot_with_unknown_member_is_rejected() {
        let snapshot = PartitionSnapshot {
            groups: vec![SnapshotGroup {
                group_number: 1,
                leader_id: None,
                members: vec![SnapshotMember {
                    id: ParticipantId::new("ghost"),
                    strengths: vec![],
                    attention: vec![],
                }],
            }],
        };

        let result = Partition::from_snapshot(&snapshot, &roster());
        assert!(matches!(result, Err(ModelError::UnknownParticipant(id)) if id.as_str() == "ghost"));
    }
}
