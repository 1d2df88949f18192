//! The engine's authoritative grouping
//!
//! Invariants held by every [`Partition`] handed out by the engine:
//! - a participant id appears in at most one group
//! - a group's leader, when set, is one of its members
//! - group numbers are exactly `1..=N` in list order

use crate::error::ModelError;
use crate::participant::{Participant, ParticipantId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Producer notes kept for an assigned participant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberNotes {
    /// Short free-text strengths
    #[serde(default)]
    pub strengths: Vec<String>,
    /// Short free-text points of attention
    #[serde(default)]
    pub attention: Vec<String>,
}

impl MemberNotes {
    /// Whether both lists are empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strengths.is_empty() && self.attention.is_empty()
    }
}

/// One group of the partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Position-derived number, 1-based
    pub group_number: u32,
    /// Members in insertion order
    pub members: Vec<Participant>,
    /// Distinguished member, if any
    pub leader_id: Option<ParticipantId>,
}

impl Group {
    /// Empty group without a leader
    #[inline]
    #[must_use]
    pub fn new(group_number: u32) -> Self {
        Self {
            group_number,
            members: Vec::new(),
            leader_id: None,
        }
    }

    /// Whether the participant is a member
    #[must_use]
    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.members.iter().any(|m| &m.id == id)
    }

    /// Number of members
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the group has no members
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Remove a member, returning it if present
    ///
    /// A removed leader is replaced by the first remaining member.
    pub fn remove(&mut self, id: &ParticipantId) -> Option<Participant> {
        let idx = self.members.iter().position(|m| &m.id == id)?;
        let removed = self.members.remove(idx);
        if self.leader_id.as_ref() == Some(id) {
            self.leader_id = self.members.first().map(|m| m.id.clone());
        }
        Some(removed)
    }
}

/// Current division of participants into groups
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    groups: Vec<Group>,
    #[serde(default)]
    notes: BTreeMap<ParticipantId, MemberNotes>,
}

impl Partition {
    /// Empty partition
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from groups, numbering them 1..N in the given order
    ///
    /// # Errors
    /// Any invariant violation other than numbering.
    pub fn from_groups(groups: Vec<Group>) -> Result<Self, ModelError> {
        let mut partition = Self {
            groups,
            notes: BTreeMap::new(),
        };
        partition.renumber();
        partition.check_invariants()?;
        Ok(partition)
    }

    /// Groups in number order
    #[inline]
    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Mutable groups for engine-internal edits
    ///
    /// Callers must restore the invariants before handing the partition out.
    #[inline]
    pub fn groups_mut(&mut self) -> &mut Vec<Group> {
        &mut self.groups
    }

    /// Group by number
    #[must_use]
    pub fn group(&self, group_number: u32) -> Option<&Group> {
        self.groups.iter().find(|g| g.group_number == group_number)
    }

    /// Mutable group by number
    pub fn group_mut(&mut self, group_number: u32) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.group_number == group_number)
    }

    /// Number of the group holding the participant
    #[must_use]
    pub fn group_of(&self, id: &ParticipantId) -> Option<u32> {
        self.groups
            .iter()
            .find(|g| g.contains(id))
            .map(|g| g.group_number)
    }

    /// Whether the participant is in any group
    #[inline]
    #[must_use]
    pub fn is_assigned(&self, id: &ParticipantId) -> bool {
        self.group_of(id).is_some()
    }

    /// Highest group number, 0 when empty
    #[must_use]
    pub fn max_group_number(&self) -> u32 {
        self.groups.iter().map(|g| g.group_number).max().unwrap_or(0)
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

    /// Total members across all groups
    #[must_use]
    pub fn assigned_count(&self) -> usize {
        self.groups.iter().map(Group::len).sum()
    }

    /// Ids of every assigned participant
    #[must_use]
    pub fn assigned_ids(&self) -> HashSet<&ParticipantId> {
        self.groups
            .iter()
            .flat_map(|g| g.members.iter().map(|m| &m.id))
            .collect()
    }

    /// Append an empty group numbered one past the maximum
    pub fn push_group(&mut self) -> &mut Group {
        let number = self.max_group_number() + 1;
        self.groups.push(Group::new(number));
        let last = self.groups.len() - 1;
        &mut self.groups[last]
    }

    /// Remove a participant from whichever group holds them
    pub fn detach(&mut self, id: &ParticipantId) -> Option<(u32, Participant)> {
        self.groups
            .iter_mut()
            .find_map(|g| g.remove(id).map(|p| (g.group_number, p)))
    }

    /// Remove a group, then renumber the rest
    pub fn remove_group(&mut self, group_number: u32) -> Option<Group> {
        let idx = self
            .groups
            .iter()
            .position(|g| g.group_number == group_number)?;
        let removed = self.groups.remove(idx);
        for member in &removed.members {
            self.notes.remove(&member.id);
        }
        self.renumber();
        Some(removed)
    }

    /// Reassign group numbers 1..N in list order
    pub fn renumber(&mut self) {
        for (i, group) in self.groups.iter_mut().enumerate() {
            group.group_number = u32::try_from(i + 1).unwrap_or(u32::MAX);
        }
    }

    /// Notes for a participant
    #[must_use]
    pub fn notes(&self, id: &ParticipantId) -> Option<&MemberNotes> {
        self.notes.get(id)
    }

    /// Record notes for a participant
    pub fn set_notes(&mut self, id: ParticipantId, notes: MemberNotes) {
        if notes.is_empty() {
            self.notes.remove(&id);
        } else {
            self.notes.insert(id, notes);
        }
    }

    /// Drop notes for a participant
    pub fn clear_notes(&mut self, id: &ParticipantId) {
        self.notes.remove(id);
    }

    /// Verify the partition invariants
    ///
    /// # Errors
    /// The first violated invariant.
    pub fn check_invariants(&self) -> Result<(), ModelError> {
        let mut seen = HashSet::new();
        for group in &self.groups {
            for member in &group.members {
                if !seen.insert(&member.id) {
                    return Err(ModelError::DuplicateAssignment(member.id.clone()));
                }
            }
            if let Some(leader) = &group.leader_id {
                if !group.contains(leader) {
                    return Err(ModelError::LeaderOutsideGroup {
                        group_number: group.group_number,
                        leader_id: leader.clone(),
                    });
                }
            }
        }

        let numbers: Vec<u32> = self.groups.iter().map(|g| g.group_number).collect();
        let contiguous = numbers
            .iter()
            .zip(1u32..)
            .all(|(&found, expected)| found == expected);
        if !contiguous {
            return Err(ModelError::NonContiguousNumbering {
                expected_max: u32::try_from(numbers.len()).unwrap_or(u32::MAX),
                found: numbers,
            });
        }

        Ok(())
    }
}
