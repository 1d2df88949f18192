//! Allocation engine
//!
//! Owns the current [`Partition`] for one session together with the roster
//! and the configured group size. Every operation runs to completion and
//! leaves the partition invariants intact.

use crate::error::{AllocError, ConfirmationReason};
use crate::plan::{divide, DivisionPlan};
use cohort_model::{
    AssignmentProposal, Group, MemberNotes, Participant, ParticipantId, Partition,
    PartitionSnapshot, Roster,
};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Result of a manual move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Participant already in the target group
    Unchanged,
    /// Participant moved
    Moved {
        /// Previous group, `None` if unassigned
        from: Option<u32>,
        /// Target group
        to: u32,
    },
}

/// Every group is at capacity; the caller must choose how to proceed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityConflict {
    /// Participant waiting for placement
    pub participant_id: ParticipantId,
    /// Groups that exist right now
    pub group_count: usize,
    /// Configured capacity per group
    pub group_size: usize,
}

/// Caller's answer to a [`CapacityConflict`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictChoice {
    /// Put the participant in a random existing group, one over capacity
    Overfill,
    /// Open a new group holding only the participant
    NewGroup,
}

/// Result of a random single-participant placement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Placed into a group with spare capacity
    Placed {
        /// Chosen group
        group_number: u32,
    },
    /// No group has room; nothing was changed
    Conflict(CapacityConflict),
}

/// Fill levels used by capacity and completeness displays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacitySummary {
    /// Configured capacity per group
    pub group_size: usize,
    /// Number of groups
    pub groups: usize,
    /// Participants in some group
    pub assigned: usize,
    /// Roster participants in no group
    pub unassigned: usize,
    /// Groups exactly at capacity
    pub full_groups: usize,
    /// Groups beyond capacity
    pub over_capacity_groups: usize,
}

/// Stateful owner of the current partition
#[derive(Debug, Clone)]
pub struct AllocationEngine {
    roster: Roster,
    partition: Partition,
    group_size: usize,
}

impl AllocationEngine {
    /// Engine with an empty partition
    ///
    /// # Errors
    /// - `AllocError::InvalidGroupSize` if `group_size` is 0
    pub fn new(roster: Roster, group_size: usize) -> Result<Self, AllocError> {
        if group_size == 0 {
            return Err(AllocError::InvalidGroupSize(group_size));
        }
        Ok(Self {
            roster,
            partition: Partition::new(),
            group_size,
        })
    }

    /// Roster this engine allocates from
    #[inline]
    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Current partition
    #[inline]
    #[must_use]
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// Consume the engine, keeping the partition
    #[inline]
    #[must_use]
    pub fn into_partition(self) -> Partition {
        self.partition
    }

    /// Configured capacity per group
    #[inline]
    #[must_use]
    pub fn group_size(&self) -> usize {
        self.group_size
    }

    /// Change the capacity per group
    ///
    /// # Errors
    /// - `AllocError::InvalidGroupSize` if `group_size` is 0
    pub fn set_group_size(&mut self, group_size: usize) -> Result<(), AllocError> {
        if group_size == 0 {
            return Err(AllocError::InvalidGroupSize(group_size));
        }
        self.group_size = group_size;
        Ok(())
    }

    /// Plan a fresh random division; the partition must be empty
    ///
    /// # Errors
    /// - `AllocError::PartitionNotEmpty` if groups already exist
    /// - `AllocError::InvalidGroupSize`, `UnknownParticipant`, `DuplicateParticipant`
    pub fn partition_randomly(
        &self,
        participants: &[Participant],
        group_size: usize,
    ) -> Result<DivisionPlan, AllocError> {
        self.partition_randomly_with(participants, group_size, &mut rand::rng())
    }

    /// [`partition_randomly`](Self::partition_randomly) with a caller-supplied source of randomness
    ///
    /// # Errors
    /// See [`partition_randomly`](Self::partition_randomly).
    pub fn partition_randomly_with<R: Rng + ?Sized>(
        &self,
        participants: &[Participant],
        group_size: usize,
        rng: &mut R,
    ) -> Result<DivisionPlan, AllocError> {
        if !self.partition.is_empty() {
            return Err(AllocError::PartitionNotEmpty);
        }
        self.plan(participants, group_size, rng)
    }

    /// Plan a random division that replaces the current one
    ///
    /// # Errors
    /// - `AllocError::InvalidGroupSize`, `UnknownParticipant`, `DuplicateParticipant`
    pub fn reorganize(
        &self,
        participants: &[Participant],
        group_size: usize,
    ) -> Result<DivisionPlan, AllocError> {
        self.reorganize_with(participants, group_size, &mut rand::rng())
    }

    /// [`reorganize`](Self::reorganize) with a caller-supplied source of randomness
    ///
    /// # Errors
    /// See [`reorganize`](Self::reorganize).
    pub fn reorganize_with<R: Rng + ?Sized>(
        &self,
        participants: &[Participant],
        group_size: usize,
        rng: &mut R,
    ) -> Result<DivisionPlan, AllocError> {
        self.plan(participants, group_size, rng)
    }

    fn plan<R: Rng + ?Sized>(
        &self,
        participants: &[Participant],
        group_size: usize,
        rng: &mut R,
    ) -> Result<DivisionPlan, AllocError> {
        let mut seen = HashSet::new();
        for participant in participants {
            if !self.roster.contains(participant.id.as_str()) {
                return Err(AllocError::UnknownParticipant(participant.id.clone()));
            }
            if !seen.insert(&participant.id) {
                return Err(AllocError::DuplicateParticipant(participant.id.clone()));
            }
        }

        let partition = divide(participants.to_vec(), group_size, rng)?;
        Ok(DivisionPlan {
            partition,
            group_size,
            participant_count: participants.len(),
            replaces_existing: !self.partition.is_empty(),
        })
    }

    /// Install a plan
    ///
    /// Plans that are uneven, or that would replace a non-empty partition,
    /// need `confirmed = true`.
    ///
    /// # Errors
    /// - `AllocError::ConfirmationRequired` if confirmation is needed but absent
    pub fn commit(&mut self, plan: DivisionPlan, confirmed: bool) -> Result<(), AllocError> {
        let reason = if self.partition.is_empty() {
            plan.is_uneven().then_some(ConfirmationReason::UnevenGroups)
        } else {
            Some(ConfirmationReason::ReplacesExisting)
        };
        if let Some(reason) = reason {
            if !confirmed {
                return Err(AllocError::ConfirmationRequired(reason));
            }
        }

        tracing::info!(
            groups = plan.partition.len(),
            group_size = plan.group_size,
            "committing random division"
        );
        self.group_size = plan.group_size;
        self.partition = plan.partition;
        self.debug_check();
        Ok(())
    }

    /// Replace the partition with a validated proposal
    ///
    /// Groups are taken in number order and renumbered 1..N; producer notes
    /// are kept per member.
    ///
    /// # Errors
    /// - `AllocError::UnknownParticipant` for members missing from the roster
    /// - `AllocError::InvalidPartition` if the proposal breaks an invariant
    pub fn accept_proposal(&mut self, proposal: &AssignmentProposal) -> Result<(), AllocError> {
        let mut ordered: Vec<_> = proposal.groups.iter().collect();
        ordered.sort_by_key(|g| g.group_number);

        let mut groups = Vec::with_capacity(ordered.len());
        let mut notes = Vec::new();
        for proposed in ordered {
            let mut group = Group::new(proposed.group_number);
            for member in &proposed.members {
                let participant = self
                    .roster
                    .get(member.id.as_str())
                    .ok_or_else(|| AllocError::UnknownParticipant(member.id.clone()))?;
                group.members.push(participant.clone());
                notes.push((
                    member.id.clone(),
                    MemberNotes {
                        strengths: member.strengths.clone(),
                        attention: member.attention.clone(),
                    },
                ));
            }
            group.leader_id = Some(proposed.leader_id.clone());
            groups.push(group);
        }

        let mut partition = Partition::from_groups(groups)?;
        for (id, member_notes) in notes {
            partition.set_notes(id, member_notes);
        }

        tracing::info!(groups = partition.len(), "accepted proposal into partition");
        self.partition = partition;
        Ok(())
    }

    /// Replace the partition with a stored snapshot
    ///
    /// # Errors
    /// - `AllocError::InvalidPartition` if the snapshot does not fit the roster
    pub fn restore(&mut self, snapshot: &PartitionSnapshot) -> Result<(), AllocError> {
        self.partition = Partition::from_snapshot(snapshot, &self.roster)?;
        Ok(())
    }

    /// Stored form of the current partition
    #[must_use]
    pub fn snapshot(&self) -> PartitionSnapshot {
        self.partition.to_snapshot()
    }

    /// Move a participant into a group
    ///
    /// Removes them from their current group first. Moving into the group
    /// they are already in changes nothing. Never assigns a leader.
    ///
    /// # Errors
    /// - `AllocError::UnknownParticipant` if not on the roster
    /// - `AllocError::UnknownGroup` if the target does not exist
    pub fn move_participant(
        &mut self,
        participant_id: &ParticipantId,
        target: u32,
    ) -> Result<MoveOutcome, AllocError> {
        let participant = self.roster_entry(participant_id)?.clone();
        if self.partition.group(target).is_none() {
            return Err(AllocError::UnknownGroup(target));
        }
        if self.partition.group_of(participant_id) == Some(target) {
            return Ok(MoveOutcome::Unchanged);
        }

        let from = self.partition.detach(participant_id).map(|(number, _)| number);
        if let Some(group) = self.partition.group_mut(target) {
            group.members.push(participant);
        }

        tracing::debug!(participant = %participant_id, ?from, to = target, "moved participant");
        self.debug_check();
        Ok(MoveOutcome::Moved { from, to: target })
    }

    /// Place a participant into a random group with spare capacity
    ///
    /// # Errors
    /// - `AllocError::UnknownParticipant` if not on the roster
    pub fn randomize_participant(
        &mut self,
        participant_id: &ParticipantId,
    ) -> Result<Placement, AllocError> {
        self.randomize_participant_with(participant_id, &mut rand::rng())
    }

    /// [`randomize_participant`](Self::randomize_participant) with a caller-supplied source of randomness
    ///
    /// # Errors
    /// See [`randomize_participant`](Self::randomize_participant).
    pub fn randomize_participant_with<R: Rng + ?Sized>(
        &mut self,
        participant_id: &ParticipantId,
        rng: &mut R,
    ) -> Result<Placement, AllocError> {
        self.roster_entry(participant_id)?;

        let open: Vec<u32> = self
            .partition
            .groups()
            .iter()
            .filter(|g| g.len() < self.group_size)
            .map(|g| g.group_number)
            .collect();

        let Some(&target) = open.choose(rng) else {
            tracing::debug!(participant = %participant_id, "every group is full");
            return Ok(Placement::Conflict(CapacityConflict {
                participant_id: participant_id.clone(),
                group_count: self.partition.len(),
                group_size: self.group_size,
            }));
        };

        self.move_participant(participant_id, target)?;
        Ok(Placement::Placed {
            group_number: target,
        })
    }

    /// Settle a capacity conflict the way the caller chose
    ///
    /// Returns the number of the group the participant ended up in.
    ///
    /// # Errors
    /// - `AllocError::UnknownParticipant` if not on the roster
    /// - `AllocError::NoGroups` when overfilling with no groups
    pub fn resolve_conflict(
        &mut self,
        conflict: &CapacityConflict,
        choice: ConflictChoice,
    ) -> Result<u32, AllocError> {
        self.resolve_conflict_with(conflict, choice, &mut rand::rng())
    }

    /// [`resolve_conflict`](Self::resolve_conflict) with a caller-supplied source of randomness
    ///
    /// # Errors
    /// See [`resolve_conflict`](Self::resolve_conflict).
    pub fn resolve_conflict_with<R: Rng + ?Sized>(
        &mut self,
        conflict: &CapacityConflict,
        choice: ConflictChoice,
        rng: &mut R,
    ) -> Result<u32, AllocError> {
        let id = &conflict.participant_id;
        let participant = self.roster_entry(id)?.clone();

        match choice {
            ConflictChoice::Overfill => {
                let current = self.partition.group_of(id);
                let others: Vec<u32> = self
                    .partition
                    .groups()
                    .iter()
                    .map(|g| g.group_number)
                    .filter(|&n| Some(n) != current)
                    .collect();
                let target = match (others.choose(rng), current) {
                    (Some(&n), _) | (None, Some(n)) => n,
                    (None, None) => return Err(AllocError::NoGroups),
                };
                self.move_participant(id, target)?;
                Ok(target)
            }
            ConflictChoice::NewGroup => {
                self.partition.detach(id);
                let group = self.partition.push_group();
                group.members.push(participant);
                let number = group.group_number;
                tracing::debug!(participant = %id, group = number, "opened new group");
                self.debug_check();
                Ok(number)
            }
        }
    }

    /// Make a member the group's leader
    ///
    /// # Errors
    /// - `AllocError::UnknownGroup` if the group does not exist
    /// - `AllocError::LeaderNotInGroup` if the participant is not a member
    pub fn set_leader(
        &mut self,
        group_number: u32,
        participant_id: &ParticipantId,
    ) -> Result<(), AllocError> {
        let group = self
            .partition
            .group_mut(group_number)
            .ok_or(AllocError::UnknownGroup(group_number))?;
        if !group.contains(participant_id) {
            return Err(AllocError::LeaderNotInGroup {
                group_number,
                participant_id: participant_id.clone(),
            });
        }
        group.leader_id = Some(participant_id.clone());
        Ok(())
    }

    /// Take a participant out of their group
    ///
    /// Returns the group they left, `None` if they were unassigned.
    pub fn unassign(&mut self, participant_id: &ParticipantId) -> Option<u32> {
        let (number, _) = self.partition.detach(participant_id)?;
        self.partition.clear_notes(participant_id);
        self.debug_check();
        Some(number)
    }

    /// Delete a group; its members become unassigned and the rest renumber
    ///
    /// # Errors
    /// - `AllocError::UnknownGroup` if the group does not exist
    pub fn remove_group(&mut self, group_number: u32) -> Result<Group, AllocError> {
        let removed = self
            .partition
            .remove_group(group_number)
            .ok_or(AllocError::UnknownGroup(group_number))?;
        tracing::debug!(group = group_number, released = removed.len(), "removed group");
        self.debug_check();
        Ok(removed)
    }

    /// Roster participants not in any group, in roster order
    #[must_use]
    pub fn unassigned_participants(&self) -> Vec<&Participant> {
        let assigned = self.partition.assigned_ids();
        self.roster
            .iter()
            .filter(|p| !assigned.contains(&p.id))
            .collect()
    }

    /// Fill levels for displays
    #[must_use]
    pub fn capacity_summary(&self) -> CapacitySummary {
        let groups = self.partition.groups();
        CapacitySummary {
            group_size: self.group_size,
            groups: groups.len(),
            assigned: self.partition.assigned_count(),
            unassigned: self.unassigned_participants().len(),
            full_groups: groups.iter().filter(|g| g.len() == self.group_size).count(),
            over_capacity_groups: groups.iter().filter(|g| g.len() > self.group_size).count(),
        }
    }

    fn roster_entry(&self, id: &ParticipantId) -> Result<&Participant, AllocError> {
        self.roster
            .get(id.as_str())
            .ok_or_else(|| AllocError::UnknownParticipant(id.clone()))
    }

    fn debug_check(&self) {
        debug_assert!(
            self.partition.check_invariants().is_ok(),
            "partition invariant broken: {:?}",
            self.partition.check_invariants()
        );
    }
}
