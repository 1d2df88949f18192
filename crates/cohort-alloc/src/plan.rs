//! Random division plans
//!
//! A plan is computed first and committed later, so the caller can confirm
//! uneven groups or the replacement of an existing division.

use crate::error::{AllocError, ConfirmationReason};
use cohort_model::{Group, Participant, Partition};
use rand::seq::SliceRandom;
use rand::Rng;

/// A proposed random division awaiting commit
#[derive(Debug, Clone, PartialEq)]
pub struct DivisionPlan {
    pub(crate) partition: Partition,
    pub(crate) group_size: usize,
    pub(crate) participant_count: usize,
    pub(crate) replaces_existing: bool,
}

impl DivisionPlan {
    /// The partition this plan would install
    #[inline]
    #[must_use]
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// Group size used to slice
    #[inline]
    #[must_use]
    pub fn group_size(&self) -> usize {
        self.group_size
    }

    /// Members in the final, short group; 0 when the division is even
    #[inline]
    #[must_use]
    pub fn remainder(&self) -> usize {
        self.participant_count % self.group_size
    }

    /// Whether the last group is smaller than the others
    #[inline]
    #[must_use]
    pub fn is_uneven(&self) -> bool {
        self.remainder() != 0
    }

    /// Whether committing replaces a non-empty partition
    #[inline]
    #[must_use]
    pub fn replaces_existing(&self) -> bool {
        self.replaces_existing
    }

    /// First reason the caller must confirm before commit, if any
    #[must_use]
    pub fn confirmation_reason(&self) -> Option<ConfirmationReason> {
        if self.replaces_existing {
            Some(ConfirmationReason::ReplacesExisting)
        } else if self.is_uneven() {
            Some(ConfirmationReason::UnevenGroups)
        } else {
            None
        }
    }
}

/// Shuffle and slice participants into groups of `group_size`
///
/// Groups are numbered 1..N in chunk order; each group's first member leads.
///
/// # Errors
/// - `AllocError::InvalidGroupSize` if `group_size` is 0
pub fn divide<R: Rng + ?Sized>(
    mut participants: Vec<Participant>,
    group_size: usize,
    rng: &mut R,
) -> Result<Partition, AllocError> {
    if group_size == 0 {
        return Err(AllocError::InvalidGroupSize(group_size));
    }

    participants.shuffle(rng);

    let groups = participants
        .chunks(group_size)
        .zip(1u32..)
        .map(|(chunk, number)| {
            let mut group = Group::new(number);
            group.members = chunk.to_vec();
            group.leader_id = chunk.first().map(|p| p.id.clone());
            group
        })
        .collect();

    Ok(Partition::from_groups(groups)?)
}
