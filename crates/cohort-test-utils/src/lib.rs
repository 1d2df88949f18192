//! Testing utilities for Cohort workspace
//!
//! Shared roster and proposal fixtures.

#![allow(missing_docs)]

use cohort_model::{AssignmentProposal, Participant, ProposedGroup, ProposedMember, Roster};

/// Roster `p1..=pn`, named "Participant N"
pub fn roster(n: usize) -> Roster {
    Roster::new(
        (1..=n)
            .map(|i| Participant::new(format!("p{i}"), format!("Participant {i}")))
            .collect(),
    )
    .unwrap()
}

pub fn roster_of(entries: &[(&str, &str)]) -> Roster {
    Roster::new(
        entries
            .iter()
            .map(|(id, name)| Participant::new(*id, *name))
            .collect(),
    )
    .unwrap()
}

pub fn participants(n: usize) -> Vec<Participant> {
    roster(n).participants().to_vec()
}

/// Group whose members carry no notes and use their id as name
pub fn group(number: u32, leader: &str, ids: &[&str]) -> ProposedGroup {
    ProposedGroup::new(
        number,
        leader,
        ids.iter().map(|id| ProposedMember::new(*id, *id)).collect(),
    )
}

/// Group whose members all carry one strength and one point of attention
pub fn noted_group(number: u32, leader: &str, ids: &[&str]) -> ProposedGroup {
    ProposedGroup::new(
        number,
        leader,
        ids.iter()
            .map(|id| {
                ProposedMember::new(*id, *id)
                    .with_strengths(["organized"])
                    .with_attention(["quiet in meetings"])
            })
            .collect(),
    )
}

/// Proposal covering `p1..=pn` in consecutive groups of `size`
pub fn proposal_covering(n: usize, size: usize) -> AssignmentProposal {
    let ids: Vec<String> = (1..=n).map(|i| format!("p{i}")).collect();
    let groups = ids
        .chunks(size)
        .zip(1u32..)
        .map(|(chunk, number)| {
            let refs: Vec<&str> = chunk.iter().map(String::as_str).collect();
            noted_group(number, refs[0], &refs)
        })
        .collect();
    AssignmentProposal::new(groups)
}

/// Serialize a proposal the way the producer would, without artifacts
pub fn to_payload(proposal: &AssignmentProposal) -> serde_json::Value {
    serde_json::to_value(proposal).unwrap()
}

/// Install a test subscriber honoring `RUST_LOG`; safe to call repeatedly
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
