//! External collaborators
//!
//! The engine talks to the outside world only through these traits. Each
//! call is treated as an atomic black box; timeouts belong to the caller.

use async_trait::async_trait;
use cohort_model::{Participant, ParticipantId, PartitionSnapshot};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Identifier of a stored division
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DivisionId(pub Uuid);

impl DivisionId {
    /// Generate new division ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DivisionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DivisionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Failure reported by a collaborator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{collaborator} failed: {message}")]
pub struct CollaboratorError {
    /// Which collaborator failed
    pub collaborator: &'static str,
    /// What it reported
    pub message: String,
}

impl CollaboratorError {
    /// Create collaborator error
    pub fn new(collaborator: &'static str, message: impl Into<String>) -> Self {
        Self {
            collaborator,
            message: message.into(),
        }
    }
}

/// What the proposal source is asked for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalRequest {
    /// Roster snapshot
    pub participants: Vec<Participant>,
    /// Desired members per group
    pub group_size: usize,
    /// Free-text project description
    pub project_description: String,
}

/// Participant as seen by the secondary consumer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryParticipant {
    /// Participant id
    pub id: ParticipantId,
    /// Display name
    pub display_name: String,
    /// Form answers
    pub answers: Map<String, Value>,
}

/// Flattened view relayed to the secondary consumer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryPayload {
    /// Members per group
    pub group_size: usize,
    /// Free-text project description
    pub project_description: String,
    /// Everyone on the roster
    pub participants: Vec<DeliveryParticipant>,
}

impl DeliveryPayload {
    /// Flatten roster participants
    #[must_use]
    pub fn new<'a>(
        group_size: usize,
        project_description: impl Into<String>,
        participants: impl IntoIterator<Item = &'a Participant>,
    ) -> Self {
        Self {
            group_size,
            project_description: project_description.into(),
            participants: participants
                .into_iter()
                .map(|p| DeliveryParticipant {
                    id: p.id.clone(),
                    display_name: p.display_name.clone(),
                    answers: p.answers.clone(),
                })
                .collect(),
        }
    }
}

/// Supplies the authoritative roster
#[async_trait]
pub trait RosterSource: Send + Sync {
    /// Participants of a class/session
    async fn load_roster(&self, class_id: &str) -> Result<Vec<Participant>, CollaboratorError>;
}

/// Untrusted producer of assignment proposals
#[async_trait]
pub trait ProposalSource: Send + Sync {
    /// Raw payload for the request, in whatever shape the producer chose
    async fn request_proposal(&self, request: &ProposalRequest) -> Result<Value, CollaboratorError>;
}

/// Durable storage of divisions
#[async_trait]
pub trait DivisionStore: Send + Sync {
    /// Save snapshot
    async fn save(&self, id: DivisionId, snapshot: &PartitionSnapshot) -> Result<(), CollaboratorError>;

    /// Load snapshot, `None` if nothing is stored under `id`
    async fn load(&self, id: DivisionId) -> Result<Option<PartitionSnapshot>, CollaboratorError>;
}

/// Best-effort downstream relay
#[async_trait]
pub trait SecondaryDelivery: Send + Sync {
    /// Relay the payload
    async fn deliver(&self, payload: DeliveryPayload) -> Result<(), CollaboratorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_payload_flattens_roster() {
        let people = vec![Participant::new("p1", "Ana").with_answer("q1", Value::from(3))];
        let payload = DeliveryPayload::new(4, "robotics", &people);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["groupSize"], 4);
        assert_eq!(json["projectDescription"], "robotics");
        assert_eq!(json["participants"][0]["displayName"], "Ana");
        assert_eq!(json["participants"][0]["answers"]["q1"], 3);
    }

    #[test]
    fn collaborator_error_display() {
        let err = CollaboratorError::new("proposal source", "timed out");
        assert_eq!(err.to_string(), "proposal source failed: timed out");
    }
}
