//! Participants and the authoritative roster
//!
//! The roster is owned by an external collaborator and is read-only here.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Opaque, unique participant identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Create identifier from any string
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ParticipantId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::borrow::Borrow<str> for ParticipantId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A person eligible for assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Unique identifier
    pub id: ParticipantId,
    /// Name shown to operators
    pub display_name: String,
    /// Contact address, when the roster knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Form answers, opaque to the engine
    #[serde(default)]
    pub answers: Map<String, Value>,
}

impl Participant {
    /// Create participant with no email and no answers
    #[must_use]
    pub fn new(id: impl Into<ParticipantId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            email: None,
            answers: Map::new(),
        }
    }

    /// With email
    #[inline]
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// With a single form answer
    #[inline]
    #[must_use]
    pub fn with_answer(mut self, question: impl Into<String>, answer: Value) -> Self {
        self.answers.insert(question.into(), answer);
        self
    }
}

/// Authoritative list of participants for a class/session
///
/// Keeps roster order for display and an id index for lookups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    participants: Vec<Participant>,
    index: HashMap<ParticipantId, usize>,
}

impl Roster {
    /// Build roster, rejecting repeated ids
    ///
    /// # Errors
    /// - `ModelError::DuplicateRosterId` if two participants share an id
    pub fn new(participants: Vec<Participant>) -> Result<Self, ModelError> {
        let mut index = HashMap::with_capacity(participants.len());
        for (i, participant) in participants.iter().enumerate() {
            if index.insert(participant.id.clone(), i).is_some() {
                return Err(ModelError::DuplicateRosterId(participant.id.clone()));
            }
        }
        Ok(Self {
            participants,
            index,
        })
    }

    /// Empty roster
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up participant by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Participant> {
        self.index.get(id).map(|&i| &self.participants[i])
    }

    /// Whether the id belongs to the roster
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Participants in roster order
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter()
    }

    /// Participants as a slice
    #[inline]
    #[must_use]
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Number of participants
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Whether the roster is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

impl<'a> IntoIterator for &'a Roster {
    type Item = &'a Participant;
    type IntoIter = std::slice::Iter<'a, Participant>;

    fn into_iter(self) -> Self::IntoIter {
        self.participants.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_lookup_by_id() {
        let roster = Roster::new(vec![
            Participant::new("p1", "Ana"),
            Participant::new("p2", "Bo").with_email("bo@example.com"),
        ])
        .unwrap();

        assert_eq!(roster.len(), 2);
        assert!(roster.contains("p1"));
        assert!(!roster.contains("p3"));
        assert_eq!(roster.get("p2").unwrap().email.as_deref(), Some("bo@example.com"));
    }

    #[test]
    fn roster_rejects_duplicate_ids() {
        let result = Roster::new(vec![Participant::new("p1", "Ana"), Participant::new("p1", "Ann")]);
        assert!(matches!(result, Err(ModelError::DuplicateRosterId(id)) if id.as_str() == "p1"));
    }

    #[test]
    fn participant_serializes_camel_case() {
        let participant = Participant::new("p1", "Ana").with_answer("q1", Value::from("yes"));
        let json = serde_json::to_value(&participant).unwrap();

        assert_eq!(json["displayName"], "Ana");
        assert_eq!(json["answers"]["q1"], "yes");
        assert!(json.get("email").is_none());
    }
}
