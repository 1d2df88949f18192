//! In-memory collaborators for session tests.

#![allow(dead_code)]

use async_trait::async_trait;
use cohort_core::{
    CollaboratorError, Collaborators, DeliveryPayload, DivisionId, DivisionStore, ProposalRequest,
    ProposalSource, RosterSource, SecondaryDelivery,
};
use cohort_model::{Participant, PartitionSnapshot};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Roster source returning a fixed list, or failing
pub struct StaticRoster(pub Result<Vec<Participant>, CollaboratorError>);

#[async_trait]
impl RosterSource for StaticRoster {
    async fn load_roster(&self, _class_id: &str) -> Result<Vec<Participant>, CollaboratorError> {
        self.0.clone()
    }
}

/// Proposal source replaying one scripted answer and recording requests
pub struct ScriptedProposals {
    answer: Result<Value, CollaboratorError>,
    pub requests: Mutex<Vec<ProposalRequest>>,
}

impl ScriptedProposals {
    pub fn answering(payload: Value) -> Self {
        Self {
            answer: Ok(payload),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            answer: Err(CollaboratorError::new("proposal source", message)),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ProposalSource for ScriptedProposals {
    async fn request_proposal(&self, request: &ProposalRequest) -> Result<Value, CollaboratorError> {
        self.requests.lock().await.push(request.clone());
        self.answer.clone()
    }
}

/// Division store backed by a map
#[derive(Default)]
pub struct MemoryStore {
    pub divisions: Mutex<HashMap<DivisionId, PartitionSnapshot>>,
    pub fail_with: Option<String>,
}

impl MemoryStore {
    pub fn failing(message: &str) -> Self {
        Self {
            divisions: Mutex::default(),
            fail_with: Some(message.to_string()),
        }
    }

    fn check(&self) -> Result<(), CollaboratorError> {
        match &self.fail_with {
            Some(message) => Err(CollaboratorError::new("division store", message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DivisionStore for MemoryStore {
    async fn save(&self, id: DivisionId, snapshot: &PartitionSnapshot) -> Result<(), CollaboratorError> {
        self.check()?;
        self.divisions.lock().await.insert(id, snapshot.clone());
        Ok(())
    }

    async fn load(&self, id: DivisionId) -> Result<Option<PartitionSnapshot>, CollaboratorError> {
        self.check()?;
        Ok(self.divisions.lock().await.get(&id).cloned())
    }
}

/// Delivery that records payloads, optionally failing after recording
#[derive(Default)]
pub struct RecordingDelivery {
    pub delivered: Mutex<Vec<DeliveryPayload>>,
    pub fail: bool,
}

#[async_trait]
impl SecondaryDelivery for RecordingDelivery {
    async fn deliver(&self, payload: DeliveryPayload) -> Result<(), CollaboratorError> {
        self.delivered.lock().await.push(payload);
        if self.fail {
            Err(CollaboratorError::new("secondary delivery", "endpoint unreachable"))
        } else {
            Ok(())
        }
    }
}

/// Fakes plus the `Collaborators` bundle pointing at them
pub struct Fakes {
    pub proposals: Arc<ScriptedProposals>,
    pub store: Arc<MemoryStore>,
    pub delivery: Arc<RecordingDelivery>,
}

impl Fakes {
    pub fn new(proposals: ScriptedProposals) -> Self {
        Self::with(proposals, MemoryStore::default(), RecordingDelivery::default())
    }

    pub fn with(proposals: ScriptedProposals, store: MemoryStore, delivery: RecordingDelivery) -> Self {
        Self {
            proposals: Arc::new(proposals),
            store: Arc::new(store),
            delivery: Arc::new(delivery),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            proposals: self.proposals.clone(),
            store: self.store.clone(),
            delivery: self.delivery.clone(),
        }
    }
}
