//! Grouping session
//!
//! One session per class: owns the allocation engine and drives the
//! collaborators around it.
//!
//! # Lifecycle
//!
//! ```text
//! open (roster) → request_automated_division ─┬─ Accepted ──────────────┐
//!                                            └─ Fallback(plan) → commit ┤
//!                         manual edits via engine_mut() ────────────────┤
//!                                                                       └→ save → DeliveryHandle
//! ```

use crate::collaborators::{
    CollaboratorError, DeliveryPayload, DivisionId, DivisionStore, ProposalRequest, ProposalSource,
    RosterSource, SecondaryDelivery,
};
use crate::config::EngineConfig;
use crate::error::{SessionError, SessionResult};
use crate::pipeline::IngestionPipeline;
use cohort_alloc::{AllocationEngine, DivisionPlan};
use cohort_ingest::{RepairAction, ValidationReport};
use cohort_model::Roster;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Collaborators a session talks to after the roster is loaded
#[derive(Clone)]
pub struct Collaborators {
    /// Producer of automated proposals
    pub proposals: Arc<dyn ProposalSource>,
    /// Durable division storage
    pub store: Arc<dyn DivisionStore>,
    /// Best-effort downstream relay
    pub delivery: Arc<dyn SecondaryDelivery>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Result of asking for an automated division
#[derive(Debug)]
pub enum AutomatedDivision {
    /// Proposal installed into the engine
    Accepted {
        /// Final integrity report; valid, possibly with warnings
        report: ValidationReport,
        /// Fixes applied before acceptance
        repairs: Vec<RepairAction>,
    },
    /// Automated grouping failed; a random plan is offered instead
    Fallback {
        /// Why the automated path failed
        reason: SessionError,
        /// Plan to commit through the engine, with confirmation if needed
        plan: DivisionPlan,
    },
}

/// Pending best-effort delivery
///
/// Dropping the handle lets the delivery finish in the background.
#[derive(Debug)]
pub struct DeliveryHandle {
    task: Option<JoinHandle<Result<(), CollaboratorError>>>,
}

impl DeliveryHandle {
    /// Handle for a delivery that was never started
    #[inline]
    #[must_use]
    pub fn skipped() -> Self {
        Self { task: None }
    }

    /// Whether a delivery was started
    #[inline]
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.task.is_some()
    }

    /// Wait for the delivery; a failure comes back as a warning to show, never an error
    pub async fn warning(self) -> Option<String> {
        let task = self.task?;
        match task.await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "secondary delivery failed");
                Some(e.to_string())
            }
            Err(e) => {
                tracing::warn!(error = %e, "secondary delivery task did not complete");
                Some(format!("secondary delivery did not complete: {e}"))
            }
        }
    }
}

/// Receipt for a saved division
#[derive(Debug)]
pub struct SaveReceipt {
    /// Where the division was stored
    pub division_id: DivisionId,
    /// The secondary delivery, if one was started
    pub delivery: DeliveryHandle,
}

/// Grouping session for one class
pub struct GroupingSession {
    config: EngineConfig,
    pipeline: IngestionPipeline,
    engine: AllocationEngine,
    collaborators: Collaborators,
}

impl std::fmt::Debug for GroupingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupingSession")
            .field("config", &self.config)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl GroupingSession {
    /// Open a session with an already-loaded roster
    ///
    /// # Errors
    /// - `SessionError::Config` for an invalid configuration
    pub fn new(config: EngineConfig, roster: Roster, collaborators: Collaborators) -> SessionResult<Self> {
        config.validate()?;
        let engine = AllocationEngine::new(roster, config.group_size)?;
        Ok(Self {
            pipeline: IngestionPipeline::new(&config),
            config,
            engine,
            collaborators,
        })
    }

    /// Load the roster for `class_id` and open a session on it
    ///
    /// # Errors
    /// - `SessionError::Roster` if the roster source fails
    /// - `SessionError::InvalidRoster` if it lists a participant twice
    /// - `SessionError::Config` for an invalid configuration
    pub async fn load_roster(
        config: EngineConfig,
        class_id: &str,
        source: &dyn RosterSource,
        collaborators: Collaborators,
    ) -> SessionResult<Self> {
        let participants = source
            .load_roster(class_id)
            .await
            .map_err(SessionError::Roster)?;
        let roster = Roster::new(participants)?;
        tracing::info!(class_id, participants = roster.len(), "roster loaded");
        Self::new(config, roster, collaborators)
    }

    /// Session configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Allocation engine
    #[inline]
    #[must_use]
    pub fn engine(&self) -> &AllocationEngine {
        &self.engine
    }

    /// Allocation engine, for manual edits and committing plans
    #[inline]
    pub fn engine_mut(&mut self) -> &mut AllocationEngine {
        &mut self.engine
    }

    /// Ask the proposal source for a division and install it
    ///
    /// When the source fails or its proposal cannot be accepted, a random
    /// plan over the whole roster is offered instead if fallback is enabled.
    /// The current partition is left untouched in that case.
    ///
    /// # Errors
    /// - `SessionError::Proposal` / `SessionError::Ingestion` when fallback is disabled
    /// - `SessionError::Allocation` if the fallback plan cannot be built
    pub async fn request_automated_division(
        &mut self,
        project_description: &str,
    ) -> SessionResult<AutomatedDivision> {
        match self.try_automated(project_description).await {
            Ok((report, repairs)) => Ok(AutomatedDivision::Accepted { report, repairs }),
            Err(reason) if self.config.fallback_to_random => {
                tracing::warn!(error = %reason, "automated grouping failed; offering random division");
                let plan = self
                    .engine
                    .reorganize(self.engine.roster().participants(), self.engine.group_size())?;
                Ok(AutomatedDivision::Fallback { reason, plan })
            }
            Err(reason) => Err(reason),
        }
    }

    async fn try_automated(
        &mut self,
        project_description: &str,
    ) -> SessionResult<(ValidationReport, Vec<RepairAction>)> {
        let request = ProposalRequest {
            participants: self.engine.roster().participants().to_vec(),
            group_size: self.engine.group_size(),
            project_description: project_description.to_string(),
        };
        let raw = self
            .collaborators
            .proposals
            .request_proposal(&request)
            .await
            .map_err(SessionError::Proposal)?;

        let accepted = self.pipeline.ingest(raw, self.engine.roster())?;
        self.engine.accept_proposal(&accepted.proposal)?;
        Ok((accepted.report, accepted.repairs))
    }

    /// Persist the current division, then start the secondary delivery
    ///
    /// Persistence is awaited; delivery is not. Its outcome is available
    /// through the returned handle and never fails the save.
    ///
    /// # Errors
    /// - `SessionError::Persistence` if the store fails
    pub async fn save(&self, division_id: DivisionId, project_description: &str) -> SessionResult<SaveReceipt> {
        let snapshot = self.engine.snapshot();
        self.collaborators
            .store
            .save(division_id, &snapshot)
            .await
            .map_err(SessionError::Persistence)?;
        tracing::info!(%division_id, groups = snapshot.groups.len(), "division saved");

        let delivery = if self.config.secondary_delivery {
            let payload = DeliveryPayload::new(
                self.engine.group_size(),
                project_description,
                self.engine.roster().participants(),
            );
            let relay = Arc::clone(&self.collaborators.delivery);
            DeliveryHandle {
                task: Some(tokio::spawn(async move { relay.deliver(payload).await })),
            }
        } else {
            DeliveryHandle::skipped()
        };

        Ok(SaveReceipt {
            division_id,
            delivery,
        })
    }

    /// Replace the current division with a stored one
    ///
    /// Returns `false`, leaving the partition untouched, if nothing is stored
    /// under `division_id`.
    ///
    /// # Errors
    /// - `SessionError::Persistence` if the store fails
    /// - `SessionError::Allocation` if the stored division no longer fits the roster
    pub async fn load_division(&mut self, division_id: DivisionId) -> SessionResult<bool> {
        let stored = self
            .collaborators
            .store
            .load(division_id)
            .await
            .map_err(SessionError::Persistence)?;
        let Some(snapshot) = stored else {
            tracing::debug!(%division_id, "no stored division");
            return Ok(false);
        };
        self.engine.restore(&snapshot)?;
        tracing::info!(%division_id, groups = self.engine.partition().len(), "division loaded");
        Ok(true)
    }
}
