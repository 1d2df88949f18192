//! Session tests against in-memory collaborators.

mod common;

use common::{Fakes, MemoryStore, RecordingDelivery, ScriptedProposals, StaticRoster};
use cohort_core::{
    AutomatedDivision, CollaboratorError, DivisionId, EngineConfig, GroupingSession, IngestionError,
    SessionError,
};
use cohort_model::{AssignmentProposal, Participant, ParticipantId};
use cohort_test_utils::{group, init_tracing, participants, proposal_covering, roster, to_payload};
use pretty_assertions::assert_eq;
use serde_json::json;

fn config() -> EngineConfig {
    EngineConfig::new().with_group_size(3)
}

fn session(fakes: &Fakes, n: usize, config: EngineConfig) -> GroupingSession {
    GroupingSession::new(config, roster(n), fakes.collaborators()).unwrap()
}

// ============================================================================
// Roster loading
// ============================================================================

#[tokio::test]
async fn load_roster_opens_session() {
    init_tracing();
    let fakes = Fakes::new(ScriptedProposals::failing("unused"));
    let source = StaticRoster(Ok(participants(5)));

    let session = GroupingSession::load_roster(config(), "class-1", &source, fakes.collaborators())
        .await
        .unwrap();
    assert_eq!(session.engine().roster().len(), 5);
    assert_eq!(session.engine().group_size(), 3);
    assert!(session.engine().partition().is_empty());
}

#[tokio::test]
async fn roster_source_failure_is_reported() {
    let fakes = Fakes::new(ScriptedProposals::failing("unused"));
    let source = StaticRoster(Err(CollaboratorError::new("roster", "offline")));

    let err = GroupingSession::load_roster(config(), "class-1", &source, fakes.collaborators())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Roster(_)));
}

#[tokio::test]
async fn duplicate_roster_entries_are_rejected() {
    let fakes = Fakes::new(ScriptedProposals::failing("unused"));
    let source = StaticRoster(Ok(vec![Participant::new("p1", "Ana"), Participant::new("p1", "Ana")]));

    let err = GroupingSession::load_roster(config(), "class-1", &source, fakes.collaborators())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::InvalidRoster(_)));
}

#[test]
fn invalid_config_is_rejected() {
    let fakes = Fakes::new(ScriptedProposals::failing("unused"));
    let err = GroupingSession::new(EngineConfig::new().with_group_size(0), roster(2), fakes.collaborators())
        .unwrap_err();
    assert!(matches!(err, SessionError::Config(_)));
}

// ============================================================================
// Automated division
// ============================================================================

#[tokio::test]
async fn automated_proposal_is_installed() {
    let fakes = Fakes::new(ScriptedProposals::answering(to_payload(&proposal_covering(6, 3))));
    let mut session = session(&fakes, 6, config());

    let outcome = session.request_automated_division("weather station").await.unwrap();
    let AutomatedDivision::Accepted { report, repairs } = outcome else {
        panic!("expected accepted division");
    };
    assert!(report.is_valid);
    assert!(repairs.is_empty());

    let partition = session.engine().partition();
    assert_eq!(partition.len(), 2);
    assert!(partition.check_invariants().is_ok());
    assert_eq!(partition.notes(&ParticipantId::new("p2")).unwrap().strengths, vec!["organized"]);

    let requests = fakes.proposals.requests.lock().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].group_size, 3);
    assert_eq!(requests[0].participants.len(), 6);
    assert_eq!(requests[0].project_description, "weather station");
}

#[tokio::test]
async fn wrapped_and_fenced_payload_is_accepted() {
    let text = serde_json::to_string(&to_payload(&proposal_covering(4, 2))).unwrap();
    let raw = json!([{ "output": format!("```json\n{text}\n```") }]);
    let fakes = Fakes::new(ScriptedProposals::answering(raw));
    let mut session = session(&fakes, 4, config());

    let outcome = session.request_automated_division("").await.unwrap();
    assert!(matches!(outcome, AutomatedDivision::Accepted { .. }));
    assert_eq!(session.engine().partition().len(), 2);
}

#[tokio::test]
async fn repairable_proposal_reports_repairs() {
    let proposal = AssignmentProposal::new(vec![group(9, "p3", &["p3", "p4"]), group(4, "p1", &["p1", "p2"])]);
    let fakes = Fakes::new(ScriptedProposals::answering(to_payload(&proposal)));
    let mut session = session(&fakes, 4, config());

    let AutomatedDivision::Accepted { repairs, .. } = session.request_automated_division("").await.unwrap() else {
        panic!("expected accepted division");
    };
    assert_eq!(repairs.len(), 1);
    let numbers: Vec<u32> = session.engine().partition().groups().iter().map(|g| g.group_number).collect();
    assert_eq!(numbers, vec![1, 2]);
}

#[tokio::test]
async fn source_failure_falls_back_to_random_plan() {
    let fakes = Fakes::new(ScriptedProposals::failing("timed out"));
    let mut session = session(&fakes, 6, config());

    let outcome = session.request_automated_division("").await.unwrap();
    let AutomatedDivision::Fallback { reason, plan } = outcome else {
        panic!("expected fallback");
    };
    assert!(matches!(reason, SessionError::Proposal(_)));
    assert!(session.engine().partition().is_empty());
    assert_eq!(plan.partition().assigned_count(), 6);

    session.engine_mut().commit(plan, false).unwrap();
    assert_eq!(session.engine().partition().len(), 2);
    assert!(session.engine().unassigned_participants().is_empty());
}

#[tokio::test]
async fn rejected_proposal_falls_back_and_keeps_report() {
    let proposal = AssignmentProposal::new(vec![group(1, "p1", &["p1", "p2"])]);
    let fakes = Fakes::new(ScriptedProposals::answering(to_payload(&proposal)));
    let mut session = session(&fakes, 3, config());

    let AutomatedDivision::Fallback { reason, .. } = session.request_automated_division("").await.unwrap() else {
        panic!("expected fallback");
    };
    assert!(reason.requires_operator());
    let SessionError::Ingestion(IngestionError::Rejected(rejected)) = reason else {
        panic!("expected rejected proposal");
    };
    assert!(rejected.report.error_count() > 0);
}

#[tokio::test]
async fn without_fallback_the_failure_surfaces() {
    let fakes = Fakes::new(ScriptedProposals::answering(json!("no json here")));
    let mut session = session(&fakes, 3, config().with_fallback_to_random(false));

    let err = session.request_automated_division("").await.unwrap_err();
    assert!(matches!(err, SessionError::Ingestion(IngestionError::Payload(_))));
    assert!(!err.requires_operator());
}

// ============================================================================
// Save / load
// ============================================================================

#[tokio::test]
async fn save_then_load_restores_division() {
    let fakes = Fakes::new(ScriptedProposals::answering(to_payload(&proposal_covering(6, 3))));
    let mut session = session(&fakes, 6, config());
    session.request_automated_division("").await.unwrap();
    let before = session.engine().snapshot();

    let id = DivisionId::new();
    let receipt = session.save(id, "garden").await.unwrap();
    assert_eq!(receipt.division_id, id);
    assert_eq!(receipt.delivery.warning().await, None);

    session.engine_mut().unassign(&ParticipantId::new("p1"));
    assert!(session.load_division(id).await.unwrap());
    assert_eq!(session.engine().snapshot(), before);
}

#[tokio::test]
async fn delivery_receives_flattened_roster() {
    let fakes = Fakes::new(ScriptedProposals::failing("unused"));
    let session = session(&fakes, 4, config());

    let receipt = session.save(DivisionId::new(), "garden").await.unwrap();
    assert!(receipt.delivery.is_started());
    receipt.delivery.warning().await;

    let delivered = fakes.delivery.delivered.lock().await;
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].group_size, 3);
    assert_eq!(delivered[0].project_description, "garden");
    assert_eq!(delivered[0].participants.len(), 4);
}

#[tokio::test]
async fn delivery_failure_is_only_a_warning() {
    let fakes = Fakes::with(
        ScriptedProposals::failing("unused"),
        MemoryStore::default(),
        RecordingDelivery {
            fail: true,
            ..RecordingDelivery::default()
        },
    );
    let session = session(&fakes, 2, config());
    let id = DivisionId::new();

    let receipt = session.save(id, "").await.unwrap();
    let warning = receipt.delivery.warning().await.unwrap();
    assert!(warning.contains("endpoint unreachable"));
    assert!(fakes.store.divisions.lock().await.contains_key(&id));
}

#[tokio::test]
async fn delivery_can_be_disabled() {
    let fakes = Fakes::new(ScriptedProposals::failing("unused"));
    let session = session(&fakes, 2, config().with_secondary_delivery(false));

    let receipt = session.save(DivisionId::new(), "").await.unwrap();
    assert!(!receipt.delivery.is_started());
    assert_eq!(receipt.delivery.warning().await, None);
    assert!(fakes.delivery.delivered.lock().await.is_empty());
}

#[tokio::test]
async fn store_failure_fails_the_save_and_skips_delivery() {
    let fakes = Fakes::with(
        ScriptedProposals::failing("unused"),
        MemoryStore::failing("disk full"),
        RecordingDelivery::default(),
    );
    let session = session(&fakes, 2, config());

    let err = session.save(DivisionId::new(), "").await.unwrap_err();
    assert!(matches!(err, SessionError::Persistence(_)));
    assert!(fakes.delivery.delivered.lock().await.is_empty());
}

#[tokio::test]
async fn loading_unknown_division_changes_nothing() {
    let fakes = Fakes::new(ScriptedProposals::answering(to_payload(&proposal_covering(3, 3))));
    let mut session = session(&fakes, 3, config());
    session.request_automated_division("").await.unwrap();

    assert!(!session.load_division(DivisionId::new()).await.unwrap());
    assert_eq!(session.engine().partition().len(), 1);
}
