//! Integration tests for racing workers against a single store
//!
//! Workers hold no state of their own, so any number of them may attempt
//! the same transition at once. The version check on commit guarantees at
//! most one of them wins.

use fluxo_core::models::{
    replay, State, StateDecl, Transition, TransitionPayload, UserProfile, WorkflowDefinition,
};
use fluxo_core::workflow::{
    EngineError, GuardError, SolicitationStore, WorkflowEngine, WorkflowRegistry,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;
use tokio::sync::broadcast::error::TryRecvError;

fn pedido_definition() -> WorkflowDefinition {
    WorkflowDefinition {
        kind: "Pedido".to_string(),
        description: Some("Fluxo de aprovação de pedido".to_string()),
        states: vec![
            StateDecl::new("RASCUNHO", "Rascunho"),
            StateDecl::new("EM_ANALISE", "Em análise"),
            StateDecl::new("APROVADO", "Aprovado"),
        ],
        initial_state: State::from("RASCUNHO"),
        terminal_states: vec![State::from("APROVADO")],
        transitions: vec![
            Transition::new("enviar", &["RASCUNHO"], "EM_ANALISE", "SUBMIT"),
            Transition::new("aprovar", &["EM_ANALISE"], "APROVADO", "APPROVE"),
        ],
    }
}

fn create_engine(dir: &Path) -> Arc<WorkflowEngine> {
    let mut registry = WorkflowRegistry::new();
    registry.register(pedido_definition()).unwrap();
    let store = SolicitationStore::new(dir.join("solicitations.json")).unwrap();
    Arc::new(WorkflowEngine::new(Arc::new(registry), Arc::new(store)))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_workers_commit_exactly_once() {
    let dir = tempdir().unwrap();
    let engine = create_engine(dir.path());
    let record = engine.start("Pedido").unwrap();

    let mut handles = Vec::new();
    for worker in 0..8 {
        let engine = Arc::clone(&engine);
        let record_id = record.id;
        handles.push(tokio::spawn(async move {
            let actor = UserProfile::new(format!("trabalhadora-{worker}")).grant("SUBMIT");
            engine
                .fire(record_id, "enviar", &actor, TransitionPayload::default())
                .await
        }));
    }

    let mut successes = Vec::new();
    let mut failures = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(entry) => successes.push(entry),
            Err(err) => failures.push(err),
        }
    }

    assert_eq!(successes.len(), 1, "exactly one worker may win the race");
    assert_eq!(failures.len(), 7);
    assert_eq!(successes[0].from_state.as_str(), "RASCUNHO");
    assert_eq!(successes[0].to_state.as_str(), "EM_ANALISE");
    for failure in &failures {
        assert!(
            matches!(
                failure,
                EngineError::Rejected(GuardError::InvalidTransition { .. })
                    | EngineError::ConcurrentModification { .. }
            ),
            "losers must be rejected cleanly, got {failure:?}"
        );
    }

    let final_record = engine.store().get_record(record.id).unwrap();
    assert_eq!(final_record.current_state.as_str(), "EM_ANALISE");
    assert_eq!(final_record.version, 1);

    let history = engine.store().history(record.id);
    assert_eq!(history.len(), 1, "exactly one audit entry for one commit");
    assert_eq!(history[0].actor_id, successes[0].actor_id);

    let definition = engine.registry().get("Pedido").unwrap();
    let replayed = replay(&definition, &history).unwrap();
    assert_eq!(replayed, final_record.current_state);
}

#[tokio::test]
async fn test_interleaved_records_keep_separate_trails() {
    let dir = tempdir().unwrap();
    let engine = create_engine(dir.path());
    let submitter = UserProfile::new("maria").grant("SUBMIT");
    let approver = UserProfile::new("ana").grant("APPROVE");

    let first = engine.start("Pedido").unwrap();
    let second = engine.start("Pedido").unwrap();

    engine
        .fire(first.id, "enviar", &submitter, TransitionPayload::default())
        .await
        .unwrap();
    engine
        .fire(second.id, "enviar", &submitter, TransitionPayload::default())
        .await
        .unwrap();
    engine
        .fire(first.id, "aprovar", &approver, TransitionPayload::default())
        .await
        .unwrap();

    let first_trail = engine.store().history(first.id);
    let second_trail = engine.store().history(second.id);
    assert_eq!(first_trail.len(), 2);
    assert_eq!(second_trail.len(), 1);
    assert!(first_trail.iter().all(|entry| entry.record_id == first.id));
    assert!(second_trail.iter().all(|entry| entry.record_id == second.id));

    // Sequence numbers are store-wide, so the interleaving is visible
    assert_eq!(first_trail[0].sequence_no, 1);
    assert_eq!(second_trail[0].sequence_no, 2);
    assert_eq!(first_trail[1].sequence_no, 3);

    assert_eq!(
        engine.store().latest(first.id).unwrap().to_state.as_str(),
        "APROVADO"
    );
    assert_eq!(
        engine.store().latest(second.id).unwrap().to_state.as_str(),
        "EM_ANALISE"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_feed_sees_one_entry_for_a_won_race() {
    let dir = tempdir().unwrap();
    let engine = create_engine(dir.path());
    let record = engine.start("Pedido").unwrap();
    let mut watcher = engine.store().feed().subscribe();

    let mut handles = Vec::new();
    for worker in 0..6 {
        let engine = Arc::clone(&engine);
        let record_id = record.id;
        handles.push(tokio::spawn(async move {
            let actor = UserProfile::new(format!("trabalhadora-{worker}")).grant("SUBMIT");
            engine
                .fire(record_id, "enviar", &actor, TransitionPayload::default())
                .await
        }));
    }
    let mut wins = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            wins += 1;
        }
    }
    assert_eq!(wins, 1);

    let observed = watcher.recv().await.unwrap();
    assert_eq!(observed.record_id, record.id);
    assert_eq!(observed.transition, "enviar");
    assert!(matches!(watcher.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_feed_delivers_in_commit_order() {
    let dir = tempdir().unwrap();
    let engine = create_engine(dir.path());
    let submitter = UserProfile::new("maria").grant("SUBMIT");
    let approver = UserProfile::new("ana").grant("APPROVE");

    let record = engine.start("Pedido").unwrap();
    let mut watcher = engine.store().feed().subscribe_record(record.id);

    engine
        .fire(record.id, "enviar", &submitter, TransitionPayload::default())
        .await
        .unwrap();
    engine
        .fire(record.id, "aprovar", &approver, TransitionPayload::default())
        .await
        .unwrap();

    let first = watcher.recv().await.unwrap();
    let second = watcher.recv().await.unwrap();
    assert_eq!(first.transition, "enviar");
    assert_eq!(second.transition, "aprovar");
    assert!(first.sequence_no < second.sequence_no);
}
