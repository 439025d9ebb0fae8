//! Workflow engine
//!
//! Fires transitions against the store. Each attempt reads the record,
//! runs the guard chain and commits conditionally on the version it
//! read; a lost race reloads and retries up to [`MAX_COMMIT_ATTEMPTS`]
//! times before giving up.

use crate::models::actor::Actor;
use crate::models::audit::AuditEntry;
use crate::models::record::SolicitationRecord;
use crate::models::workflow::TransitionPayload;
use crate::services::logging::{log_transition_committed, log_transition_rejected};
use crate::workflow::guard::{GuardError, TransitionGuard};
use crate::workflow::persistence::{SolicitationStore, StoreError};
use crate::workflow::registry::WorkflowRegistry;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// How often a firing reloads and retries after losing a version race
pub const MAX_COMMIT_ATTEMPTS: u32 = 3;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Unknown workflow kind '{0}'")]
    UnknownKind(String),

    #[error("Kind '{kind}' declares no transition named '{transition}'")]
    UnknownTransition { kind: String, transition: String },

    #[error("Record '{0}' not found")]
    RecordNotFound(Uuid),

    #[error(transparent)]
    Rejected(#[from] GuardError),

    #[error("Record '{record_id}' kept changing during {attempts} commit attempts")]
    ConcurrentModification { record_id: Uuid, attempts: u32 },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Engine firing transitions for registered workflow kinds
pub struct WorkflowEngine {
    registry: Arc<WorkflowRegistry>,
    store: Arc<SolicitationStore>,
}

impl WorkflowEngine {
    pub fn new(registry: Arc<WorkflowRegistry>, store: Arc<SolicitationStore>) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &WorkflowRegistry {
        &self.registry
    }

    pub fn store(&self) -> &SolicitationStore {
        &self.store
    }

    /// Create a record in its kind's initial state
    pub fn start(&self, kind: &str) -> Result<SolicitationRecord, EngineError> {
        let definition = self
            .registry
            .get(kind)
            .map_err(|_| EngineError::UnknownKind(kind.to_string()))?;

        let record = self
            .store
            .create_record(kind, definition.initial_state.clone())
            .map_err(storage_error)?;

        tracing::info!(
            record_id = %record.id,
            kind = %kind,
            state = %record.current_state,
            "Started solicitation"
        );
        Ok(record)
    }

    /// Fire one transition for a record.
    ///
    /// On success exactly one state change and one audit entry were
    /// committed together. On any error nothing changed. The returned
    /// future is safe to drop at any point: the commit itself is a
    /// single synchronous store call, so a cancelled firing either never
    /// committed or fully committed.
    pub async fn fire(
        &self,
        record_id: Uuid,
        transition_name: &str,
        actor: &dyn Actor,
        payload: TransitionPayload,
    ) -> Result<AuditEntry, EngineError> {
        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let record = self
                .store
                .get_record(record_id)
                .ok_or(EngineError::RecordNotFound(record_id))?;
            let definition = self
                .registry
                .get(&record.kind)
                .map_err(|_| EngineError::UnknownKind(record.kind.clone()))?;
            let transition = definition.transition(transition_name).ok_or_else(|| {
                EngineError::UnknownTransition {
                    kind: record.kind.clone(),
                    transition: transition_name.to_string(),
                }
            })?;

            if let Err(rejection) =
                TransitionGuard::authorize(&record, transition, actor, &payload)
            {
                log_transition_rejected(
                    record_id,
                    transition_name,
                    actor.id(),
                    &rejection.to_string(),
                );
                return Err(EngineError::Rejected(rejection));
            }

            match self.store.commit_transition(
                record_id,
                record.version,
                transition_name,
                transition.to.clone(),
                actor.id(),
                &payload,
            ) {
                Ok(entry) => {
                    log_transition_committed(&entry);
                    return Ok(entry);
                }
                Err(StoreError::VersionConflict { actual, .. }) => {
                    tracing::warn!(
                        record_id = %record_id,
                        transition = transition_name,
                        attempt,
                        found_version = actual,
                        "Commit lost a version race, reloading"
                    );
                    continue;
                }
                Err(StoreError::RecordNotFound(id)) => {
                    return Err(EngineError::RecordNotFound(id))
                }
                Err(StoreError::Storage(e)) => return Err(EngineError::Storage(e)),
            }
        }

        Err(EngineError::ConcurrentModification {
            record_id,
            attempts: MAX_COMMIT_ATTEMPTS,
        })
    }
}

fn storage_error(err: StoreError) -> EngineError {
    match err {
        StoreError::RecordNotFound(id) => EngineError::RecordNotFound(id),
        StoreError::Storage(e) => EngineError::Storage(e),
        StoreError::VersionConflict { record_id, .. } => EngineError::ConcurrentModification {
            record_id,
            attempts: 1,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::actor::UserProfile;
    use crate::models::workflow::{State, StateDecl, Transition, WorkflowDefinition};
    use tempfile::tempdir;

    fn create_definition() -> WorkflowDefinition {
        WorkflowDefinition {
            kind: "Pedido".to_string(),
            description: Some("Pedido de alimentação".to_string()),
            states: vec![
                StateDecl::new("RASCUNHO", "Rascunho"),
                StateDecl::new("EM_ANALISE", "Em análise"),
                StateDecl::new("APROVADO", "Aprovado"),
                StateDecl::new("REJEITADO", "Rejeitado"),
            ],
            initial_state: State::from("RASCUNHO"),
            terminal_states: vec![State::from("APROVADO"), State::from("REJEITADO")],
            transitions: vec![
                Transition::new("enviar", &["RASCUNHO"], "EM_ANALISE", "SUBMIT"),
                Transition::new("aprovar", &["EM_ANALISE"], "APROVADO", "APPROVE"),
                Transition::new("rejeitar", &["EM_ANALISE"], "REJEITADO", "APPROVE")
                    .with_precondition(|_, _, payload| {
                        if payload.has_justification() {
                            Ok(())
                        } else {
                            Err("justificativa obrigatória".to_string())
                        }
                    }),
            ],
        }
    }

    fn create_engine(dir: &std::path::Path) -> WorkflowEngine {
        let mut registry = WorkflowRegistry::new();
        registry.register(create_definition()).unwrap();
        let store = SolicitationStore::new(dir.join("solicitations.json")).unwrap();
        WorkflowEngine::new(Arc::new(registry), Arc::new(store))
    }

    #[tokio::test]
    async fn test_fire_walks_the_happy_path() {
        let dir = tempdir().unwrap();
        let engine = create_engine(dir.path());
        let submitter = UserProfile::new("maria").grant("SUBMIT");
        let approver = UserProfile::new("ana").grant("APPROVE");

        let record = engine.start("Pedido").unwrap();
        assert_eq!(record.current_state.as_str(), "RASCUNHO");
        assert_eq!(record.version, 0);

        let sent = engine
            .fire(record.id, "enviar", &submitter, TransitionPayload::default())
            .await
            .unwrap();
        assert_eq!(sent.to_state.as_str(), "EM_ANALISE");

        let approved = engine
            .fire(record.id, "aprovar", &approver, TransitionPayload::default())
            .await
            .unwrap();
        assert_eq!(approved.to_state.as_str(), "APROVADO");
        assert!(approved.sequence_no > sent.sequence_no);

        let final_record = engine.store().get_record(record.id).unwrap();
        assert_eq!(final_record.version, 2);
        assert_eq!(final_record.current_state.as_str(), "APROVADO");
        assert_eq!(engine.store().history(record.id).len(), 2);
    }

    #[tokio::test]
    async fn test_start_unknown_kind() {
        let dir = tempdir().unwrap();
        let engine = create_engine(dir.path());

        let err = engine.start("Inexistente").unwrap_err();
        assert!(matches!(err, EngineError::UnknownKind(kind) if kind == "Inexistente"));
    }

    #[tokio::test]
    async fn test_fire_unknown_record() {
        let dir = tempdir().unwrap();
        let engine = create_engine(dir.path());
        let actor = UserProfile::new("maria").grant("SUBMIT");

        let err = engine
            .fire(
                Uuid::new_v4(),
                "enviar",
                &actor,
                TransitionPayload::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::RecordNotFound(_)));
    }

    #[tokio::test]
    async fn test_fire_unknown_transition() {
        let dir = tempdir().unwrap();
        let engine = create_engine(dir.path());
        let actor = UserProfile::new("maria").grant("SUBMIT");
        let record = engine.start("Pedido").unwrap();

        let err = engine
            .fire(record.id, "arquivar", &actor, TransitionPayload::default())
            .await
            .unwrap_err();
        assert!(
            matches!(err, EngineError::UnknownTransition { transition, .. } if transition == "arquivar")
        );
    }

    #[tokio::test]
    async fn test_rejected_firing_leaves_no_trace() {
        let dir = tempdir().unwrap();
        let engine = create_engine(dir.path());
        let intruder = UserProfile::new("joao");
        let record = engine.start("Pedido").unwrap();

        let err = engine
            .fire(record.id, "enviar", &intruder, TransitionPayload::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Rejected(GuardError::Unauthorized { .. })
        ));

        let untouched = engine.store().get_record(record.id).unwrap();
        assert_eq!(untouched.version, 0);
        assert_eq!(untouched.current_state.as_str(), "RASCUNHO");
        assert!(engine.store().history(record.id).is_empty());
    }

    #[tokio::test]
    async fn test_precondition_failure_reports_reason() {
        let dir = tempdir().unwrap();
        let engine = create_engine(dir.path());
        let submitter = UserProfile::new("maria").grant("SUBMIT");
        let approver = UserProfile::new("ana").grant("APPROVE");
        let record = engine.start("Pedido").unwrap();
        engine
            .fire(record.id, "enviar", &submitter, TransitionPayload::default())
            .await
            .unwrap();

        let err = engine
            .fire(record.id, "rejeitar", &approver, TransitionPayload::default())
            .await
            .unwrap_err();
        match err {
            EngineError::Rejected(GuardError::PreconditionFailed { reason }) => {
                assert_eq!(reason, "justificativa obrigatória");
            }
            other => panic!("expected precondition failure, got {other:?}"),
        }

        let rejected = engine
            .fire(
                record.id,
                "rejeitar",
                &approver,
                TransitionPayload::default().with_justification("fora do prazo"),
            )
            .await
            .unwrap();
        assert_eq!(rejected.to_state.as_str(), "REJEITADO");
        assert_eq!(rejected.justification.as_deref(), Some("fora do prazo"));
    }

    #[tokio::test]
    async fn test_terminal_state_has_no_exits() {
        let dir = tempdir().unwrap();
        let engine = create_engine(dir.path());
        let submitter = UserProfile::new("maria").grant("SUBMIT");
        let approver = UserProfile::new("ana").grant("APPROVE");
        let record = engine.start("Pedido").unwrap();
        engine
            .fire(record.id, "enviar", &submitter, TransitionPayload::default())
            .await
            .unwrap();
        engine
            .fire(record.id, "aprovar", &approver, TransitionPayload::default())
            .await
            .unwrap();

        let err = engine
            .fire(record.id, "enviar", &submitter, TransitionPayload::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Rejected(GuardError::InvalidTransition { .. })
        ));
        assert_eq!(engine.store().history(record.id).len(), 2);
    }
}
