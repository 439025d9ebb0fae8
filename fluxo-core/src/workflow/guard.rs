//! Transition guards
//!
//! Every firing passes the same three checks in a fixed order: source
//! state, actor capability, then the transition's precondition. The
//! first failing check decides the error, so identical inputs always
//! surface the same rejection.

use crate::models::actor::Actor;
use crate::models::record::SolicitationRecord;
use crate::models::workflow::{State, Transition, TransitionPayload};
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GuardError {
    #[error("Transition '{transition}' is not available from state '{from}'")]
    InvalidTransition { transition: String, from: State },

    #[error("Actor '{actor}' lacks capability '{capability}' required by '{transition}'")]
    Unauthorized {
        actor: String,
        transition: String,
        capability: String,
    },

    #[error("Precondition failed: {reason}")]
    PreconditionFailed { reason: String },
}

pub struct TransitionGuard;

impl TransitionGuard {
    /// Run the guard chain for one firing attempt
    pub fn authorize(
        record: &SolicitationRecord,
        transition: &Transition,
        actor: &dyn Actor,
        payload: &TransitionPayload,
    ) -> Result<(), GuardError> {
        if !transition.from.contains(&record.current_state) {
            return Err(GuardError::InvalidTransition {
                transition: transition.name.clone(),
                from: record.current_state.clone(),
            });
        }

        if !actor.has_capability(&transition.required_capability) {
            return Err(GuardError::Unauthorized {
                actor: actor.id().to_string(),
                transition: transition.name.clone(),
                capability: transition.required_capability.to_string(),
            });
        }

        if let Some(precondition) = &transition.precondition {
            // A fault inside a precondition surfaces as a failed check,
            // never as a worker panic.
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| precondition(record, actor, payload)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(reason)) => return Err(GuardError::PreconditionFailed { reason }),
                Err(cause) => {
                    return Err(GuardError::PreconditionFailed {
                        reason: panic_reason(cause),
                    })
                }
            }
        }

        Ok(())
    }
}

fn panic_reason(cause: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = cause.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = cause.downcast_ref::<String>() {
        message.clone()
    } else {
        "precondition panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::actor::UserProfile;

    fn create_record() -> SolicitationRecord {
        SolicitationRecord::new("Pedido", State::from("EM_ANALISE"))
    }

    fn create_transition() -> Transition {
        Transition::new("aprovar", &["EM_ANALISE"], "APROVADO", "APPROVE")
    }

    #[test]
    fn test_authorized_firing_passes() {
        let record = create_record();
        let actor = UserProfile::new("maria").grant("APPROVE");
        let result = TransitionGuard::authorize(
            &record,
            &create_transition(),
            &actor,
            &TransitionPayload::default(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_wrong_state_is_rejected() {
        let mut record = create_record();
        record.current_state = State::from("RASCUNHO");
        let actor = UserProfile::new("maria").grant("APPROVE");

        let err = TransitionGuard::authorize(
            &record,
            &create_transition(),
            &actor,
            &TransitionPayload::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GuardError::InvalidTransition { from, .. } if from.as_str() == "RASCUNHO"));
    }

    #[test]
    fn test_missing_capability_is_rejected() {
        let record = create_record();
        let actor = UserProfile::new("joao").grant("SUBMIT");

        let err = TransitionGuard::authorize(
            &record,
            &create_transition(),
            &actor,
            &TransitionPayload::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GuardError::Unauthorized { capability, .. } if capability == "APPROVE"));
    }

    #[test]
    fn test_state_check_runs_before_capability_check() {
        let mut record = create_record();
        record.current_state = State::from("RASCUNHO");
        let actor = UserProfile::new("joao");

        let err = TransitionGuard::authorize(
            &record,
            &create_transition(),
            &actor,
            &TransitionPayload::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GuardError::InvalidTransition { .. }));
    }

    #[test]
    fn test_capability_check_runs_before_precondition() {
        let record = create_record();
        let actor = UserProfile::new("joao");
        let transition = create_transition()
            .with_precondition(|_, _, _| Err("justificativa obrigatória".to_string()));

        let err = TransitionGuard::authorize(
            &record,
            &transition,
            &actor,
            &TransitionPayload::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GuardError::Unauthorized { .. }));
    }

    #[test]
    fn test_failing_precondition_reports_reason() {
        let record = create_record();
        let actor = UserProfile::new("maria").grant("APPROVE");
        let transition = create_transition().with_precondition(|_, _, payload| {
            if payload.has_justification() {
                Ok(())
            } else {
                Err("justificativa obrigatória".to_string())
            }
        });

        let err = TransitionGuard::authorize(
            &record,
            &transition,
            &actor,
            &TransitionPayload::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            GuardError::PreconditionFailed {
                reason: "justificativa obrigatória".to_string()
            }
        );

        let ok = TransitionGuard::authorize(
            &record,
            &transition,
            &actor,
            &TransitionPayload::default().with_justification("prazo vencido"),
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_panicking_precondition_becomes_failed_check() {
        let record = create_record();
        let actor = UserProfile::new("maria").grant("APPROVE");
        let transition =
            create_transition().with_precondition(|_, _, _| panic!("campo ausente"));

        let err = TransitionGuard::authorize(
            &record,
            &transition,
            &actor,
            &TransitionPayload::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            GuardError::PreconditionFailed {
                reason: "campo ausente".to_string()
            }
        );
    }

    #[test]
    fn test_same_inputs_same_rejection() {
        let record = create_record();
        let actor = UserProfile::new("joao");
        let transition = create_transition();

        let first = TransitionGuard::authorize(
            &record,
            &transition,
            &actor,
            &TransitionPayload::default(),
        )
        .unwrap_err();
        let second = TransitionGuard::authorize(
            &record,
            &transition,
            &actor,
            &TransitionPayload::default(),
        )
        .unwrap_err();
        assert_eq!(first, second);
    }
}
