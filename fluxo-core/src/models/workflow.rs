//! Workflow definition data structures
//!
//! A definition is plain data: the states of one solicitation kind, the
//! initial state, the terminal states, and the named transitions between
//! them. Definitions are constructed once at startup (or loaded from YAML)
//! and shared read-only between workers.

use crate::models::actor::{Actor, Capability};
use crate::models::audit::AttachmentRef;
use crate::models::record::SolicitationRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Opaque state symbol, scoped to a single workflow kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(String);

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for State {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for State {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A declared state together with its human-readable label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDecl {
    /// State symbol, unique within the definition
    pub name: State,
    /// Display label used in timelines and CLI output
    #[serde(default)]
    pub label: String,
}

impl StateDecl {
    pub fn new(name: impl Into<State>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
        }
    }
}

/// Typed payload attached to a single transition attempt
///
/// Preconditions see exactly these fields; there is no open-ended map for
/// them to depend on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransitionPayload {
    /// Free-text justification supplied by the actor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
    /// Yes/no answer for transitions that respond to a questioning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledgment: Option<bool>,
    /// Attachment references carried onto the audit entry
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentRef>,
}

impl TransitionPayload {
    pub fn with_justification(mut self, text: impl Into<String>) -> Self {
        self.justification = Some(text.into());
        self
    }

    pub fn with_acknowledgment(mut self, answer: bool) -> Self {
        self.acknowledgment = Some(answer);
        self
    }

    /// Whether a non-blank justification was supplied
    pub fn has_justification(&self) -> bool {
        self.justification
            .as_deref()
            .map(|text| !text.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Guard predicate evaluated after the state and capability checks pass.
///
/// Must be side-effect-free. `Err` carries the user-facing rejection reason,
/// displayed verbatim to end users.
pub type Precondition = Arc<
    dyn Fn(&SolicitationRecord, &dyn Actor, &TransitionPayload) -> Result<(), String>
        + Send
        + Sync,
>;

/// A named transition between states of one workflow kind
#[derive(Clone, Serialize, Deserialize)]
pub struct Transition {
    /// Transition name, unique within the definition
    pub name: String,
    /// States this transition may leave from
    pub from: Vec<State>,
    /// Destination state
    pub to: State,
    /// Capability the firing actor must hold
    pub required_capability: Capability,
    /// Optional precondition, evaluated last in the guard chain.
    /// Not representable in definition files; attached in code.
    #[serde(skip)]
    pub precondition: Option<Precondition>,
}

impl Transition {
    pub fn new(name: impl Into<String>, from: &[&str], to: &str, capability: &str) -> Self {
        Self {
            name: name.into(),
            from: from.iter().map(|state| State::from(*state)).collect(),
            to: State::from(to),
            required_capability: Capability::new(capability),
            precondition: None,
        }
    }

    pub fn with_precondition<F>(mut self, precondition: F) -> Self
    where
        F: Fn(&SolicitationRecord, &dyn Actor, &TransitionPayload) -> Result<(), String>
            + Send
            + Sync
            + 'static,
    {
        self.precondition = Some(Arc::new(precondition));
        self
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("name", &self.name)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("required_capability", &self.required_capability)
            .field("precondition", &self.precondition.is_some())
            .finish()
    }
}

/// Declarative workflow definition for one solicitation kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Solicitation kind this definition governs
    pub kind: String,
    /// Optional human description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared states with display labels
    pub states: Vec<StateDecl>,
    /// State assigned to newly created records
    pub initial_state: State,
    /// States with no outgoing transitions
    #[serde(default)]
    pub terminal_states: Vec<State>,
    /// Declared transitions
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

impl WorkflowDefinition {
    /// Whether `state` is declared by this definition
    pub fn has_state(&self, state: &State) -> bool {
        self.states.iter().any(|decl| &decl.name == state)
    }

    /// Whether `state` is one of the declared terminal states
    pub fn is_terminal(&self, state: &State) -> bool {
        self.terminal_states.contains(state)
    }

    /// Display label for a state, if declared
    pub fn label_for(&self, state: &State) -> Option<&str> {
        self.states
            .iter()
            .find(|decl| &decl.name == state)
            .map(|decl| decl.label.as_str())
    }

    /// Look up a transition by name
    pub fn transition(&self, name: &str) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.name == name)
    }

    /// Transitions whose `from` set contains `state`
    pub fn transitions_from(&self, state: &State) -> Vec<&Transition> {
        self.transitions
            .iter()
            .filter(|t| t.from.contains(state))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition() -> WorkflowDefinition {
        WorkflowDefinition {
            kind: "Pedido".to_string(),
            description: Some("Fluxo de pedido".to_string()),
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

    #[test]
    fn test_state_serializes_as_plain_string() {
        let state = State::from("RASCUNHO");
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, "\"RASCUNHO\"");

        let back: State = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_transitions_from_filters_by_membership() {
        let def = definition();
        let from_rascunho = def.transitions_from(&State::from("RASCUNHO"));
        assert_eq!(from_rascunho.len(), 1);
        assert_eq!(from_rascunho[0].name, "enviar");

        let from_aprovado = def.transitions_from(&State::from("APROVADO"));
        assert!(from_aprovado.is_empty());
    }

    #[test]
    fn test_terminal_and_label_lookup() {
        let def = definition();
        assert!(def.is_terminal(&State::from("APROVADO")));
        assert!(!def.is_terminal(&State::from("RASCUNHO")));
        assert_eq!(def.label_for(&State::from("EM_ANALISE")), Some("Em análise"));
        assert_eq!(def.label_for(&State::from("DESCONHECIDO")), None);
    }

    #[test]
    fn test_payload_blank_justification_does_not_count() {
        assert!(!TransitionPayload::default().has_justification());
        let blank = TransitionPayload::default().with_justification("   ");
        assert!(!blank.has_justification());
        let filled = TransitionPayload::default().with_justification("motivo");
        assert!(filled.has_justification());
    }

    #[test]
    fn test_definition_yaml_round_trip_drops_preconditions() {
        let mut def = definition();
        def.transitions[1] = def.transitions[1]
            .clone()
            .with_precondition(|_, _, _| Ok(()));

        let yaml = serde_yaml::to_string(&def).unwrap();
        let back: WorkflowDefinition = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(back.kind, "Pedido");
        assert_eq!(back.transitions.len(), 2);
        assert!(back.transitions[1].precondition.is_none());
    }

    #[test]
    fn test_transition_debug_reports_precondition_presence() {
        let bare = Transition::new("enviar", &["RASCUNHO"], "EM_ANALISE", "SUBMIT");
        assert!(format!("{:?}", bare).contains("precondition: false"));

        let guarded = bare.with_precondition(|_, _, _| Ok(()));
        assert!(format!("{:?}", guarded).contains("precondition: true"));
    }
}
