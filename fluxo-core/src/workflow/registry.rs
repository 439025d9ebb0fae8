//! Workflow definition registry
//!
//! Holds one validated definition per solicitation kind. Registration is
//! first-wins: a later definition for an already registered kind is
//! rejected and the original stays in force.

use crate::models::workflow::{State, Transition, WorkflowDefinition};
use crate::workflow::validator::validate_definition;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Workflow kind '{0}' is already registered")]
    DuplicateKind(String),

    #[error("Unknown workflow kind '{0}'")]
    UnknownKind(String),

    #[error("Definition for kind '{kind}' is invalid: {}", violations.join("; "))]
    InvalidDefinition { kind: String, violations: Vec<String> },

    #[error("State '{state}' is not declared for kind '{kind}'")]
    UnknownState { kind: String, state: String },
}

/// Registry of workflow definitions, keyed by kind
#[derive(Debug, Default)]
pub struct WorkflowRegistry {
    definitions: HashMap<String, Arc<WorkflowDefinition>>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a definition. Fails if the definition is
    /// structurally invalid or its kind is already taken.
    pub fn register(&mut self, definition: WorkflowDefinition) -> Result<(), RegistryError> {
        let validation = validate_definition(&definition);
        if !validation.is_valid() {
            return Err(RegistryError::InvalidDefinition {
                kind: definition.kind.clone(),
                violations: validation
                    .errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect(),
            });
        }
        for warning in &validation.warnings {
            warn!(
                kind = %definition.kind,
                field = %warning.field,
                "Definition warning: {}",
                warning.message
            );
        }

        if self.definitions.contains_key(&definition.kind) {
            return Err(RegistryError::DuplicateKind(definition.kind));
        }

        info!(
            kind = %definition.kind,
            states = definition.states.len(),
            transitions = definition.transitions.len(),
            "Registered workflow definition"
        );
        self.definitions
            .insert(definition.kind.clone(), Arc::new(definition));
        Ok(())
    }

    /// Look up the definition for a kind
    pub fn get(&self, kind: &str) -> Result<Arc<WorkflowDefinition>, RegistryError> {
        self.definitions
            .get(kind)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownKind(kind.to_string()))
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.definitions.contains_key(kind)
    }

    /// Registered kinds, sorted for stable output
    pub fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.definitions.keys().cloned().collect();
        kinds.sort();
        kinds
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Transitions available from a given state of a kind
    pub fn transitions_from(
        &self,
        kind: &str,
        state: &State,
    ) -> Result<Vec<Transition>, RegistryError> {
        let definition = self.get(kind)?;
        if !definition.has_state(state) {
            return Err(RegistryError::UnknownState {
                kind: kind.to_string(),
                state: state.to_string(),
            });
        }
        Ok(definition
            .transitions_from(state)
            .into_iter()
            .cloned()
            .collect())
    }
}
