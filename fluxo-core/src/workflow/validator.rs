//! Workflow definition validation
//!
//! Structural checks every definition must pass before it may enter the
//! registry. Errors reject the definition; warnings are surfaced to
//! operators but do not block registration.

use crate::models::workflow::{State, WorkflowDefinition};
use std::collections::{HashMap, HashSet, VecDeque};

/// A single validation finding
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Field or element the finding refers to
    pub field: String,
    /// Human-readable message
    pub message: String,
}

/// Result of validating a workflow definition
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// Fatal problems; any entry rejects the definition
    pub errors: Vec<ValidationError>,
    /// Non-fatal observations
    pub warnings: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationError {
            field: field.into(),
            message: message.into(),
        });
    }
}

/// Validate a workflow definition
pub fn validate_definition(definition: &WorkflowDefinition) -> ValidationResult {
    let mut result = ValidationResult::default();

    if definition.kind.trim().is_empty() {
        result.add_error("kind", "workflow kind must not be empty");
    }
    if definition.description.is_none() {
        result.add_warning("description", "definition has no description");
    }

    if definition.states.is_empty() {
        result.add_error("states", "definition declares no states");
        return result;
    }

    let mut declared: HashSet<&State> = HashSet::new();
    for decl in &definition.states {
        if !declared.insert(&decl.name) {
            result.add_error("states", format!("state '{}' is declared twice", decl.name));
        }
        if decl.label.trim().is_empty() {
            result.add_warning("states", format!("state '{}' has no display label", decl.name));
        }
    }

    if !declared.contains(&definition.initial_state) {
        result.add_error(
            "initial_state",
            format!("initial state '{}' is not declared", definition.initial_state),
        );
    }

    if definition.terminal_states.is_empty() {
        result.add_warning("terminal_states", "no terminal states declared");
    }
    for terminal in &definition.terminal_states {
        if !declared.contains(terminal) {
            result.add_error(
                "terminal_states",
                format!("terminal state '{}' is not declared", terminal),
            );
        }
    }

    let mut names: HashSet<&str> = HashSet::new();
    for transition in &definition.transitions {
        let field = format!("transitions.{}", transition.name);

        if transition.name.trim().is_empty() {
            result.add_error("transitions", "transition with empty name");
        } else if !names.insert(&transition.name) {
            result.add_error(
                "transitions",
                format!("transition '{}' is declared twice", transition.name),
            );
        }

        if transition.from.is_empty() {
            result.add_error(&field, "empty from set");
        }
        for from in &transition.from {
            if !declared.contains(from) {
                result.add_error(&field, format!("from state '{}' is not declared", from));
            }
            if definition.is_terminal(from) {
                result.add_error(
                    &field,
                    format!("terminal state '{}' has an outgoing transition", from),
                );
            }
        }
        if !declared.contains(&transition.to) {
            result.add_error(
                &field,
                format!("destination state '{}' is not declared", transition.to),
            );
        }
        if transition.required_capability.is_empty() {
            result.add_error(&field, "required capability must not be empty");
        }
    }

    // Every non-terminal state needs a way out
    for decl in &definition.states {
        if definition.is_terminal(&decl.name) {
            continue;
        }
        if definition.transitions_from(&decl.name).is_empty() {
            result.add_error(
                "states",
                format!("non-terminal state '{}' has no outgoing transitions", decl.name),
            );
        }
    }

    for state in find_unreachable_states(definition) {
        result.add_error(
            "states",
            format!("state '{}' is unreachable from the initial state", state),
        );
    }

    result
}

/// Breadth-first walk of the transition graph from the initial state
fn find_unreachable_states(definition: &WorkflowDefinition) -> Vec<State> {
    let mut adjacency: HashMap<&State, Vec<&State>> = HashMap::new();
    for transition in &definition.transitions {
        for from in &transition.from {
            adjacency.entry(from).or_default().push(&transition.to);
        }
    }

    let mut visited: HashSet<&State> = HashSet::new();
    let mut queue: VecDeque<&State> = VecDeque::new();
    visited.insert(&definition.initial_state);
    queue.push_back(&definition.initial_state);

    while let Some(state) = queue.pop_front() {
        if let Some(next) = adjacency.get(state) {
            for to in next {
                if visited.insert(to) {
                    queue.push_back(to);
                }
            }
        }
    }

    definition
        .states
        .iter()
        .filter(|decl| !visited.contains(&decl.name))
        .map(|decl| decl.name.clone())
        .collect()
}
