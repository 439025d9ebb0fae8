//! Audit trail entries
//!
//! Each committed transition produces exactly one immutable entry.
//! Corrections are further forward transitions, never edits to the trail.

use crate::models::workflow::{State, WorkflowDefinition};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Opaque reference to a stored attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    /// Display name of the attachment
    pub name: String,
    /// Opaque storage reference
    pub reference: String,
}

impl AttachmentRef {
    pub fn new(name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reference: reference.into(),
        }
    }
}

/// One committed transition on one record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Entry identifier
    pub id: Uuid,
    /// Record this entry belongs to
    pub record_id: Uuid,
    /// Workflow kind of the record at commit time
    pub kind: String,
    /// Name of the fired transition
    pub transition: String,
    /// State the record left
    pub from_state: State,
    /// State the record entered
    pub to_state: State,
    /// Identifier of the actor who fired the transition
    pub actor_id: String,
    /// Commit timestamp
    pub occurred_at: DateTime<Utc>,
    /// Store-wide monotonic counter; breaks timestamp ties
    pub sequence_no: u64,
    /// Justification supplied with the transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
    /// Yes/no answer supplied with the transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledgment: Option<bool>,
    /// Attachments supplied with the transition
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentRef>,
}

impl AuditEntry {
    /// Causal ordering key: wall clock first, insertion order as tiebreak.
    /// Never order by wall clock alone; commits within one millisecond and
    /// clock skew both happen.
    pub fn ordering_key(&self) -> (DateTime<Utc>, u64) {
        (self.occurred_at, self.sequence_no)
    }
}

/// The trail disagrees with the definition it claims to follow
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("entry {sequence_no}: transition '{transition}' is not declared for kind '{kind}'")]
    UnknownTransition {
        sequence_no: u64,
        transition: String,
        kind: String,
    },
    #[error("entry {sequence_no}: entry left state '{recorded}' but the timeline was at '{expected}'")]
    StateMismatch {
        sequence_no: u64,
        recorded: State,
        expected: State,
    },
    #[error("entry {sequence_no}: transition '{transition}' cannot leave state '{state}'")]
    IllegalSource {
        sequence_no: u64,
        transition: String,
        state: State,
    },
    #[error("entry {sequence_no}: transition '{transition}' leads to '{declared}', entry recorded '{recorded}'")]
    DestinationMismatch {
        sequence_no: u64,
        transition: String,
        declared: State,
        recorded: State,
    },
}

/// Recompute the final state by replaying entries against a definition.
///
/// Entries are evaluated in causal order starting from the definition's
/// initial state. For a healthy store the result equals the record's
/// `current_state`; anything else means the trail was tampered with or the
/// record was mutated outside the engine.
pub fn replay(
    definition: &WorkflowDefinition,
    entries: &[AuditEntry],
) -> Result<State, ReplayError> {
    let mut ordered: Vec<&AuditEntry> = entries.iter().collect();
    ordered.sort_by_key(|entry| entry.ordering_key());

    let mut cursor = definition.initial_state.clone();
    for entry in ordered {
        if entry.from_state != cursor {
            return Err(ReplayError::StateMismatch {
                sequence_no: entry.sequence_no,
                recorded: entry.from_state.clone(),
                expected: cursor,
            });
        }
        let transition = definition.transition(&entry.transition).ok_or_else(|| {
            ReplayError::UnknownTransition {
                sequence_no: entry.sequence_no,
                transition: entry.transition.clone(),
                kind: definition.kind.clone(),
            }
        })?;
        if !transition.from.contains(&cursor) {
            return Err(ReplayError::IllegalSource {
                sequence_no: entry.sequence_no,
                transition: entry.transition.clone(),
                state: cursor,
            });
        }
        if transition.to != entry.to_state {
            return Err(ReplayError::DestinationMismatch {
                sequence_no: entry.sequence_no,
                transition: entry.transition.clone(),
                declared: transition.to.clone(),
                recorded: entry.to_state.clone(),
            });
        }
        cursor = entry.to_state.clone();
    }
    Ok(cursor)
}
