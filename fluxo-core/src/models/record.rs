//! Solicitation record model

use crate::models::workflow::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted snapshot of one solicitation.
///
/// Domain data lives with the owning module; the engine reads and writes
/// only `current_state` and `version`, and only through a committed
/// transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolicitationRecord {
    /// Stable unique identifier
    pub id: Uuid,
    /// Workflow kind governing this record
    pub kind: String,
    /// Current workflow state
    pub current_state: State,
    /// Version counter for optimistic concurrency; bumps on every commit
    pub version: u64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last committed transition
    pub updated_at: DateTime<Utc>,
}

impl SolicitationRecord {
    /// New record at the kind's initial state, version zero
    pub fn new(kind: impl Into<String>, initial_state: State) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind: kind.into(),
            current_state: initial_state,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }
}
