//! Solicitation persistence using JSON file storage
//!
//! One store file holds every record plus the append-only audit trail.
//! Commits are conditional on the record version the caller read, and
//! memory is only updated after the snapshot reaches disk, so a failed
//! commit leaves no partial effects behind.

use crate::models::audit::AuditEntry;
use crate::models::record::SolicitationRecord;
use crate::models::workflow::{State, TransitionPayload};
use crate::workflow::feed::CommitFeed;
use anyhow::{Context, Result};
use chrono::Utc;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record '{0}' not found")]
    RecordNotFound(Uuid),

    #[error("Record '{record_id}' changed underneath the commit (expected version {expected}, found {actual})")]
    VersionConflict {
        record_id: Uuid,
        expected: u64,
        actual: u64,
    },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Root JSON store containing all solicitation data
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct JsonStore {
    /// All solicitation records
    records: Vec<SolicitationRecord>,
    /// Append-only audit trail
    audit: Vec<AuditEntry>,
    /// Last sequence number handed out store-wide
    next_sequence: u64,
}

/// Solicitation store manager
pub struct SolicitationStore {
    /// Path to JSON store file
    store_path: PathBuf,
    /// In-memory data store
    store: Mutex<JsonStore>,
    /// Fan-out of committed entries
    feed: CommitFeed,
}

impl SolicitationStore {
    /// Create new store manager
    pub fn new<P: AsRef<Path>>(store_path: P) -> Result<Self> {
        let store_path = store_path.as_ref().to_path_buf();

        // Create parent directory if it doesn't exist
        if let Some(parent) = store_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create solicitation store directory")?;
        }

        // Load or initialize store
        let store = if store_path.exists() {
            Self::load_store(&store_path)?
        } else {
            JsonStore::default()
        };

        Ok(Self {
            store_path,
            store: Mutex::new(store),
            feed: CommitFeed::new(),
        })
    }

    /// Load JSON store from file with file locking
    fn load_store(path: &Path) -> Result<JsonStore> {
        let file = File::open(path).context("Failed to open solicitation store file")?;

        // Acquire shared lock for reading
        file.lock_shared()
            .context("Failed to acquire read lock on solicitation store")?;

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(file);
        reader
            .read_to_string(&mut contents)
            .context("Failed to read solicitation store")?;

        // Release lock automatically when file goes out of scope
        drop(reader);

        if contents.is_empty() {
            return Ok(JsonStore::default());
        }

        serde_json::from_str(&contents).context("Failed to parse solicitation store JSON")
    }

    /// Write a snapshot to disk with file locking
    fn save_snapshot(&self, snapshot: &JsonStore) -> Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.store_path)
            .context("Failed to open solicitation store file for writing")?;

        // Acquire exclusive lock for writing
        file.lock_exclusive()
            .context("Failed to acquire write lock on solicitation store")?;

        let json = serde_json::to_string_pretty(snapshot)
            .context("Failed to serialize solicitation store")?;

        let mut writer = std::io::BufWriter::new(file);
        writer
            .write_all(json.as_bytes())
            .context("Failed to write solicitation store")?;

        writer
            .flush()
            .context("Failed to flush solicitation store to disk")?;

        // Lock released automatically when writer/file goes out of scope
        Ok(())
    }

    /// Create a new record in its workflow's initial state
    pub fn create_record(
        &self,
        kind: &str,
        initial_state: State,
    ) -> Result<SolicitationRecord, StoreError> {
        let record = SolicitationRecord::new(kind, initial_state);

        let mut store = self.store.lock().unwrap();
        let mut next = store.clone();
        next.records.push(record.clone());
        self.save_snapshot(&next)?;
        *store = next;

        Ok(record)
    }

    /// Get record by ID
    pub fn get_record(&self, record_id: Uuid) -> Option<SolicitationRecord> {
        let store = self.store.lock().unwrap();
        store.records.iter().find(|r| r.id == record_id).cloned()
    }

    /// List records, optionally restricted to one kind, oldest first
    pub fn list_records(&self, kind: Option<&str>) -> Vec<SolicitationRecord> {
        let store = self.store.lock().unwrap();
        let mut records: Vec<_> = store
            .records
            .iter()
            .filter(|r| kind.is_none_or(|k| r.kind == k))
            .cloned()
            .collect();
        records.sort_by_key(|r| r.created_at);
        records
    }

    /// Apply one transition and append its audit entry in a single step.
    ///
    /// The commit is conditional on `expected_version`; a record that moved
    /// since the caller read it is reported as a conflict and nothing
    /// changes, in memory or on disk.
    pub(crate) fn commit_transition(
        &self,
        record_id: Uuid,
        expected_version: u64,
        transition: &str,
        to_state: State,
        actor_id: &str,
        payload: &TransitionPayload,
    ) -> Result<AuditEntry, StoreError> {
        let mut store = self.store.lock().unwrap();

        let position = store
            .records
            .iter()
            .position(|r| r.id == record_id)
            .ok_or(StoreError::RecordNotFound(record_id))?;
        let current = &store.records[position];
        if current.version != expected_version {
            return Err(StoreError::VersionConflict {
                record_id,
                expected: expected_version,
                actual: current.version,
            });
        }

        let occurred_at = Utc::now();
        let sequence_no = store.next_sequence + 1;
        let entry = AuditEntry {
            id: Uuid::new_v4(),
            record_id,
            kind: current.kind.clone(),
            transition: transition.to_string(),
            from_state: current.current_state.clone(),
            to_state: to_state.clone(),
            actor_id: actor_id.to_string(),
            occurred_at,
            sequence_no,
            justification: payload.justification.clone(),
            acknowledgment: payload.acknowledgment,
            attachments: payload.attachments.clone(),
        };

        // Mutate a copy; memory changes only after the snapshot is on disk
        let mut next = store.clone();
        next.next_sequence = sequence_no;
        next.audit.push(entry.clone());
        {
            let record = &mut next.records[position];
            record.current_state = to_state;
            record.version += 1;
            record.updated_at = occurred_at;
        }
        self.save_snapshot(&next)?;
        *store = next;
        self.feed.publish(&entry);

        Ok(entry)
    }

    /// Audit entries for one record, ordered by occurrence then sequence
    pub fn history(&self, record_id: Uuid) -> Vec<AuditEntry> {
        let store = self.store.lock().unwrap();
        let mut entries: Vec<_> = store
            .audit
            .iter()
            .filter(|e| e.record_id == record_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.ordering_key());
        entries
    }

    /// Most recent audit entry for a record
    pub fn latest(&self, record_id: Uuid) -> Option<AuditEntry> {
        let store = self.store.lock().unwrap();
        store
            .audit
            .iter()
            .filter(|e| e.record_id == record_id)
            .max_by_key(|e| e.ordering_key())
            .cloned()
    }

    pub fn feed(&self) -> &CommitFeed {
        &self.feed
    }

    /// Query metrics across the store
    pub fn query_metrics(&self, kind: Option<&str>) -> StoreMetrics {
        let store = self.store.lock().unwrap();

        let mut records_by_state: HashMap<String, usize> = HashMap::new();
        let mut record_count = 0;
        for record in &store.records {
            if kind.is_none_or(|k| record.kind == k) {
                record_count += 1;
                *records_by_state
                    .entry(record.current_state.to_string())
                    .or_insert(0) += 1;
            }
        }

        let transition_count = store
            .audit
            .iter()
            .filter(|e| kind.is_none_or(|k| e.kind == k))
            .count();

        StoreMetrics {
            record_count,
            transition_count,
            records_by_state,
        }
    }
}

/// Store-level counters
#[derive(Debug, Clone)]
pub struct StoreMetrics {
    pub record_count: usize,
    pub transition_count: usize,
    pub records_by_state: HashMap<String, usize>,
}
