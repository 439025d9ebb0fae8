//! Commit feed
//!
//! Broadcast channel fan-out for committed transitions. Subscribers can
//! watch the whole store or a single record. Entries are published from
//! inside the store's commit section, so subscribers observe them in
//! commit order.

use crate::models::audit::AuditEntry;
use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

const FEED_CAPACITY: usize = 1000;

/// Fan-out of committed audit entries
#[derive(Debug)]
pub struct CommitFeed {
    all: broadcast::Sender<AuditEntry>,
    records: DashMap<Uuid, broadcast::Sender<AuditEntry>>,
}

impl CommitFeed {
    pub fn new() -> Self {
        let (all, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            all,
            records: DashMap::new(),
        }
    }

    /// Subscribe to every committed transition in the store
    pub fn subscribe(&self) -> broadcast::Receiver<AuditEntry> {
        self.all.subscribe()
    }

    /// Subscribe to the transitions of a single record
    pub fn subscribe_record(&self, record_id: Uuid) -> broadcast::Receiver<AuditEntry> {
        self.records
            .entry(record_id)
            .or_insert_with(|| {
                let (sender, _) = broadcast::channel(FEED_CAPACITY);
                sender
            })
            .subscribe()
    }

    /// Drop the per-record channel once nobody cares about it anymore
    pub fn release_record(&self, record_id: Uuid) {
        self.records.remove(&record_id);
    }

    /// Number of live subscribers on the store-wide channel
    pub fn watcher_count(&self) -> usize {
        self.all.receiver_count()
    }

    pub(crate) fn publish(&self, entry: &AuditEntry) {
        if let Some(sender) = self.records.get(&entry.record_id) {
            let _ = sender.send(entry.clone());
        }
        let _ = self.all.send(entry.clone());
    }
}

impl Default for CommitFeed {
    fn default() -> Self {
        Self::new()
    }
}
