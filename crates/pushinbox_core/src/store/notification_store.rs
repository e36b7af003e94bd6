//! Notification store implementation.
//!
//! # Responsibility
//! - Apply insert/mark-read/mark-all-read/delete/clear to the sequence.
//! - Schedule a full-snapshot save after each mutation.
//!
//! # Invariants
//! - Mutations are synchronous and complete before the call returns.
//! - Unknown ids are a silent no-op, never an error.
//! - Ids are unique across held records; an insert reusing a held id is refused.
//! - Saves are never awaited by the mutating caller.

use crate::config::StoreConfig;
use crate::model::notification::{NotificationId, NotificationRecord};
use crate::persist::gateway::PersistenceGateway;
use crate::persist::save_queue::{ErrorReporter, SaveQueue};
use log::{debug, info, warn};
use std::collections::HashSet;

/// Observer callback invoked with the post-mutation state.
pub type StoreListener = Box<dyn FnMut(&StoreSnapshot) + Send>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Read-only view of store state handed to observers.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSnapshot {
    /// Records newest-first.
    pub records: Vec<NotificationRecord>,
    pub badge_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mutation {
    Insert,
    MarkRead,
    MarkAllRead,
    Delete,
    Clear,
}

impl Mutation {
    fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::MarkRead => "mark_read",
            Self::MarkAllRead => "mark_all_read",
            Self::Delete => "delete",
            Self::Clear => "clear",
        }
    }
}

/// Exclusive owner of the notification sequence.
pub struct NotificationStore {
    records: Vec<NotificationRecord>,
    /// Cached unread count, rebuilt from a full scan after every mutation.
    badge_count: usize,
    max_retained: usize,
    saver: SaveQueue,
    listeners: Vec<(ListenerId, StoreListener)>,
    next_listener_id: u64,
}

impl NotificationStore {
    /// Restores the store from `gateway` and starts the save worker.
    ///
    /// # Contract
    /// - Load failure starts an empty store and is logged/reported, not
    ///   returned.
    /// - Restored snapshots keep the first occurrence of a duplicated id and
    ///   are truncated to `config.max_retained`.
    /// - Restoring does not schedule a save.
    pub fn open(
        mut gateway: Box<dyn PersistenceGateway>,
        config: &StoreConfig,
        reporter: Option<ErrorReporter>,
    ) -> Self {
        let restored = match gateway.load() {
            Ok(records) => records,
            Err(err) => {
                warn!("event=store_load module=store status=error fallback=empty error={err}");
                if let Some(reporter) = &reporter {
                    reporter(&err);
                }
                Vec::new()
            }
        };

        let mut store = Self::with_queue(SaveQueue::spawn(gateway, reporter), config.max_retained);
        store.restore(restored);
        info!(
            "event=store_open module=store status=ok restored={} badge={} max_retained={}",
            store.records.len(),
            store.badge_count,
            store.max_retained
        );
        store
    }

    /// Creates an empty store with no persistence.
    pub fn ephemeral(config: &StoreConfig) -> Self {
        Self::with_queue(SaveQueue::detached(), config.max_retained)
    }

    fn with_queue(saver: SaveQueue, max_retained: usize) -> Self {
        Self {
            records: Vec::new(),
            badge_count: 0,
            max_retained: max_retained.max(1),
            saver,
            listeners: Vec::new(),
            next_listener_id: 0,
        }
    }

    fn restore(&mut self, records: Vec<NotificationRecord>) {
        let loaded = records.len();
        let mut seen = HashSet::new();
        self.records = records
            .into_iter()
            .filter(|record| seen.insert(record.id().to_string()))
            .take(self.max_retained)
            .collect();
        if self.records.len() != loaded {
            warn!(
                "event=store_load module=store status=adjusted loaded={} kept={}",
                loaded,
                self.records.len()
            );
        }
        self.reconcile_badge();
    }

    /// Prepends `record`, evicting the oldest records beyond the cap.
    ///
    /// Returns the number of evicted records. Identical content is never
    /// deduplicated, but a record whose id is already held is refused and
    /// leaves the store untouched.
    pub fn insert(&mut self, record: NotificationRecord) -> usize {
        if self.contains(record.id()) {
            warn!(
                "event=store_insert module=store status=rejected reason=duplicate_id id={}",
                record.id()
            );
            return 0;
        }
        self.records.insert(0, record);
        let evicted = self.records.len().saturating_sub(self.max_retained);
        self.records.truncate(self.max_retained);
        self.after_mutation(Mutation::Insert);
        evicted
    }

    /// Marks one record read. Returns whether `id` was found.
    pub fn mark_read(&mut self, id: &str) -> bool {
        let found = match self.records.iter_mut().find(|record| record.id() == id) {
            Some(record) => {
                record.mark_read();
                true
            }
            None => false,
        };
        self.after_mutation(Mutation::MarkRead);
        found
    }

    /// Marks every record read.
    pub fn mark_all_read(&mut self) {
        for record in &mut self.records {
            record.mark_read();
        }
        self.after_mutation(Mutation::MarkAllRead);
    }

    /// Removes one record. Returns whether `id` was found.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|record| record.id() != id);
        let found = self.records.len() != before;
        self.after_mutation(Mutation::Delete);
        found
    }

    /// Removes every record.
    pub fn clear(&mut self) {
        self.records.clear();
        self.after_mutation(Mutation::Clear);
    }

    /// Number of unread records.
    pub fn badge_count(&self) -> usize {
        self.badge_count
    }

    /// Records newest-first.
    pub fn records(&self) -> &[NotificationRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&NotificationRecord> {
        self.records.iter().find(|record| record.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn max_retained(&self) -> usize {
        self.max_retained
    }

    /// Ids currently held, newest-first.
    pub fn ids(&self) -> Vec<NotificationId> {
        self.records
            .iter()
            .map(|record| record.id().to_string())
            .collect()
    }

    /// Copies current state for observers.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            records: self.records.clone(),
            badge_count: self.badge_count,
        }
    }

    /// Registers an observer called after every mutation.
    pub fn subscribe(&mut self, listener: StoreListener) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Removes an observer. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Waits for queued saves to reach the gateway.
    ///
    /// Returns `false` for stores without a running save worker.
    pub fn flush_saves(&self) -> bool {
        self.saver.flush()
    }

    fn reconcile_badge(&mut self) {
        self.badge_count = self
            .records
            .iter()
            .filter(|record| !record.is_read())
            .count();
    }

    fn after_mutation(&mut self, mutation: Mutation) {
        self.reconcile_badge();
        debug!(
            "event=store_mutation module=store op={} status=ok len={} badge={}",
            mutation.as_str(),
            self.records.len(),
            self.badge_count
        );
        self.saver.enqueue(self.records.clone());

        if self.listeners.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for (_, listener) in &mut self.listeners {
            listener(&snapshot);
        }
    }
}
