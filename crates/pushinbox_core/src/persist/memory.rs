//! In-memory gateway with failure injection.

use crate::model::notification::NotificationRecord;
use crate::persist::gateway::{PersistResult, PersistenceError, PersistenceGateway};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct MemoryState {
    records: Vec<NotificationRecord>,
    save_count: usize,
    fail_loads: bool,
    fail_saves: bool,
}

/// Process-local snapshot storage.
///
/// Clones share one underlying state, so a caller can keep a handle for
/// inspection after handing another clone to a store.
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gateway pre-seeded with a stored snapshot.
    pub fn with_records(records: Vec<NotificationRecord>) -> Self {
        let gateway = Self::new();
        gateway.lock().records = records;
        gateway
    }

    /// Makes subsequent `load` calls fail.
    pub fn set_fail_loads(&self, fail: bool) {
        self.lock().fail_loads = fail;
    }

    /// Makes subsequent `save` calls fail.
    pub fn set_fail_saves(&self, fail: bool) {
        self.lock().fail_saves = fail;
    }

    /// Returns the currently stored snapshot.
    pub fn records(&self) -> Vec<NotificationRecord> {
        self.lock().records.clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.lock().save_count
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PersistenceGateway for MemoryGateway {
    fn load(&mut self) -> PersistResult<Vec<NotificationRecord>> {
        let state = self.lock();
        if state.fail_loads {
            return Err(PersistenceError::Unavailable(
                "memory gateway load disabled".to_string(),
            ));
        }
        Ok(state.records.clone())
    }

    fn save(&mut self, snapshot: &[NotificationRecord]) -> PersistResult<()> {
        let mut state = self.lock();
        if state.fail_saves {
            return Err(PersistenceError::Unavailable(
                "memory gateway save disabled".to_string(),
            ));
        }
        state.records = snapshot.to_vec();
        state.save_count += 1;
        Ok(())
    }
}
