//! In-memory record store with failure injection, for tests and previews.

use std::sync::Mutex;

use serde_json::{Map, Value};

use super::{strip_reserved, RecordFilter, RecordStore, StoreError, StoreResult, StoredRecord};

#[derive(Debug, Default)]
struct MemoryState {
    records: Vec<StoredRecord>,
    next_id: u64,
    clock: u64,
    offline: bool,
    fail_next: usize,
    creates: usize,
    updates: usize,
}

impl MemoryState {
    fn check_available(&mut self) -> StoreResult<()> {
        if self.offline {
            return Err(StoreError::Unavailable("network unreachable".into()));
        }
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(StoreError::Unavailable("injected failure".into()));
        }
        Ok(())
    }

    fn tick(&mut self) -> String {
        self.clock += 1;
        format!("{:020}", self.clock)
    }
}

/// Record store kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.with_state(|s| s.offline = offline);
    }

    /// Fail the next `count` calls.
    pub fn fail_next(&self, count: usize) {
        self.with_state(|s| s.fail_next = count);
    }

    /// Number of successful creates.
    pub fn create_count(&self) -> usize {
        self.with_state(|s| s.creates)
    }

    /// Number of successful updates.
    pub fn update_count(&self) -> usize {
        self.with_state(|s| s.updates)
    }

    /// Every row of every table.
    pub fn records(&self) -> Vec<StoredRecord> {
        self.with_state(|s| s.records.clone())
    }

    pub fn get(&self, id: &str) -> Option<StoredRecord> {
        self.with_state(|s| s.records.iter().find(|r| r.id == id).cloned())
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MemoryState) -> R) -> R {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut state)
    }
}

impl RecordStore for MemoryStore {
    fn create(&self, table: &str, record: Map<String, Value>) -> StoreResult<StoredRecord> {
        self.with_state(|s| -> StoreResult<StoredRecord> {
            s.check_available()?;
            s.next_id += 1;
            let now = s.tick();
            let stored = StoredRecord {
                id: format!("rec-{}", s.next_id),
                table: table.to_string(),
                fields: strip_reserved(record),
                created_at: now.clone(),
                updated_at: now,
            };
            s.records.push(stored.clone());
            s.creates += 1;
            Ok(stored)
        })
    }

    fn update(
        &self,
        table: &str,
        id: &str,
        partial: Map<String, Value>,
    ) -> StoreResult<StoredRecord> {
        self.with_state(|s| -> StoreResult<StoredRecord> {
            s.check_available()?;
            let now = s.tick();
            let stored = s
                .records
                .iter_mut()
                .find(|r| r.table == table && r.id == id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            stored.fields.extend(strip_reserved(partial));
            stored.updated_at = now;
            let stored = stored.clone();
            s.updates += 1;
            Ok(stored)
        })
    }

    fn query(&self, table: &str, filter: &RecordFilter) -> StoreResult<Vec<StoredRecord>> {
        self.with_state(|s| -> StoreResult<Vec<StoredRecord>> {
            s.check_available()?;
            Ok(s.records
                .iter()
                .rev()
                .filter(|r| r.table == table && filter.matches(&r.fields))
                .cloned()
                .collect())
        })
    }
}
