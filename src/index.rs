//! Process-wide index of modules that have finished executing, keyed by
//! capability rather than position.
//!
//! Host module ids are opaque and load order is non-deterministic across
//! runs, so consumers look modules up by what their exports *can do* (see
//! [`crate::predicate`]). Scan order is registration order, which is stable
//! and deterministic for a given run.

use crate::host::ModuleId;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// One registered module: its host id and the live exports handle.
#[derive(Debug, Clone)]
pub struct ModuleRecord {
    pub id: ModuleId,
    pub exports: Arc<Value>,
}

#[derive(Debug, Default)]
struct IndexState {
    records: Vec<ModuleRecord>,
    by_id: HashMap<ModuleId, usize>,
}

/// Registration-ordered capability index. Entries live for the process
/// lifetime; re-registering an id (hot reload) replaces the exports in place,
/// keeping the record's original scan position.
#[derive(Debug, Default)]
pub struct ModuleIndex {
    state: RwLock<IndexState>,
}

impl ModuleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module's exports, returning the shared handle.
    ///
    /// Dependents holding a handle from before a hot reload keep the stale
    /// exports; they must re-resolve by capability to observe the new value.
    pub fn insert(&self, id: ModuleId, exports: Value) -> Arc<Value> {
        let exports = Arc::new(exports);
        let mut state = self.state.write().expect("module index lock poisoned");
        match state.by_id.get(&id).copied() {
            Some(slot) => {
                state.records[slot].exports = Arc::clone(&exports);
            }
            None => {
                let slot = state.records.len();
                state.by_id.insert(id.clone(), slot);
                state.records.push(ModuleRecord {
                    id,
                    exports: Arc::clone(&exports),
                });
            }
        }
        exports
    }

    /// Exports for a known id, if that module has executed.
    pub fn get(&self, id: &ModuleId) -> Option<Arc<Value>> {
        let state = self.state.read().expect("module index lock poisoned");
        state
            .by_id
            .get(id)
            .map(|&slot| Arc::clone(&state.records[slot].exports))
    }

    /// First registered module whose exports satisfy the predicate, or `None`.
    pub fn lookup<P>(&self, predicate: P) -> Option<Arc<Value>>
    where
        P: Fn(&Value) -> bool,
    {
        let state = self.state.read().expect("module index lock poisoned");
        state
            .records
            .iter()
            .find(|record| predicate(&record.exports))
            .map(|record| Arc::clone(&record.exports))
    }

    /// Every matching module, in registration order.
    pub fn lookup_all<P>(&self, predicate: P) -> Vec<Arc<Value>>
    where
        P: Fn(&Value) -> bool,
    {
        let state = self.state.read().expect("module index lock poisoned");
        state
            .records
            .iter()
            .filter(|record| predicate(&record.exports))
            .map(|record| Arc::clone(&record.exports))
            .collect()
    }

    /// Snapshot of every record, in registration order.
    pub fn records(&self) -> Vec<ModuleRecord> {
        self.state
            .read()
            .expect("module index lock poisoned")
            .records
            .clone()
    }

    pub fn len(&self) -> usize {
        self.state
            .read()
            .expect("module index lock poisoned")
            .records
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
