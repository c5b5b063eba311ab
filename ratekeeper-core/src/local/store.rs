use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::{Result, TransportError};
use crate::ports::KeyValueStore;

#[derive(Debug, Default)]
struct MemoryState {
    values: HashMap<String, Value>,
    fail_reads: bool,
    fail_writes: bool,
    writes: usize,
}

/// Key-value store held in memory, with switchable failure injection.
///
/// Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: Value) -> Self {
        let store = Self::new();
        store.state.lock().values.insert(key.to_string(), value);
        store
    }

    pub fn value(&self, key: &str) -> Option<Value> {
        self.state.lock().values.get(key).cloned()
    }

    /// Successful writes since creation.
    pub fn write_count(&self) -> usize {
        self.state.lock().writes
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.state.lock().fail_reads = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let state = self.state.lock();
        if state.fail_reads {
            return Err(TransportError::Disconnected("memory store"));
        }
        Ok(state.values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(TransportError::Disconnected("memory store"));
        }
        state.values.insert(key.to_string(), value);
        state.writes += 1;
        Ok(())
    }
}
