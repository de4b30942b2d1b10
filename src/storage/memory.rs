//! In-process cursor store.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use crate::storage::{CursorStore, StoreResult};

/// A cursor store that lives only as long as the process.
///
/// Clones share the same map, which lets tests hand one handle to the
/// watcher and keep another to inspect or to simulate a restart.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCursorStore {
    inner: Arc<DashMap<String, u64>>,
}

impl InMemoryCursorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with `key` already holding `value`.
    pub fn with_value(key: &str, value: u64) -> Self {
        let store = Self::new();
        store.inner.insert(key.to_string(), value);
        store
    }
}

#[async_trait]
impl CursorStore for InMemoryCursorStore {
    async fn get(&self, key: &str) -> StoreResult<Option<u64>> {
        Ok(self.inner.get(key).map(|r| *r.value()))
    }

    async fn set(&self, key: &str, value: u64) -> StoreResult<()> {
        self.inner.insert(key.to_string(), value);
        Ok(())
    }
}
