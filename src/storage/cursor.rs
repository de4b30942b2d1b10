//! The watcher's block cursor.

use crate::observability::metrics;
use crate::storage::{CursorStore, StoreResult};

/// Highest block number whose events have been fully emitted.
///
/// Seeded from the configured start block on first read; never moves
/// backwards.
#[derive(Debug, Clone)]
pub struct Cursor<S> {
    store: S,
    key: String,
    start_block: u64,
}

impl<S: CursorStore> Cursor<S> {
    pub fn new(store: S, key: impl Into<String>, start_block: u64) -> Self {
        Self {
            store,
            key: key.into(),
            start_block,
        }
    }

    /// Read the cursor, persisting the start block if nothing is stored yet.
    pub async fn current(&self) -> StoreResult<u64> {
        match self.store.get(&self.key).await? {
            Some(block) => Ok(block),
            None => {
                self.store.set(&self.key, self.start_block).await?;
                tracing::info!(
                    key = %self.key,
                    start_block = self.start_block,
                    "Seeded cursor from start block"
                );
                Ok(self.start_block)
            }
        }
    }

    /// Move the cursor to `max(current, block)` and return the new value.
    pub async fn advance(&self, block: u64) -> StoreResult<u64> {
        let current = self.current().await?;
        let next = current.max(block);
        if next != current {
            self.store.set(&self.key, next).await?;
        }
        metrics::record_cursor(next);
        Ok(next)
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}
