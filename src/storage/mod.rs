//! Cursor persistence.
//!
//! # Data Flow
//! ```text
//! watcher
//!     → cursor.rs (seed on first read, take-max on advance)
//!     → CursorStore (get/set by key)
//!     → redis_store.rs (production) | memory.rs (tests, single-process runs)
//! ```
//!
//! Only the watcher writes the cursor, so get/set is all the store
//! needs to offer.

pub mod cursor;
pub mod memory;
pub mod redis_store;

use async_trait::async_trait;
use thiserror::Error;

pub use cursor::Cursor;
pub use memory::InMemoryCursorStore;
pub use redis_store::RedisCursorStore;

/// Errors raised by cursor store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached.
    #[error("cursor store unavailable: {0}")]
    Connection(String),

    /// The backend rejected a command or returned an unreadable value.
    #[error("cursor store command `{op}` failed: {reason}")]
    Command { op: &'static str, reason: String },
}

/// Result type for cursor store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Key/value persistence for the last processed block number.
#[async_trait]
pub trait CursorStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<u64>>;

    async fn set(&self, key: &str, value: u64) -> StoreResult<()>;
}
