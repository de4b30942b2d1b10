//! Chain event watcher.
//!
//! # State Machine
//! ```text
//! Polling ──(events found)──▶ Advancing ──▶ Polling
//!    │
//!    ├──(no events)──▶ Idle sleep ──▶ Polling
//!    └──(RPC/store error)──▶ Backoff ──▶ Polling
//! ```
//!
//! Locators are emitted over a bounded channel; a full channel holds the
//! watcher back until the resolver catches up.

pub mod monitor;
pub mod source;
pub mod types;

use thiserror::Error;

use crate::blockchain::BlockchainError;
use crate::storage::StoreError;

pub use monitor::ChainWatcher;
pub use source::{ContractEventSource, EventSource};
pub use types::{DiscoveredLocator, PollOutcome};

#[derive(Debug, Error)]
pub enum WatcherError {
    #[error(transparent)]
    Chain(#[from] BlockchainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("locator channel closed")]
    ChannelClosed,
}
