//! Messages produced by the chain event watcher.

use alloy::primitives::{Bytes, TxHash};

/// A `TransactionCreated` announcement read from the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredLocator {
    pub locator: Bytes,
    pub block_number: u64,
    pub tx_hash: Option<TxHash>,
}

/// Result of a single watcher poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Events were emitted and the cursor now sits at `cursor`.
    Advanced { emitted: usize, cursor: u64 },
    /// Nothing new; the cursor did not move.
    Idle,
}
