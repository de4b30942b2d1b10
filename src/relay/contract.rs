//! Contract seam used by the relay loop.

use alloy::primitives::TxHash;
use async_trait::async_trait;

use crate::blockchain::types::{BlockchainResult, ConfirmationStatus};
use crate::relay::types::RelayCall;

/// The two relay entry points, each usable as a dry run or a real submission.
#[async_trait]
pub trait RelayContract: Send + Sync {
    /// Estimate the call with its own gas overrides; an error means it would revert.
    async fn simulate(&self, call: &RelayCall) -> BlockchainResult<u64>;

    /// Broadcast the call and return its hash.
    async fn submit(&self, call: &RelayCall) -> BlockchainResult<TxHash>;

    /// Wait until the transaction is confirmed, reverted, or the wait times out.
    async fn confirm(&self, tx_hash: TxHash) -> BlockchainResult<ConfirmationStatus>;
}
