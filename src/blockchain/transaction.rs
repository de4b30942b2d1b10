//! Confirmation monitoring for submitted transactions.
//!
//! # Responsibilities
//! - Poll receipts until the required depth is reached
//! - Report on-chain reverts
//! - Bound the wait with a timeout

use alloy::primitives::TxHash;
use std::time::Duration;
use tokio::time::{interval, timeout};

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::types::{BlockchainError, BlockchainResult, ConfirmationStatus};

/// Default receipt polling interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Waits for transactions to reach the configured confirmation depth.
#[derive(Debug, Clone)]
pub struct ConfirmationTracker {
    client: BlockchainClient,
    poll_interval: Duration,
    timeout_secs: u64,
}

impl ConfirmationTracker {
    /// Create a tracker using the client's confirmation settings.
    pub fn new(client: BlockchainClient) -> Self {
        let timeout_secs = client.config().confirmation_timeout_secs;
        Self {
            client,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout_secs,
        }
    }

    /// Wait for a transaction to be confirmed.
    ///
    /// The block the transaction was mined in counts as the first
    /// confirmation.
    pub async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
    ) -> BlockchainResult<ConfirmationStatus> {
        let required_confirmations = self.client.confirmation_blocks().max(1);
        let timeout_duration = Duration::from_secs(self.timeout_secs);

        let result = timeout(timeout_duration, async {
            let mut ticker = interval(self.poll_interval);

            loop {
                ticker.tick().await;

                let receipt = match self.client.get_transaction_receipt(tx_hash).await {
                    Ok(Some(r)) => r,
                    Ok(None) => {
                        tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                        continue;
                    }
                    Err(e) => {
                        // Receipt lookups are retried until the deadline
                        tracing::warn!(tx_hash = %tx_hash, error = %e, "Receipt lookup failed");
                        continue;
                    }
                };

                if !receipt.status() {
                    return Ok(ConfirmationStatus::Failed(
                        "Transaction reverted".to_string(),
                    ));
                }

                let current_block = self.client.get_block_number().await?;
                let tx_block = receipt.block_number.unwrap_or(current_block);
                let status = confirmation_status(tx_block, current_block, required_confirmations);

                if status.is_final() {
                    return Ok(status);
                }
                tracing::debug!(tx_hash = %tx_hash, ?status, "Waiting for confirmations");
            }
        })
        .await;

        match result {
            Ok(status) => status,
            Err(_) => Err(BlockchainError::ConfirmationTimeout(self.timeout_secs)),
        }
    }
}

/// Depth of a transaction mined at `tx_block` when the head is `current_block`.
fn confirmation_status(tx_block: u64, current_block: u64, required: u32) -> ConfirmationStatus {
    let confirmations = current_block.saturating_sub(tx_block).saturating_add(1);
    let confirmations = u32::try_from(confirmations).unwrap_or(u32::MAX);
    if confirmations >= required {
        ConfirmationStatus::Confirmed {
            block_number: tx_block,
        }
    } else {
        ConfirmationStatus::Confirming {
            current: confirmations,
            required,
        }
    }
}
