//! Where announcements come from.

use alloy::primitives::Address;
use alloy::rpc::types::Filter;
use alloy::sol_types::SolEvent;
use async_trait::async_trait;

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::contract::ChainWalletMaster::TransactionCreated;
use crate::blockchain::types::BlockchainResult;
use crate::watcher::types::DiscoveredLocator;

/// Read access to the chain head and `TransactionCreated` events.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn latest_block(&self) -> BlockchainResult<u64>;

    /// Announcements in the inclusive block range, in chain order.
    async fn transaction_created(&self, from: u64, to: u64)
        -> BlockchainResult<Vec<DiscoveredLocator>>;
}

/// Event source reading the relay contract's logs over RPC.
#[derive(Debug, Clone)]
pub struct ContractEventSource {
    client: BlockchainClient,
    contract_address: Address,
}

impl ContractEventSource {
    pub fn new(client: BlockchainClient, contract_address: Address) -> Self {
        Self {
            client,
            contract_address,
        }
    }
}

#[async_trait]
impl EventSource for ContractEventSource {
    async fn latest_block(&self) -> BlockchainResult<u64> {
        self.client.get_block_number().await
    }

    async fn transaction_created(
        &self,
        from: u64,
        to: u64,
    ) -> BlockchainResult<Vec<DiscoveredLocator>> {
        let filter = Filter::new()
            .address(self.contract_address)
            .from_block(from)
            .to_block(to)
            .event(TransactionCreated::SIGNATURE);

        let mut logs = self.client.get_logs(&filter).await?;
        logs.sort_by_key(|log| (log.block_number, log.log_index));

        let mut discovered = Vec::with_capacity(logs.len());
        for log in logs {
            let Some(block_number) = log.block_number else {
                tracing::warn!(tx_hash = ?log.transaction_hash, "Skipping log without block number");
                continue;
            };

            match log.log_decode::<TransactionCreated>() {
                Ok(decoded) => discovered.push(DiscoveredLocator {
                    locator: decoded.inner.data.locator,
                    block_number,
                    tx_hash: log.transaction_hash,
                }),
                Err(e) => tracing::warn!(
                    block_number = block_number,
                    tx_hash = ?log.transaction_hash,
                    error = %e,
                    "Failed to decode TransactionCreated log"
                ),
            }
        }

        Ok(discovered)
    }
}
