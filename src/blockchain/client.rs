//! Read-side JSON-RPC access for the watcher, the confirmation tracker and
//! startup checks.
//!
//! Every call is bounded by `rpc_timeout_secs` and walks the primary then
//! the failover endpoints. The endpoint that answered last is tried first
//! on the next call.

use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, Log, TransactionReceipt};
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::types::{BlockchainConfig, BlockchainError, BlockchainResult};
use crate::observability::metrics;

type SharedProvider = Arc<dyn Provider + Send + Sync>;

/// Read-only RPC access with ordered failover.
#[derive(Clone)]
pub struct BlockchainClient {
    /// Primary first, then failovers in configured order.
    providers: Vec<SharedProvider>,
    /// Index of the provider that answered most recently.
    preferred: Arc<AtomicUsize>,
    config: BlockchainConfig,
    timeout_duration: Duration,
}

impl BlockchainClient {
    /// Build the client. Only an unparseable primary URL is an error;
    /// nothing is sent to the node yet.
    pub async fn new(config: BlockchainConfig) -> BlockchainResult<Self> {
        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            BlockchainError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;

        let mut providers: Vec<SharedProvider> =
            vec![Arc::new(ProviderBuilder::new().connect_http(primary_url))];
        for url_str in &config.failover_urls {
            match url_str.parse::<url::Url>() {
                Ok(url) => providers.push(Arc::new(ProviderBuilder::new().connect_http(url))),
                Err(_) => tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL"),
            }
        }

        let client = Self {
            providers,
            preferred: Arc::new(AtomicUsize::new(0)),
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
            config,
        };

        tracing::info!(
            rpc_url = %client.config.rpc_url,
            failovers = client.providers.len() - 1,
            "Blockchain client initialized"
        );

        Ok(client)
    }

    /// Run `op` against each provider in turn, starting with the preferred
    /// one, until one answers within the timeout.
    async fn with_failover<T, E, F, Fut>(&self, what: &'static str, op: F) -> BlockchainResult<T>
    where
        F: Fn(SharedProvider) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let count = self.providers.len();
        let start = self.preferred.load(Ordering::Relaxed) % count;

        for offset in 0..count {
            let idx = (start + offset) % count;
            match timeout(self.timeout_duration, op(self.providers[idx].clone())).await {
                Ok(Ok(result)) => {
                    if idx != start {
                        tracing::info!(provider_idx = idx, "Switched to failover RPC provider");
                        self.preferred.store(idx, Ordering::Relaxed);
                    }
                    return Ok(result);
                }
                Ok(Err(e)) => tracing::warn!(provider_idx = idx, call = what, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = idx, call = what, "RPC timeout"),
            }
        }

        Err(BlockchainError::Rpc(format!("All RPC providers failed: {}", what)))
    }

    /// Chain ID reported by the node, checked against the configured one.
    ///
    /// Relay submissions must be signed for this value.
    pub async fn network_chain_id(&self) -> BlockchainResult<u64> {
        let actual = self.get_chain_id().await?;
        check_chain_id(self.config.chain_id, actual)
    }

    pub async fn get_chain_id(&self) -> BlockchainResult<u64> {
        self.with_failover("eth_chainId", |p| async move { p.get_chain_id().await })
            .await
    }

    /// Latest block number.
    pub async fn get_block_number(&self) -> BlockchainResult<u64> {
        self.with_failover("eth_blockNumber", |p| async move { p.get_block_number().await })
            .await
    }

    pub async fn get_balance(&self, address: Address) -> BlockchainResult<U256> {
        self.with_failover("eth_getBalance", |p| async move { p.get_balance(address).await })
            .await
    }

    /// Logs matching `filter`.
    pub async fn get_logs(&self, filter: &Filter) -> BlockchainResult<Vec<Log>> {
        self.with_failover("eth_getLogs", |p| async move { p.get_logs(filter).await })
            .await
    }

    /// Receipt for `tx_hash`, or `None` while it is pending.
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> BlockchainResult<Option<TransactionReceipt>> {
        self.with_failover("eth_getTransactionReceipt", |p| async move {
            p.get_transaction_receipt(tx_hash).await
        })
        .await
    }

    /// Whether any endpoint answers; also updates the RPC health gauge.
    pub async fn is_healthy(&self) -> bool {
        let healthy = self.get_block_number().await.is_ok();
        metrics::record_rpc_health(healthy);
        healthy
    }

    pub fn config(&self) -> &BlockchainConfig {
        &self.config
    }

    /// Confirmations required before a relayed transaction counts as final.
    pub fn confirmation_blocks(&self) -> u32 {
        self.config.confirmation_blocks
    }
}

/// `actual` if it matches `expected`, or if nothing is expected.
pub fn check_chain_id(expected: Option<u64>, actual: u64) -> BlockchainResult<u64> {
    match expected {
        Some(expected) if expected != actual => {
            Err(BlockchainError::ChainMismatch { expected, actual })
        }
        _ => Ok(actual),
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("providers", &self.providers.len())
            .field("chain_id", &self.config.chain_id)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
