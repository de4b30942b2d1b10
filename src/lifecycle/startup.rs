//! Startup orchestration.
//!
//! # Order
//! 1. Metrics exporter
//! 2. RPC client and the node's chain id, which the relay wallet
//!    (environment) is bound to; contract binding, balance check
//! 3. Cursor store (bounded retry)
//! 4. Channels, then watcher, resolver and relay tasks
//!
//! Any failure before the tasks start is fatal.

use alloy::primitives::{utils::format_ether, Address};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::blockchain::{BlockchainClient, BlockchainError, ChainWalletContract, Wallet};
use crate::config::RelayConfig;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::spawn_signal_handler;
use crate::observability::metrics;
use crate::relay::{RelayError, RelayLoop};
use crate::resolver::{HttpObjectStore, LocatorResolver, ObjectStoreError, ResolutionService};
use crate::storage::{Cursor, RedisCursorStore, StoreError};
use crate::watcher::{ChainWatcher, ContractEventSource};

/// Failures that prevent the relay from starting or keep it from running.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid contract address {0:?}")]
    ContractAddress(String),

    #[error(transparent)]
    Blockchain(#[from] BlockchainError),

    #[error(transparent)]
    CursorStore(#[from] StoreError),

    #[error("object store: {0}")]
    ObjectStore(#[from] ObjectStoreError),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error("relay task panicked: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Load the relay key through `lookup`, bound to the chain the node is on.
fn signing_wallet<F>(chain_id: u64, lookup: F) -> Result<Wallet, StartupError>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(Wallet::from_lookup(chain_id, lookup)?)
}

/// Start every subsystem and run until shutdown.
pub async fn run(config: &RelayConfig) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let contract_address: Address = config
        .contract
        .address
        .parse()
        .map_err(|_| StartupError::ContractAddress(config.contract.address.clone()))?;

    let client = BlockchainClient::new(config.blockchain.clone()).await?;
    if !client.is_healthy().await {
        tracing::warn!(rpc_url = %config.blockchain.rpc_url, "RPC endpoint not reachable");
    }
    let chain_id = client.network_chain_id().await?;
    let wallet = signing_wallet(chain_id, |var| std::env::var(var).ok())?;

    match client.get_balance(wallet.address()).await {
        Ok(balance) => tracing::info!(
            relay_address = %wallet.address(),
            chain_id,
            balance_eth = %format_ether(balance),
            "Relay account"
        ),
        Err(e) => tracing::warn!(
            relay_address = %wallet.address(),
            error = %e,
            "Could not read relay balance"
        ),
    }

    let contract = ChainWalletContract::new(contract_address, &wallet, client.clone())?;

    let store = RedisCursorStore::connect_with_retry(
        &config.cursor_store.url,
        config.cursor_store.connect_attempts,
    )
    .await?;
    let start_block = config.contract.start_block.unwrap_or_default();
    let cursor = Cursor::new(store, config.cursor_store.key.clone(), start_block);
    tracing::info!(
        key = cursor.key(),
        cursor = cursor.current().await?,
        "Cursor loaded"
    );

    let object_store = HttpObjectStore::new(&config.object_store)?;

    let capacity = config.relay.channel_capacity;
    let (locator_tx, locator_rx) = mpsc::channel(capacity);
    let (record_tx, record_rx) = mpsc::channel(capacity);

    let watcher = ChainWatcher::new(
        ContractEventSource::new(client, contract_address),
        cursor,
        locator_tx,
        &config.watcher,
    );
    let resolution = ResolutionService::new(
        LocatorResolver::new(object_store),
        config.relay.max_concurrent_resolutions,
    );
    tracing::info!(
        contract = %contract.address(),
        gateway = %config.object_store.gateway_url,
        "Transaction relay running"
    );
    let relay = RelayLoop::new(contract, record_rx, &config.relay);

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    let watcher_task = tokio::spawn(watcher.run(shutdown.subscribe()));
    let resolution_task =
        tokio::spawn(resolution.run(locator_rx, record_tx, shutdown.subscribe()));
    let relay_task = tokio::spawn(relay.run(shutdown.subscribe()));

    // The relay loop only ends on shutdown or a heap invariant violation;
    // either way the other tasks follow it down.
    let relay_result = relay_task.await;
    shutdown.trigger();

    if let Err(e) = watcher_task.await {
        tracing::error!(error = %e, "Watcher task failed");
    }
    if let Err(e) = resolution_task.await {
        tracing::error!(error = %e, "Resolution task failed");
    }

    relay_result??;
    tracing::info!("Shutdown complete");
    Ok(())
}
