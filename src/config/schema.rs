//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the transaction relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Blockchain RPC settings.
    pub blockchain: BlockchainConfig,

    /// Relay contract settings.
    pub contract: ContractConfig,

    /// Content-addressed object store settings.
    pub object_store: ObjectStoreConfig,

    /// Cursor persistence settings.
    pub cursor_store: CursorStoreConfig,

    /// Chain event watcher settings.
    pub watcher: WatcherConfig,

    /// Relay submission loop settings.
    pub relay: RelayLoopConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Blockchain integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlockchainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// Expected chain ID. The node's own chain ID is always used for
    /// signing; when this is set, a node on a different chain is fatal.
    pub chain_id: Option<u64>,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Number of block confirmations awaited after each submission.
    pub confirmation_blocks: u32,

    /// Maximum time to wait for a submission to confirm, in seconds.
    pub confirmation_timeout_secs: u64,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            rpc_url: String::new(),
            failover_urls: Vec::new(),
            chain_id: None,
            rpc_timeout_secs: 10,
            confirmation_blocks: 1,
            confirmation_timeout_secs: 300,
        }
    }
}

/// Relay contract configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ContractConfig {
    /// Address of the relay master contract.
    pub address: String,

    /// Block the cursor is seeded from on first run.
    pub start_block: Option<u64>,
}

/// Object store gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObjectStoreConfig {
    /// Gateway base URL; identifiers are appended as a path segment.
    pub gateway_url: String,

    /// Per-fetch timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            gateway_url: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Cursor store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CursorStoreConfig {
    /// Redis connection string.
    pub url: String,

    /// Key the last processed block number is stored under.
    pub key: String,

    /// Connection attempts made at startup before giving up.
    pub connect_attempts: u32,
}

impl Default for CursorStoreConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            key: "cw_proxy__LastBlockNumber".to_string(),
            connect_attempts: 5,
        }
    }
}

/// Chain event watcher configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Sleep between polls that found no events, in milliseconds.
    pub poll_interval_ms: u64,

    /// Blocks behind head the watcher stays (0 = query up to head).
    pub confirmation_blocks: u64,

    /// Upper bound on the backoff after consecutive polling errors, in milliseconds.
    pub max_error_backoff_ms: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5_000,
            confirmation_blocks: 0,
            max_error_backoff_ms: 60_000,
        }
    }
}

/// Relay loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayLoopConfig {
    /// Sleep when the queue is empty, in milliseconds.
    pub idle_interval_ms: u64,

    /// Capacity of the locator and resolved-transaction channels.
    pub channel_capacity: usize,

    /// Maximum locators resolved at the same time.
    pub max_concurrent_resolutions: usize,
}

impl Default for RelayLoopConfig {
    fn default() -> Self {
        Self {
            idle_interval_ms: 2_000,
            channel_capacity: 1024,
            max_concurrent_resolutions: 8,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
