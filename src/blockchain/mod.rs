//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (private key) + RelayConfig (RPC URL, contract)
//!     → wallet.rs (key loading)
//!     → client.rs (RPC connection with timeouts and failover)
//!     → contract.rs (dry-run + submission of relay calls)
//!     → transaction.rs (confirmation tracking)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod contract;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::BlockchainClient;
pub use contract::{ChainWalletContract, ChainWalletMaster};
pub use transaction::ConfirmationTracker;
pub use types::{BlockchainConfig, BlockchainError, BlockchainResult, ConfirmationStatus};
pub use wallet::Wallet;
