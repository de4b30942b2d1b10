//! Errors and status values shared by the chain-facing code.

use thiserror::Error;

pub use crate::config::schema::BlockchainConfig;

#[derive(Debug, Error)]
pub enum BlockchainError {
    /// Every RPC endpoint failed or timed out.
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Transaction not confirmed after {0} seconds")]
    ConfirmationTimeout(u64),

    /// `eth_estimateGas` rejected the relay call.
    #[error("Simulation failed: {0}")]
    Simulation(String),

    #[error("Submission failed: {0}")]
    Submission(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Where a submitted relay call stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Mined, but shallower than the required depth.
    Confirming { current: u32, required: u32 },
    Confirmed { block_number: u64 },
    /// Mined with a failed receipt status.
    Failed(String),
}

impl ConfirmationStatus {
    pub fn is_final(&self) -> bool {
        !matches!(self, ConfirmationStatus::Confirming { .. })
    }
}
