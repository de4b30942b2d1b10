//! Relay domain types.

use alloy::primitives::{keccak256, Address, Bytes, TxHash, B256, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A user-signed transaction recovered from its locator.
///
/// Field names follow the JSON the client encrypts, so the payload
/// deserializes directly into this struct. `type_tag` is not part of the
/// JSON; the resolver attaches it from the payload header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub from_address: Address,
    pub agent_address: Address,
    pub to_address: Address,
    #[serde(deserialize_with = "quantity::deserialize")]
    pub value: U256,
    #[serde(deserialize_with = "quantity::deserialize")]
    pub nonce: U256,
    #[serde(deserialize_with = "quantity::deserialize")]
    pub gas_limit: U256,
    #[serde(deserialize_with = "quantity::deserialize")]
    pub gas_price: U256,
    pub data: Bytes,
    pub signature: Bytes,
    #[serde(default, skip_serializing)]
    pub type_tag: B256,
}

impl TransactionRecord {
    /// The relay bid: gasPrice × gasLimit.
    pub fn bid(&self) -> U256 {
        self.gas_price.saturating_mul(self.gas_limit)
    }

    /// The contract entry point this record targets, if the tag is known.
    pub fn kind(&self) -> Option<TransactionKind> {
        TransactionKind::from_type_tag(&self.type_tag)
    }
}

/// Which relay entry point a transaction is submitted through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    /// `sendEtherAsProxy`
    ValueTransfer,
    /// `interactAsProxy`
    ContractInteraction,
}

impl TransactionKind {
    /// Preimage of the value-transfer type tag.
    pub const VALUE_TRANSFER_ID: &'static str = "sendEthersTransaction";
    /// Preimage of the contract-interaction type tag.
    pub const CONTRACT_INTERACTION_ID: &'static str = "contractInteractionTransaction";

    /// The 32-byte tag clients prefix payloads of this kind with.
    pub fn type_tag(self) -> B256 {
        match self {
            TransactionKind::ValueTransfer => keccak256(Self::VALUE_TRANSFER_ID),
            TransactionKind::ContractInteraction => keccak256(Self::CONTRACT_INTERACTION_ID),
        }
    }

    pub fn from_type_tag(tag: &B256) -> Option<Self> {
        [
            TransactionKind::ValueTransfer,
            TransactionKind::ContractInteraction,
        ]
        .into_iter()
        .find(|kind| kind.type_tag() == *tag)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::ValueTransfer => "value_transfer",
            TransactionKind::ContractInteraction => "contract_interaction",
        }
    }
}

/// Gas settings a relay call is simulated and submitted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasOverrides {
    pub gas_limit: u64,
    pub gas_price: u128,
}

/// Why a record cannot be turned into a relay call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayCallError {
    #[error("unsupported transaction type {0}")]
    UnsupportedType(B256),

    #[error("gas limit {0} does not fit in 64 bits")]
    GasLimitOverflow(U256),

    #[error("gas price {0} does not fit in 128 bits")]
    GasPriceOverflow(U256),
}

/// A record paired with the entry point and overrides it will be relayed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayCall {
    pub kind: TransactionKind,
    pub overrides: GasOverrides,
    pub record: TransactionRecord,
}

impl RelayCall {
    pub fn new(record: TransactionRecord) -> Result<Self, RelayCallError> {
        let kind = record
            .kind()
            .ok_or(RelayCallError::UnsupportedType(record.type_tag))?;
        let gas_limit = u64::try_from(record.gas_limit)
            .map_err(|_| RelayCallError::GasLimitOverflow(record.gas_limit))?;
        let gas_price = u128::try_from(record.gas_price)
            .map_err(|_| RelayCallError::GasPriceOverflow(record.gas_price))?;

        Ok(Self {
            kind,
            overrides: GasOverrides {
                gas_limit,
                gas_price,
            },
            record,
        })
    }
}

/// What happened to a single dequeued transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Included and confirmed.
    Confirmed { tx_hash: TxHash, block_number: u64 },
    /// Never simulated: unknown type or unusable overrides.
    Rejected(String),
    /// Dry-run reverted; nothing was broadcast.
    SimulationFailed(String),
    /// Broadcast failed, or confirmation could not be observed.
    SubmissionFailed(String),
    /// Mined but reverted on-chain.
    Reverted { tx_hash: TxHash, reason: String },
}

impl RelayOutcome {
    /// Metric label for the outcome.
    pub fn label(&self) -> &'static str {
        match self {
            RelayOutcome::Confirmed { .. } => "confirmed",
            RelayOutcome::Rejected(_) => "rejected",
            RelayOutcome::SimulationFailed(_) => "simulation_failed",
            RelayOutcome::SubmissionFailed(_) => "submission_failed",
            RelayOutcome::Reverted { .. } => "reverted",
        }
    }
}

/// Lenient decoding of the numeric fields clients emit.
mod quantity {
    use alloy::primitives::U256;
    use serde::de::{self, Deserializer};
    use serde::Deserialize;
    use std::str::FromStr;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(u64),
        Text(String),
        // JSON-serialised ethers BigNumber: {"type":"BigNumber","hex":"0x.."}
        BigNumber { hex: String },
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = match Repr::deserialize(deserializer)? {
            Repr::Number(n) => return Ok(U256::from(n)),
            Repr::Text(s) | Repr::BigNumber { hex: s } => s,
        };
        U256::from_str(text.trim())
            .map_err(|e| de::Error::custom(format!("invalid quantity {:?}: {}", text, e)))
    }
}
