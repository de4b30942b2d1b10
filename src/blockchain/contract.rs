//! Bindings for the relay master contract.

use alloy::primitives::{Address, TxHash};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::sol;
use async_trait::async_trait;

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::transaction::ConfirmationTracker;
use crate::blockchain::types::{BlockchainError, BlockchainResult, ConfirmationStatus};
use crate::blockchain::wallet::Wallet;
use crate::relay::contract::RelayContract;
use crate::relay::types::{GasOverrides, RelayCall, TransactionKind, TransactionRecord};

sol! {
    #[sol(rpc)]
    contract ChainWalletMaster {
        struct ProxyTransaction {
            address fromAddress;
            address agentAddress;
            address toAddress;
            uint256 value;
            uint256 nonce;
            uint256 gasLimit;
            uint256 gasPrice;
            bytes data;
            bytes signature;
        }

        /// Emitted when a user announces a new transaction intent.
        event TransactionCreated(bytes locator);

        function sendEtherAsProxy(ProxyTransaction calldata input) external;
        function interactAsProxy(ProxyTransaction calldata input) external;
    }
}

impl From<&TransactionRecord> for ChainWalletMaster::ProxyTransaction {
    fn from(record: &TransactionRecord) -> Self {
        Self {
            fromAddress: record.from_address,
            agentAddress: record.agent_address,
            toAddress: record.to_address,
            value: record.value,
            nonce: record.nonce,
            gasLimit: record.gas_limit,
            gasPrice: record.gas_price,
            data: record.data.clone(),
            signature: record.signature.clone(),
        }
    }
}

/// Relay contract backed by a signing RPC provider.
pub struct ChainWalletContract {
    instance: ChainWalletMaster::ChainWalletMasterInstance<DynProvider>,
    tracker: ConfirmationTracker,
}

impl ChainWalletContract {
    /// Bind the contract at `address`, signing with `wallet`.
    ///
    /// Submissions go through the primary RPC endpoint; confirmation
    /// polling uses `client` and its failovers.
    pub fn new(address: Address, wallet: &Wallet, client: BlockchainClient) -> BlockchainResult<Self> {
        let rpc_url = &client.config().rpc_url;
        let url: url::Url = rpc_url.parse().map_err(|e| {
            BlockchainError::Rpc(format!("Invalid RPC URL '{}': {}", rpc_url, e))
        })?;

        let provider = ProviderBuilder::new()
            .wallet(wallet.ethereum_wallet())
            .connect_http(url)
            .erased();

        Ok(Self {
            instance: ChainWalletMaster::new(address, provider),
            tracker: ConfirmationTracker::new(client),
        })
    }

    /// Address of the bound contract.
    pub fn address(&self) -> Address {
        *self.instance.address()
    }
}

#[async_trait]
impl RelayContract for ChainWalletContract {
    async fn simulate(&self, call: &RelayCall) -> BlockchainResult<u64> {
        let input = ChainWalletMaster::ProxyTransaction::from(&call.record);
        let GasOverrides { gas_limit, gas_price } = call.overrides;

        let estimate = match call.kind {
            TransactionKind::ValueTransfer => {
                self.instance
                    .sendEtherAsProxy(input)
                    .gas(gas_limit)
                    .gas_price(gas_price)
                    .estimate_gas()
                    .await
            }
            TransactionKind::ContractInteraction => {
                self.instance
                    .interactAsProxy(input)
                    .gas(gas_limit)
                    .gas_price(gas_price)
                    .estimate_gas()
                    .await
            }
        };

        estimate.map_err(|e| BlockchainError::Simulation(e.to_string()))
    }

    async fn submit(&self, call: &RelayCall) -> BlockchainResult<TxHash> {
        let input = ChainWalletMaster::ProxyTransaction::from(&call.record);
        let GasOverrides { gas_limit, gas_price } = call.overrides;

        let pending = match call.kind {
            TransactionKind::ValueTransfer => {
                self.instance
                    .sendEtherAsProxy(input)
                    .gas(gas_limit)
                    .gas_price(gas_price)
                    .send()
                    .await
            }
            TransactionKind::ContractInteraction => {
                self.instance
                    .interactAsProxy(input)
                    .gas(gas_limit)
                    .gas_price(gas_price)
                    .send()
                    .await
            }
        };

        pending
            .map(|pending| *pending.tx_hash())
            .map_err(|e| BlockchainError::Submission(e.to_string()))
    }

    async fn confirm(&self, tx_hash: TxHash) -> BlockchainResult<ConfirmationStatus> {
        self.tracker.wait_for_confirmation(tx_hash).await
    }
}
