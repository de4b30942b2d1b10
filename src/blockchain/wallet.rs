//! Relay signing key.
//!
//! The key is read from the environment only, never from the config file,
//! and is never logged. Only the derived address appears in logs.

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Environment variable holding the relay's hex private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "RELAY_PRIVATE_KEY";

/// The account that pays for and signs every relayed call.
#[derive(Debug, Clone)]
pub struct Wallet {
    signer: PrivateKeySigner,
}

impl Wallet {
    /// Parse a hex key (optional `0x` prefix, surrounding whitespace ignored)
    /// and bind it to `chain_id` for EIP-155 signatures.
    pub fn from_private_key(private_key_hex: &str, chain_id: u64) -> BlockchainResult<Self> {
        let trimmed = private_key_hex.trim();
        let key_hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);

        let signer = key_hex
            .parse::<PrivateKeySigner>()
            .map_err(|e| BlockchainError::Wallet(format!("Invalid private key format: {}", e)))?
            .with_chain_id(Some(chain_id));

        tracing::info!(address = %signer.address(), chain_id, "Relay wallet loaded");
        Ok(Self { signer })
    }

    /// Load the key through `lookup`; a missing or blank value is an error.
    pub fn from_lookup<F>(chain_id: u64, lookup: F) -> BlockchainResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(PRIVATE_KEY_ENV_VAR).filter(|v| !v.trim().is_empty()) {
            Some(key) => Self::from_private_key(&key, chain_id),
            None => Err(BlockchainError::Wallet(format!(
                "{} is not set",
                PRIVATE_KEY_ENV_VAR
            ))),
        }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.signer.chain_id()
    }

    /// Network wallet for the signing provider used to submit relay calls.
    pub fn ethereum_wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Anvil account #0
    const ANVIL_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const ANVIL_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    fn address_of(wallet: &Wallet) -> String {
        wallet.address().to_string().to_lowercase()
    }

    #[test]
    fn test_key_formats() {
        for raw in [
            ANVIL_KEY.to_string(),
            format!("0x{}", ANVIL_KEY),
            format!("  0x{}\n", ANVIL_KEY),
        ] {
            let wallet = Wallet::from_private_key(&raw, 31337).unwrap();
            assert_eq!(address_of(&wallet), ANVIL_ADDRESS);
            assert_eq!(wallet.chain_id(), Some(31337));
        }
    }

    #[test]
    fn test_invalid_private_key() {
        let err = Wallet::from_private_key("not-hex", 1).unwrap_err();
        assert!(err.to_string().contains("Invalid private key"));
    }

    #[test]
    fn test_lookup_reads_relay_key() {
        let wallet = Wallet::from_lookup(1, |var| {
            (var == PRIVATE_KEY_ENV_VAR).then(|| ANVIL_KEY.to_string())
        })
        .unwrap();
        assert_eq!(address_of(&wallet), ANVIL_ADDRESS);
    }

    #[test]
    fn test_missing_or_blank_key() {
        let missing = Wallet::from_lookup(1, |_| None).unwrap_err();
        assert!(missing.to_string().contains(PRIVATE_KEY_ENV_VAR));

        let blank = Wallet::from_lookup(1, |_| Some("   ".to_string())).unwrap_err();
        assert!(matches!(blank, BlockchainError::Wallet(_)));
    }

    #[test]
    fn test_ethereum_wallet_signs_as_relay() {
        use alloy::network::{Ethereum, NetworkWallet};

        let wallet = Wallet::from_private_key(ANVIL_KEY, 1).unwrap();
        assert_eq!(
            NetworkWallet::<Ethereum>::default_signer_address(&wallet.ethereum_wallet()),
            wallet.address()
        );
    }
}
