//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `blockchain.rpc_url`.
pub const RPC_ENDPOINT_ENV_VAR: &str = "BLOCKCHAIN_RPC_ENDPOINT";
/// Environment variable overriding `contract.address`.
pub const CONTRACT_ADDRESS_ENV_VAR: &str = "CONTRACT_ADDRESS";
/// Environment variable overriding `object_store.gateway_url`.
pub const GATEWAY_URL_ENV_VAR: &str = "IPFS_GATEWAY_BASE_URL";
/// Environment variable overriding `cursor_store.url`.
pub const CURSOR_STORE_URL_ENV_VAR: &str = "REDIS_URL";
/// Environment variable overriding `contract.start_block`.
pub const START_BLOCK_ENV_VAR: &str = "START_BLOCK_NUMBER";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, reason: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, reason } => write!(f, "Invalid {}: {}", var, reason),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration from an optional TOML file, apply process environment
/// overrides, and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<RelayConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => RelayConfig::default(),
    };

    let config = apply_env_overrides(config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay the required settings with values from `lookup`.
///
/// Empty values are ignored so an unset-but-exported variable does not
/// clobber the file.
pub fn apply_env_overrides<F>(mut config: RelayConfig, lookup: F) -> Result<RelayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

    if let Some(url) = get(RPC_ENDPOINT_ENV_VAR) {
        config.blockchain.rpc_url = url;
    }
    if let Some(address) = get(CONTRACT_ADDRESS_ENV_VAR) {
        config.contract.address = address;
    }
    if let Some(url) = get(GATEWAY_URL_ENV_VAR) {
        config.object_store.gateway_url = url;
    }
    if let Some(url) = get(CURSOR_STORE_URL_ENV_VAR) {
        config.cursor_store.url = url;
    }
    if let Some(block) = get(START_BLOCK_ENV_VAR) {
        let block = block.trim().parse::<u64>().map_err(|e| ConfigError::Env {
            var: START_BLOCK_ENV_VAR,
            reason: e.to_string(),
        })?;
        config.contract.start_block = Some(block);
    }

    Ok(config)
}
