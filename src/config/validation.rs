//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check every required setting is present
//! - Validate value ranges (intervals > 0, capacities > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use alloy::primitives::Address;
use thiserror::Error;

use crate::config::schema::RelayConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required setting was not provided.
    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    /// A setting was provided but could not be interpreted.
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// A numeric setting must be strictly positive.
    #[error("`{0}` must be greater than zero")]
    NotPositive(&'static str),
}

/// Validate a fully assembled configuration.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_url(&mut errors, "blockchain.rpc_url", &config.blockchain.rpc_url);
    check_url(
        &mut errors,
        "object_store.gateway_url",
        &config.object_store.gateway_url,
    );

    if config.contract.address.is_empty() {
        errors.push(ValidationError::Missing("contract.address"));
    } else if let Err(e) = config.contract.address.parse::<Address>() {
        errors.push(ValidationError::Invalid {
            field: "contract.address",
            reason: e.to_string(),
        });
    }

    if config.contract.start_block.is_none() {
        errors.push(ValidationError::Missing("contract.start_block"));
    }

    if config.cursor_store.url.is_empty() {
        errors.push(ValidationError::Missing("cursor_store.url"));
    }
    if config.cursor_store.key.is_empty() {
        errors.push(ValidationError::Missing("cursor_store.key"));
    }

    let positives: [(&'static str, u64); 7] = [
        ("blockchain.rpc_timeout_secs", config.blockchain.rpc_timeout_secs),
        (
            "blockchain.confirmation_timeout_secs",
            config.blockchain.confirmation_timeout_secs,
        ),
        ("object_store.timeout_secs", config.object_store.timeout_secs),
        ("watcher.poll_interval_ms", config.watcher.poll_interval_ms),
        ("relay.idle_interval_ms", config.relay.idle_interval_ms),
        ("relay.channel_capacity", config.relay.channel_capacity as u64),
        (
            "relay.max_concurrent_resolutions",
            config.relay.max_concurrent_resolutions as u64,
        ),
    ];
    for (field, value) in positives {
        if value == 0 {
            errors.push(ValidationError::NotPositive(field));
        }
    }

    if config.cursor_store.connect_attempts == 0 {
        errors.push(ValidationError::NotPositive("cursor_store.connect_attempts"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.is_empty() {
        errors.push(ValidationError::Missing(field));
        return;
    }
    if let Err(e) = value.parse::<url::Url>() {
        errors.push(ValidationError::Invalid {
            field,
            reason: e.to_string(),
        });
    }
}
