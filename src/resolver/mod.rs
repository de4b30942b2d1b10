//! Locator resolution.
//!
//! # Data Flow
//! ```text
//! announced locator (utf-8 id of the key envelope)
//!     → store.rs: fetch envelope
//!     → payload.rs: key | iv | payload id
//!     → store.rs: fetch payload object
//!     → payload.rs: type tag | auth tag | ciphertext → AES-256-GCM → JSON
//!     → TransactionRecord
//! ```
//!
//! `service.rs` runs resolutions concurrently between the watcher and the
//! relay loop. A failed resolution drops that locator only.

pub mod locator;
pub mod payload;
pub mod service;
pub mod store;

use thiserror::Error;

pub use locator::LocatorResolver;
pub use payload::{seal, KeyEnvelope, SealedPayload};
pub use service::ResolutionService;
pub use store::{HttpObjectStore, ObjectStore, ObjectStoreError};

/// Why a locator could not be turned into a transaction record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("malformed locator: {0}")]
    MalformedLocator(String),

    #[error("{what} too short ({len} bytes)")]
    Malformed { what: &'static str, len: usize },

    #[error("failed to fetch object {id}: {reason}")]
    Fetch { id: String, reason: String },

    #[error("payload failed authentication")]
    Authentication,

    #[error("payload is not a transaction record: {0}")]
    Parse(String),

    /// Only raised when sealing a record, never while resolving one.
    #[error("failed to encrypt payload")]
    Encryption,
}

impl ResolutionError {
    /// Metric label for the failure class.
    pub fn label(&self) -> &'static str {
        match self {
            ResolutionError::MalformedLocator(_) | ResolutionError::Malformed { .. } => "malformed",
            ResolutionError::Fetch { .. } => "fetch_failed",
            ResolutionError::Authentication => "authentication_failed",
            ResolutionError::Parse(_) => "parse_failed",
            ResolutionError::Encryption => "encryption_failed",
        }
    }
}
