//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, environment overrides)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → passed by reference into each component constructor
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no global instance
//! - Optional fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    BlockchainConfig, ContractConfig, CursorStoreConfig, ObjectStoreConfig, ObservabilityConfig,
    RelayConfig, RelayLoopConfig, WatcherConfig,
};
