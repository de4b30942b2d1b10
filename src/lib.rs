//! Transaction relay for chain wallet proxy transactions.
//!
//! Watches the relay contract for `TransactionCreated` announcements,
//! resolves each locator into an encrypted user-signed transaction, and
//! relays the highest-paying transactions one at a time.

// Core pipeline
pub mod watcher;
pub mod resolver;
pub mod queue;
pub mod relay;

// Collaborators
pub mod blockchain;
pub mod storage;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::RelayConfig;
pub use lifecycle::Shutdown;
