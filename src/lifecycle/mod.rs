//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config (already validated) → wallet → RPC → cursor store → spawn tasks
//!
//! Running:
//!     watcher ──locators──▶ resolution service ──records──▶ relay loop
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → broadcast → every loop returns at its next await point
//! ```
//!
//! An in-flight submission is not cancelled by the signal itself; the relay
//! loop checks for shutdown between transactions.

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{run, StartupError};
