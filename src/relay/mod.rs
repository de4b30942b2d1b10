//! Relay submission.
//!
//! # Data Flow
//! ```text
//! resolved TransactionRecord (channel)
//!     → submission.rs: enqueue by bid (gasPrice × gasLimit)
//!     → dequeue highest bid
//!     → contract.rs: simulate → submit → confirm
//!     → RelayOutcome (logged, counted)
//! ```
//!
//! Submissions are strictly sequential: the relay key never has more than
//! one transaction in flight from this loop.

pub mod contract;
pub mod submission;
pub mod types;

use thiserror::Error;

use crate::queue::HeapError;

pub use contract::RelayContract;
pub use submission::RelayLoop;
pub use types::{
    GasOverrides, RelayCall, RelayCallError, RelayOutcome, TransactionKind, TransactionRecord,
};

/// Errors that stop the relay loop.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("priority queue invariant violated: {0}")]
    Heap(#[from] HeapError),
}
