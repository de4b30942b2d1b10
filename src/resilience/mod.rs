//! Resilience helpers.
//!
//! Every retry in the relay is a loop with an attempt counter whose delay
//! comes from `backoff.rs`: cursor store connection at startup and the
//! watcher's recovery from polling errors.

pub mod backoff;
