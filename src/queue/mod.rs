//! Relay priority queue.
//!
//! A binary heap of resolved transactions keyed by bid. The relay loop owns
//! the only instance, so no locking is involved; resolved transactions
//! reach it over a channel.

pub mod heap;

pub use heap::{Comparator, HeapError, PriorityNode, PriorityQueue};
