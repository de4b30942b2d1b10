//! Binary heap with a pluggable comparator.
//!
//! # Ordering
//! The comparator answers "should `a` be served before `b`?":
//! `Greater` means yes, `Less` means no, `Equal` falls back to insertion
//! order (first in, first out). Insertion order is the order of
//! `enqueue` calls; for relay records that is resolution completion
//! order, not announcement order. `None` is treated as a broken comparator
//! and surfaces as [`HeapError::Incomparable`].
//!
//! The default comparator orders by `priority` descending, so the highest
//! priority is dequeued first. Reversing it gives a min-heap.

use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// A value and the priority it was enqueued with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityNode<P, T> {
    pub priority: P,
    pub value: T,
}

impl<P, T> PriorityNode<P, T> {
    pub fn new(priority: P, value: T) -> Self {
        Self { priority, value }
    }
}

/// Heap operation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeapError {
    /// The comparator produced no ordering for two nodes.
    #[error("comparator returned no ordering for heap positions {left} and {right}")]
    Incomparable { left: usize, right: usize },

    /// The comparator produced no ordering for a node against itself.
    #[error("comparator cannot order the node being enqueued")]
    Unorderable,
}

/// Boxed comparator over nodes.
pub type Comparator<P, T> =
    Box<dyn Fn(&PriorityNode<P, T>, &PriorityNode<P, T>) -> Option<Ordering> + Send + Sync>;

struct Slot<P, T> {
    seq: u64,
    node: PriorityNode<P, T>,
}

/// Priority queue backed by an array-encoded binary heap.
///
/// The backing array is private; the heap property holds after every
/// `enqueue` and `dequeue`.
pub struct PriorityQueue<P, T> {
    slots: Vec<Slot<P, T>>,
    next_seq: u64,
    comparator: Comparator<P, T>,
}

impl<P: PartialOrd, T> PriorityQueue<P, T> {
    /// Max-priority-first queue.
    pub fn new() -> Self {
        Self::with_comparator(|a, b| a.priority.partial_cmp(&b.priority))
    }
}

impl<P: PartialOrd, T> Default for PriorityQueue<P, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, T> PriorityQueue<P, T> {
    pub fn with_comparator<F>(comparator: F) -> Self
    where
        F: Fn(&PriorityNode<P, T>, &PriorityNode<P, T>) -> Option<Ordering>
            + Send
            + Sync
            + 'static,
    {
        Self {
            slots: Vec::new(),
            next_seq: 0,
            comparator: Box::new(comparator),
        }
    }

    /// Insert a node. O(log n).
    ///
    /// A node the comparator cannot order against itself (a NaN priority,
    /// for instance) is rejected without touching the heap.
    pub fn enqueue(&mut self, node: PriorityNode<P, T>) -> Result<(), HeapError> {
        if (self.comparator)(&node, &node).is_none() {
            return Err(HeapError::Unorderable);
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.slots.push(Slot { seq, node });
        self.sift_up(self.slots.len() - 1)
    }

    /// Remove and return the head, or `None` when empty. O(log n).
    pub fn dequeue(&mut self) -> Result<Option<PriorityNode<P, T>>, HeapError> {
        if self.slots.is_empty() {
            return Ok(None);
        }

        let last = self.slots.len() - 1;
        self.slots.swap(0, last);
        let head = self.slots.pop().map(|slot| slot.node);
        if !self.slots.is_empty() {
            self.sift_down(0)?;
        }
        Ok(head)
    }

    /// The node `dequeue` would return next. O(1).
    pub fn peek(&self) -> Option<&PriorityNode<P, T>> {
        self.slots.first().map(|slot| &slot.node)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether the node at `i` must be served before the node at `j`.
    fn precedes(&self, i: usize, j: usize) -> Result<bool, HeapError> {
        let (a, b) = (&self.slots[i], &self.slots[j]);
        match (self.comparator)(&a.node, &b.node) {
            Some(Ordering::Greater) => Ok(true),
            Some(Ordering::Less) => Ok(false),
            Some(Ordering::Equal) => Ok(a.seq < b.seq),
            None => Err(HeapError::Incomparable { left: i, right: j }),
        }
    }

    fn sift_up(&mut self, mut index: usize) -> Result<(), HeapError> {
        while index > 0 {
            let parent = (index - 1) / 2;
            if !self.precedes(index, parent)? {
                break;
            }
            self.slots.swap(index, parent);
            index = parent;
        }
        Ok(())
    }

    fn sift_down(&mut self, mut index: usize) -> Result<(), HeapError> {
        let len = self.slots.len();
        loop {
            let left = 2 * index + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let child = if right < len && self.precedes(right, left)? {
                right
            } else {
                left
            };
            if !self.precedes(child, index)? {
                break;
            }
            self.slots.swap(index, child);
            index = child;
        }
        Ok(())
    }
}

impl<P, T> fmt::Debug for PriorityQueue<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityQueue")
            .field("len", &self.slots.len())
            .finish_non_exhaustive()
    }
}
