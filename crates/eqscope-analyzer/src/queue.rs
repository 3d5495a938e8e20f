//! Small bounded queues for spectrum frames and render paths, where the consumer only ever
//! cares about the most recent element.
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// What to do when pushing into a full queue.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Evict the oldest unread element to make room for the new one.
    #[default]
    DropOldest,
    /// Keep the queue as is and discard the new element.
    RejectNewest,
}

/// Bounded FIFO queue applying an [`OverflowPolicy`] when full.
#[derive(Debug, Clone)]
pub struct BoundedQueue<T> {
    items: VecDeque<T>,
    capacity: usize,
    policy: OverflowPolicy,
    dropped: u64,
}

impl<T> BoundedQueue<T> {
    /// Create a new queue holding at most `capacity` elements (at least one).
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
            policy,
            dropped: 0,
        }
    }

    /// Push a new element. Returns false if an element had to be dropped, either the oldest one
    /// or `item` itself depending on the policy.
    pub fn push(&mut self, item: T) -> bool {
        if self.items.len() < self.capacity {
            self.items.push_back(item);
            return true;
        }
        self.dropped += 1;
        match self.policy {
            OverflowPolicy::DropOldest => {
                self.items.pop_front();
                self.items.push_back(item);
            }
            OverflowPolicy::RejectNewest => {}
        }
        false
    }

    /// Pop the oldest element.
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Drain the queue, returning its most recent element.
    pub fn latest(&mut self) -> Option<T> {
        let last = self.items.pop_back();
        self.items.clear();
        last
    }

    /// Number of queued elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Maximum number of queued elements.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remove all queued elements.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Total number of elements dropped on overflow.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
