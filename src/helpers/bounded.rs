//! Bounded newest-first archive
//!
//! Fixed-capacity deque used for log entries and navigation history.
//! New items go to the front; past the bound the item at the back, which is
//! always the oldest, is evicted.

use std::collections::VecDeque;

#[derive(Clone, Debug)]
pub struct BoundedDeque<T> {
    bound: usize,
    items: VecDeque<T>,
}

impl<T> BoundedDeque<T> {
    /// A bound of 0 makes every push a no-op
    pub fn new(bound: usize) -> Self {
        Self {
            bound,
            items: VecDeque::with_capacity(bound.min(1024)),
        }
    }

    /// Prepend `value`, returning the evicted oldest item if the bound was exceeded
    pub fn push(&mut self, value: T) -> Option<T> {
        if self.bound == 0 {
            return None;
        }
        self.items.push_front(value);
        (self.items.len() > self.bound)
            .then(|| self.items.pop_back())
            .flatten()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.bound
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Clone the items out, newest first
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.items.iter().cloned().collect()
    }
}
