//! Ordered double-ended sequence backing the lock's wait list.

use std::collections::VecDeque;

/// A double-ended FIFO sequence.
///
/// Items pushed at the back come out of the front in arrival order. The
/// front end also accepts pushes so a caller can put an item back at the
/// head of the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FifoQueue<T> {
    items: VecDeque<T>,
}

impl<T> FifoQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Appends an item at the back (the end of the line).
    pub fn push_back(&mut self, value: T) {
        self.items.push_back(value);
    }

    /// Inserts an item at the front (the head of the line).
    pub fn push_front(&mut self, value: T) {
        self.items.push_front(value);
    }

    /// Removes the longest-waiting item.
    pub fn pop_front(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Removes the most recently appended item.
    pub fn pop_back(&mut self) -> Option<T> {
        self.items.pop_back()
    }

    /// Peeks at the longest-waiting item.
    pub fn front(&self) -> Option<&T> {
        self.items.front()
    }

    /// Iterates from front to back.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<T> Default for FifoQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for FifoQueue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> Extend<T> for FifoQueue<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}
