//! Response queue backing every simulator.

use std::collections::VecDeque;

use super::errors::FakeError;

/// Ordered, consume-once sequence of canned entries.
///
/// Entries are moved in by [`push`](Self::push) and moved out front-first by
/// [`pop`](Self::pop); there is no replay and no reordering.
#[derive(Debug, Clone)]
pub struct ResponseQueue<T> {
    entries: VecDeque<T>,
    pushed: usize,
    popped: usize,
}

impl<T> ResponseQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            pushed: 0,
            popped: 0,
        }
    }

    /// Append an entry at the back.
    pub fn push(&mut self, entry: T) {
        self.entries.push_back(entry);
        self.pushed += 1;
    }

    /// Remove and return the front entry.
    pub fn pop(&mut self) -> Result<T, FakeError> {
        let entry = self.entries.pop_front().ok_or(FakeError::EmptyQueue)?;
        self.popped += 1;
        Ok(entry)
    }

    /// The entry the next `pop` would return.
    pub fn front(&self) -> Option<&T> {
        self.entries.front()
    }

    /// Entries not yet consumed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total entries ever pushed.
    pub fn pushed(&self) -> usize {
        self.pushed
    }

    /// Total entries consumed so far.
    pub fn popped(&self) -> usize {
        self.popped
    }
}

impl<T> Default for ResponseQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for ResponseQueue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut queue = Self::new();
        for entry in iter {
            queue.push(entry);
        }
        queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = ResponseQueue::new();
        queue.push("a");
        queue.push("b");
        assert_eq!(queue.front(), Some(&"a"));
        assert_eq!(queue.pop().unwrap(), "a");
        assert_eq!(queue.pop().unwrap(), "b");
    }

    #[test]
    fn test_pop_empty() {
        let mut queue: ResponseQueue<u8> = ResponseQueue::new();
        assert_eq!(queue.pop(), Err(FakeError::EmptyQueue));
        assert_eq!(queue.popped(), 0);
    }

    #[test]
    fn test_pops_before_exhaustion_equal_pushes() {
        for n in 0..8 {
            let mut queue: ResponseQueue<usize> = (0..n).collect();
            let mut pops = 0;
            while queue.pop().is_ok() {
                pops += 1;
            }
            assert_eq!(pops, n);
            assert_eq!(queue.pushed(), n);
            assert_eq!(queue.popped(), n);
            assert!(queue.is_empty());
        }
    }

    #[test]
    fn test_no_replay_after_drain() {
        let mut queue: ResponseQueue<u8> = [1, 2].into_iter().collect();
        queue.pop().unwrap();
        queue.pop().unwrap();
        queue.push(3);
        assert_eq!(queue.pop().unwrap(), 3);
        assert_eq!(queue.pop(), Err(FakeError::EmptyQueue));
    }
}
