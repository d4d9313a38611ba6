//! FIFO ready queue
//!
//! Design:
//! - VecDeque with capacity reserved for every possible thread up front
//! - A thread id appears at most once
//! - Removal keeps the relative order of the others

use super::ReadyQueue;
use uthread_core::ThreadId;

use std::collections::VecDeque;

/// Strict first-in first-out ready queue
#[derive(Debug)]
pub struct FifoQueue {
    queue: VecDeque<ThreadId>,
}

impl FifoQueue {
    /// Create a queue able to hold `max_threads` ids without reallocating
    pub fn with_capacity(max_threads: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(max_threads),
        }
    }

    /// Queued ids, head first
    pub fn iter(&self) -> impl Iterator<Item = ThreadId> + '_ {
        self.queue.iter().copied()
    }
}

impl ReadyQueue for FifoQueue {
    fn push_back(&mut self, id: ThreadId) {
        debug_assert!(!self.contains(id), "{:?} queued twice", id);
        self.queue.push_back(id);
    }

    fn pop_front(&mut self) -> Option<ThreadId> {
        self.queue.pop_front()
    }

    fn remove(&mut self, id: ThreadId) -> bool {
        match self.queue.iter().position(|&queued| queued == id) {
            Some(pos) => {
                self.queue.remove(pos);
                true
            }
            None => false,
        }
    }

    fn contains(&self, id: ThreadId) -> bool {
        self.queue.contains(&id)
    }

    fn len(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(q: &FifoQueue) -> Vec<u32> {
        q.iter().map(ThreadId::as_u32).collect()
    }

    #[test]
    fn test_fifo_order() {
        let mut q = FifoQueue::with_capacity(8);
        assert!(q.is_empty());

        for n in [3, 1, 2] {
            q.push_back(ThreadId::new(n));
        }
        assert_eq!(q.len(), 3);
        assert_eq!(q.pop_front(), Some(ThreadId::new(3)));
        assert_eq!(q.pop_front(), Some(ThreadId::new(1)));
        assert_eq!(q.pop_front(), Some(ThreadId::new(2)));
        assert_eq!(q.pop_front(), None);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut q = FifoQueue::with_capacity(8);
        for n in 1..=4 {
            q.push_back(ThreadId::new(n));
        }

        assert!(q.remove(ThreadId::new(2)));
        assert!(!q.remove(ThreadId::new(2)));
        assert!(!q.contains(ThreadId::new(2)));
        assert_eq!(ids(&q), vec![1, 3, 4]);
    }

    #[test]
    fn test_no_reallocation_within_capacity() {
        let mut q = FifoQueue::with_capacity(16);
        let cap = q.queue.capacity();
        for n in 0..16 {
            q.push_back(ThreadId::new(n));
        }
        assert_eq!(q.queue.capacity(), cap);
    }
}
