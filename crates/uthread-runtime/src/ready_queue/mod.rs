//! Ready queue abstraction for uthread scheduling
//!
//! Provides a trait-based abstraction allowing different scheduling strategies.
//!
//! # Implementations
//! - `FifoQueue` - strict round-robin order

mod fifo;

pub use fifo::FifoQueue;

use uthread_core::ThreadId;

/// Trait for ready queue implementations
///
/// Implementations are used from the SIGVTALRM handler, so `push_back`
/// and `pop_front` must not allocate once the queue is built.
pub trait ReadyQueue {
    /// Append a READY thread at the tail
    fn push_back(&mut self, id: ThreadId);

    /// Take the thread at the head
    fn pop_front(&mut self) -> Option<ThreadId>;

    /// Remove a thread wherever it sits. Returns true if it was queued.
    fn remove(&mut self, id: ThreadId) -> bool;

    /// Check whether a thread is queued
    fn contains(&self, id: ThreadId) -> bool;

    /// Number of queued threads
    fn len(&self) -> usize;

    /// Check if empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
