//! Thread id allocator
//!
//! Ids double as stack slot indices. A freed id is handed out again before
//! any higher id, so the id space stays dense: a new thread always receives
//! the smallest id not held by a live thread.

use crate::bitmap::ThreadBitmap;
use crate::error::{UThreadError, UResult};
use crate::id::ThreadId;

/// Smallest-free id allocator over `0..max_threads`
#[derive(Debug, Clone)]
pub struct IdAllocator {
    /// One bit per id currently in use
    in_use: ThreadBitmap,
}

impl IdAllocator {
    /// Create an allocator with id 0 already taken by the main thread
    pub fn new(max_threads: usize) -> Self {
        let mut in_use = ThreadBitmap::new(max_threads);
        in_use.set(ThreadId::MAIN);
        Self { in_use }
    }

    /// Allocate the smallest free id
    pub fn allocate(&mut self) -> UResult<ThreadId> {
        let id = self.in_use.first_clear().ok_or(UThreadError::CapacityExceeded {
            max_threads: self.in_use.capacity(),
        })?;
        self.in_use.set(id);
        Ok(id)
    }

    /// Return an id to the pool. The main thread id is never released.
    pub fn release(&mut self, id: ThreadId) {
        if id.is_main() {
            return;
        }
        self.in_use.clear(id);
    }

    /// Check if an id is currently allocated
    #[inline]
    pub fn is_allocated(&self, id: ThreadId) -> bool {
        self.in_use.is_set(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_sequential() {
        let mut alloc = IdAllocator::new(100);

        let id1 = alloc.allocate().unwrap();
        let id2 = alloc.allocate().unwrap();
        let id3 = alloc.allocate().unwrap();

        assert_eq!(id1.as_u32(), 1);
        assert_eq!(id2.as_u32(), 2);
        assert_eq!(id3.as_u32(), 3);
        assert!(alloc.is_allocated(id3));
        assert!(!alloc.is_allocated(ThreadId::new(4)));
    }

    #[test]
    fn test_release_reuses_smallest() {
        let mut alloc = IdAllocator::new(100);

        let ids: Vec<_> = (0..5).map(|_| alloc.allocate().unwrap()).collect();
        alloc.release(ids[3]);
        alloc.release(ids[1]);

        assert_eq!(alloc.allocate().unwrap(), ids[1]);
        assert_eq!(alloc.allocate().unwrap(), ids[3]);
        assert_eq!(alloc.allocate().unwrap().as_u32(), 6);
    }

    #[test]
    fn test_allocate_exhaustion() {
        let mut alloc = IdAllocator::new(3);

        let _id1 = alloc.allocate().unwrap();
        let _id2 = alloc.allocate().unwrap();

        let result = alloc.allocate();
        assert!(matches!(result, Err(UThreadError::CapacityExceeded { max_threads: 3 })));
    }

    #[test]
    fn test_main_never_released() {
        let mut alloc = IdAllocator::new(4);
        alloc.release(ThreadId::MAIN);
        assert!(alloc.is_allocated(ThreadId::MAIN));
        assert_eq!(alloc.allocate().unwrap().as_u32(), 1);
    }
}
