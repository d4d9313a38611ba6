//! Thread identifier type

use core::fmt;

/// Identifier of a user-level thread
///
/// Ids index directly into the TCB table and the stack region, so they are
/// small and dense. Id 0 always names the main thread.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ThreadId(u32);

impl ThreadId {
    /// The main thread (the flow of control that called `init`)
    pub const MAIN: ThreadId = ThreadId(0);

    /// Create a new ThreadId from a raw value
    #[inline]
    pub const fn new(id: u32) -> Self {
        ThreadId(id)
    }

    /// Get the raw u32 value
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Get as usize for indexing
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Check if this is the main thread
    #[inline]
    pub const fn is_main(self) -> bool {
        self.0 == 0
    }

    /// Convert a C-style `int` id; negative values name no thread
    #[inline]
    pub fn from_raw(raw: i32) -> Option<ThreadId> {
        u32::try_from(raw).ok().map(ThreadId)
    }
}

impl From<u32> for ThreadId {
    #[inline]
    fn from(id: u32) -> Self {
        ThreadId(id)
    }
}

impl From<ThreadId> for u32 {
    #[inline]
    fn from(id: ThreadId) -> Self {
        id.0
    }
}

impl fmt::Debug for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ThreadId({})", self.0)
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_id_basics() {
        let id = ThreadId::new(42);
        assert_eq!(id.as_u32(), 42);
        assert_eq!(id.as_usize(), 42);
        assert!(!id.is_main());
        assert!(ThreadId::MAIN.is_main());
    }

    #[test]
    fn test_thread_id_from_raw() {
        assert_eq!(ThreadId::from_raw(7), Some(ThreadId::new(7)));
        assert_eq!(ThreadId::from_raw(0), Some(ThreadId::MAIN));
        assert_eq!(ThreadId::from_raw(-1), None);
    }

    #[test]
    fn test_thread_id_conversions() {
        let id: ThreadId = 100u32.into();
        let raw: u32 = id.into();
        assert_eq!(raw, 100);
        assert_eq!(format!("{}", id), "100");
        assert_eq!(format!("{:?}", id), "ThreadId(100)");
    }
}
