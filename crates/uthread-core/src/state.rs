//! Thread state types

use core::fmt;
use crate::id::ThreadId;

/// Why a thread is BLOCKED
///
/// The cause decides how the thread leaves the blocked state: an explicit
/// block is undone by `resume`, a sync block only by termination of the
/// target thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockCause {
    /// Blocked through `block(tid)`
    Explicit,

    /// Waiting for the given thread to terminate
    Sync(ThreadId),
}

/// State of a user-level thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    /// In the ready queue, waiting for dispatch
    Ready,

    /// Currently executing (exactly one thread at any time)
    Running,

    /// Not schedulable until the block cause is cleared
    Blocked(BlockCause),
}

impl ThreadState {
    /// Check if this state allows the thread to be dispatched
    #[inline]
    pub const fn is_runnable(&self) -> bool {
        matches!(self, ThreadState::Ready)
    }

    /// Check if the thread is blocked for any reason
    #[inline]
    pub const fn is_blocked(&self) -> bool {
        matches!(self, ThreadState::Blocked(_))
    }

    /// Check if `resume` may move this thread back to READY
    #[inline]
    pub const fn is_resumable(&self) -> bool {
        matches!(self, ThreadState::Blocked(BlockCause::Explicit))
    }

    /// The thread this state is sync-waiting on, if any
    #[inline]
    pub const fn sync_target(&self) -> Option<ThreadId> {
        match self {
            ThreadState::Blocked(BlockCause::Sync(target)) => Some(*target),
            _ => None,
        }
    }
}

impl fmt::Display for ThreadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadState::Ready => write!(f, "READY"),
            ThreadState::Running => write!(f, "RUNNING"),
            ThreadState::Blocked(BlockCause::Explicit) => write!(f, "BLOCKED"),
            ThreadState::Blocked(BlockCause::Sync(t)) => write!(f, "BLOCKED(sync {})", t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_predicates() {
        assert!(ThreadState::Ready.is_runnable());
        assert!(!ThreadState::Running.is_runnable());
        assert!(!ThreadState::Blocked(BlockCause::Explicit).is_runnable());

        assert!(ThreadState::Blocked(BlockCause::Explicit).is_blocked());
        assert!(ThreadState::Blocked(BlockCause::Sync(ThreadId::new(3))).is_blocked());
        assert!(!ThreadState::Ready.is_blocked());
    }

    #[test]
    fn test_resume_only_clears_explicit_block() {
        assert!(ThreadState::Blocked(BlockCause::Explicit).is_resumable());
        assert!(!ThreadState::Blocked(BlockCause::Sync(ThreadId::new(1))).is_resumable());
        assert!(!ThreadState::Ready.is_resumable());
        assert!(!ThreadState::Running.is_resumable());
    }

    #[test]
    fn test_sync_target() {
        let t = ThreadId::new(5);
        assert_eq!(ThreadState::Blocked(BlockCause::Sync(t)).sync_target(), Some(t));
        assert_eq!(ThreadState::Blocked(BlockCause::Explicit).sync_target(), None);
        assert_eq!(ThreadState::Running.sync_target(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ThreadState::Running), "RUNNING");
        assert_eq!(
            format!("{}", ThreadState::Blocked(BlockCause::Sync(ThreadId::new(2)))),
            "BLOCKED(sync 2)"
        );
    }
}
