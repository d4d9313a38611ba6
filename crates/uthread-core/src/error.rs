//! Error types for the uthread scheduler

use core::fmt;
use crate::id::ThreadId;

/// Result type for scheduler operations
pub type UResult<T> = Result<T, UThreadError>;

/// Errors that can occur in scheduler operations
///
/// The first group is recoverable: the API reports them and returns a
/// failure to the caller. The second group (see [`UThreadError::is_fatal`])
/// means the library can no longer make progress and the process aborts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UThreadError {
    /// Bad input value (e.g. non-positive quantum)
    InvalidArgument(&'static str),

    /// Spawn would exceed the configured thread limit
    CapacityExceeded { max_threads: usize },

    /// No live thread has this id
    NoSuchThread(ThreadId),

    /// Operation is forbidden on this target (main thread, self)
    InvalidTarget(&'static str),

    /// Library used before `init`
    NotInitialized,

    /// `init` called twice
    AlreadyInitialized,

    /// Dispatch found the ready queue empty
    NoReadyThread,

    /// Stack region mapping failed
    MemoryError(MemoryError),

    /// An OS call failed; carries the call name and errno
    Platform { op: &'static str, errno: i32 },
}

impl UThreadError {
    /// Check if the error is an unrecoverable invariant or OS failure
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            UThreadError::NoReadyThread
                | UThreadError::MemoryError(_)
                | UThreadError::Platform { .. }
        )
    }
}

impl fmt::Display for UThreadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UThreadError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            UThreadError::CapacityExceeded { max_threads } => {
                write!(f, "thread limit reached ({} threads)", max_threads)
            }
            UThreadError::NoSuchThread(id) => write!(f, "no thread with id {}", id),
            UThreadError::InvalidTarget(msg) => write!(f, "invalid target: {}", msg),
            UThreadError::NotInitialized => write!(f, "library not initialized"),
            UThreadError::AlreadyInitialized => write!(f, "library already initialized"),
            UThreadError::NoReadyThread => write!(f, "no ready thread to dispatch"),
            UThreadError::MemoryError(e) => write!(f, "memory error: {}", e),
            UThreadError::Platform { op, errno } => write!(f, "{} failed (errno {})", op, errno),
        }
    }
}

impl std::error::Error for UThreadError {}

/// Memory-related errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// mmap failed
    AllocationFailed,

    /// mprotect failed
    ProtectionFailed,

    /// madvise failed
    AdviseFailed,

    /// Requested region does not fit the address space
    TooManySlots,

    /// Invalid slot index
    InvalidSlot,
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::AllocationFailed => write!(f, "memory allocation failed"),
            MemoryError::ProtectionFailed => write!(f, "memory protection change failed"),
            MemoryError::AdviseFailed => write!(f, "memory advise failed"),
            MemoryError::TooManySlots => write!(f, "too many slots requested"),
            MemoryError::InvalidSlot => write!(f, "invalid slot ID"),
        }
    }
}

impl From<MemoryError> for UThreadError {
    fn from(e: MemoryError) -> Self {
        UThreadError::MemoryError(e)
    }
}
