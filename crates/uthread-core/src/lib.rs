//! # uthread-core
//!
//! Core types for the uthread (user-level thread) scheduler.
//!
//! This crate is platform-agnostic and contains no OS-specific code.
//! Context switching, stacks, signals and the scheduler itself live in
//! `uthread-runtime`.
//!
//! ## Modules
//!
//! - `id` - Thread identifier type
//! - `state` - Thread state and block cause
//! - `bitmap` - Fixed-size thread id bitmap
//! - `slot` - Smallest-free id allocator
//! - `error` - Error types
//! - `kprint` - Kernel-style debug printing macros
//! - `env` - Environment variable utilities

pub mod id;
pub mod state;
pub mod bitmap;
pub mod slot;
pub mod error;
pub mod kprint;
pub mod env;

// Re-exports for convenience
pub use id::ThreadId;
pub use state::{BlockCause, ThreadState};
pub use bitmap::ThreadBitmap;
pub use slot::IdAllocator;
pub use error::{MemoryError, UThreadError, UResult};
pub use env::{env_get, env_get_bool, env_get_opt};

/// Layout constants shared by the runtime
///
/// Tunable defaults (quantum, thread limit, stack size) are generated by
/// the runtime's build script instead.
pub mod constants {
    /// Smallest stack the runtime accepts
    pub const MIN_STACK_SIZE: usize = 16 * 1024;

    /// Guard page size below every stack
    pub const GUARD_SIZE: usize = 4096;

    /// Stack pointer alignment required by the supported ABIs
    pub const STACK_ALIGN: usize = 16;
}
