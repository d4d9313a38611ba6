//! # uthread-runtime
//!
//! Platform-specific runtime implementation for the uthread scheduler.
//!
//! This crate provides:
//! - Stack region management (mmap, one slot per thread id)
//! - Signal handling (SIGVTALRM masking and the preemption handler)
//! - Virtual interval timer (setitimer ITIMER_VIRTUAL)
//! - Context switching (architecture-specific assembly)
//! - The scheduler state machine and the process-wide runtime

pub mod config;
pub mod memory;
pub mod signal;
pub mod arch;
pub mod timer;
pub mod ready_queue;
pub mod tcb;
pub mod scheduler;
pub mod global;

// Re-exports
pub use config::{ConfigError, SchedulerConfig};
pub use scheduler::{Scheduler, Switch, Termination};
pub use tcb::EntryFn;

// Architecture detection
cfg_if::cfg_if! {
    if #[cfg(target_arch = "x86_64")] {
        pub use arch::x86_64 as current_arch;
    } else if #[cfg(target_arch = "aarch64")] {
        pub use arch::aarch64 as current_arch;
    } else {
        compile_error!("Unsupported architecture");
    }
}
