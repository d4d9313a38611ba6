//! # uthread - user-level green threads
//!
//! Many logical threads multiplexed onto one OS thread, scheduled
//! preemptively in round-robin order.
//!
//! ## Features
//!
//! - **Preemption**: SIGVTALRM from a virtual interval timer ends every quantum
//! - **Strict FIFO**: threads run in the order they became READY
//! - **Block / resume**: suspend a thread until another one resumes it
//! - **Sync**: wait for a thread to terminate
//! - **Dense ids**: a new thread gets the smallest free id, main is always 0
//!
//! ## Quick Start
//!
//! ```ignore
//! use uthread::ThreadId;
//!
//! fn main() {
//!     uthread::init(10_000).unwrap();
//!
//!     let worker = uthread::spawn(|| {
//!         uthread::uprintln!("hello from thread {}", uthread::get_tid());
//!     })
//!     .unwrap();
//!
//!     // Burn CPU until the worker has had its turn
//!     while uthread::get_quantums(worker).is_ok() {
//!         std::hint::spin_loop();
//!     }
//!
//!     // Releases everything and exits with status 0
//!     let _ = uthread::terminate(ThreadId::MAIN);
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      User Code                              │
//! │        spawn(), block(), resume(), sync(), terminate()      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │  SIGVTALRM masked
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Scheduler                              │
//! │       FIFO ready queue, blocked set, sync waiter lists      │
//! └─────────────────────────────────────────────────────────────┘
//!          │                   │                   │
//!          ▼                   ▼                   ▼
//!    ┌───────────┐      ┌───────────┐      ┌───────────┐
//!    │   Timer   │      │  Context  │      │   Stack   │
//!    │ SIGVTALRM │      │  Switch   │      │  Region   │
//!    └───────────┘      └───────────┘      └───────────┘
//! ```
//!
//! ## Errors
//!
//! Every failing call logs `thread library error: <reason>` and returns the
//! error. Failures the library cannot recover from (memory mapping, signal
//! or timer setup, an empty ready queue) print `system error: <reason>` and
//! abort the process.

pub mod capi;

// Re-export core types
pub use uthread_core::{BlockCause, ThreadId, ThreadState, UResult, UThreadError};

// Re-export kprint macros for debug logging
pub use uthread_core::{kprint, kprintln, kerror, kdebug};
pub use uthread_core::kprint::{LogLevel, set_log_level};

// Re-export env utilities
pub use uthread_core::{env_get, env_get_bool, env_get_opt};

// Re-export runtime types
pub use uthread_runtime::{ConfigError, SchedulerConfig};

use uthread_runtime::global;
use uthread_runtime::signal::PreemptionGuard;

/// Log a failed call; abort on errors the library cannot survive
fn report<T>(result: UResult<T>) -> UResult<T> {
    if let Err(e) = &result {
        if e.is_fatal() {
            global::fatal(e.clone());
        }
        without_preemption(|| kprintln!("thread library error: {}", e));
    }
    result
}

/// Run `f` with preemption masked
///
/// std's stdout and stderr handles may not be re-entered by another green
/// thread halfway through a write, so printing from threads goes through
/// here (see [`uprintln!`]).
pub fn without_preemption<R>(f: impl FnOnce() -> R) -> R {
    let _guard = PreemptionGuard::new().unwrap_or_else(|e| global::fatal(e));
    f()
}

/// `println!` that cannot be preempted mid-line
#[macro_export]
macro_rules! uprintln {
    ($($arg:tt)*) => {
        $crate::without_preemption(|| println!($($arg)*))
    };
}

/// Initialize the library with a quantum of `quantum_usecs` microseconds
///
/// The calling flow of control becomes the main thread (id 0), RUNNING in
/// its first quantum. Thread limit and stack size come from
/// [`SchedulerConfig::from_env`].
pub fn init(quantum_usecs: i32) -> UResult<()> {
    if quantum_usecs <= 0 {
        return report(Err(UThreadError::InvalidArgument(
            "quantum_usecs must be positive",
        )));
    }
    init_with_config(SchedulerConfig::from_env().quantum_usecs(quantum_usecs as u64))
}

/// Initialize the library with a full configuration
pub fn init_with_config(config: SchedulerConfig) -> UResult<()> {
    report(global::init_with_config(config))
}

/// Check whether the library has been initialized
pub fn is_initialized() -> bool {
    global::is_initialized()
}

/// Spawn a thread at the tail of the ready queue
///
/// Returning from `f` terminates the thread. A panic escaping `f` aborts
/// the process.
///
/// # Example
///
/// ```ignore
/// let id = uthread::spawn(|| {
///     for i in 0..3 {
///         uthread::uprintln!("step {}", i);
///     }
/// })?;
/// ```
pub fn spawn<F>(f: F) -> UResult<ThreadId>
where
    F: FnOnce() + 'static,
{
    report(global::spawn(Box::new(f)))
}

/// Terminate a thread
///
/// Threads sync-waiting on it become READY. Terminating the running thread
/// never returns; terminating [`ThreadId::MAIN`] releases all library
/// memory and exits the process with status 0.
pub fn terminate(tid: ThreadId) -> UResult<()> {
    report(global::terminate(tid))
}

/// Block a thread until [`resume`] is called on it
///
/// Blocking an already blocked thread does nothing. A thread blocking
/// itself returns from this call once it has been resumed and dispatched.
/// The main thread cannot be blocked.
pub fn block(tid: ThreadId) -> UResult<()> {
    report(global::block(tid))
}

/// Move an explicitly blocked thread to the tail of the ready queue
///
/// READY and RUNNING threads are unaffected, and so are threads blocked in
/// [`sync`].
pub fn resume(tid: ThreadId) -> UResult<()> {
    report(global::resume(tid))
}

/// Block the running thread until `tid` terminates
///
/// Fails for the main thread and for `tid == get_tid()`.
pub fn sync(tid: ThreadId) -> UResult<()> {
    report(global::sync(tid))
}

/// Id of the running thread ([`ThreadId::MAIN`] before `init`)
pub fn get_tid() -> ThreadId {
    global::current().unwrap_or(ThreadId::MAIN)
}

/// Quanta started since `init`, the main thread's first one included
///
/// Zero before `init`.
pub fn get_total_quantums() -> u64 {
    global::total_quantums().unwrap_or(0)
}

/// Quanta `tid` has started, the current one included
pub fn get_quantums(tid: ThreadId) -> UResult<u64> {
    report(global::quantums(tid))
}

/// Current state of a live thread
pub fn thread_state(tid: ThreadId) -> UResult<ThreadState> {
    report(global::thread_state(tid))
}

/// Ids of all live threads in ascending order
pub fn live_threads() -> Vec<ThreadId> {
    global::live_threads().unwrap_or_default()
}

/// Ids of BLOCKED threads in ascending order, whatever the cause
pub fn blocked_threads() -> Vec<ThreadId> {
    global::blocked_threads().unwrap_or_default()
}
