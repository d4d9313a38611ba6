//! Signal handling for preemption
//!
//! Uses SIGVTALRM on Unix systems. The signal is masked around every
//! scheduler critical section and delivered to the quantum handler
//! otherwise.

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        mod unix;
        pub use unix::*;
    } else {
        compile_error!("uthread preemption requires a unix platform");
    }
}
