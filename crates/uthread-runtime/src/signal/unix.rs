//! Unix signal handling for SIGVTALRM preemption

use nix::errno::Errno;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, SigmaskHow, Signal};
use uthread_core::error::{UResult, UThreadError};

/// Signal delivered by the virtual interval timer
pub const PREEMPT_SIGNAL: Signal = Signal::SIGVTALRM;

/// Map a failed OS call into a platform error
pub fn platform(op: &'static str) -> impl Fn(Errno) -> UThreadError {
    move |errno| UThreadError::Platform { op, errno: errno as i32 }
}

fn preempt_set() -> SigSet {
    let mut set = SigSet::empty();
    set.add(PREEMPT_SIGNAL);
    set
}

/// Install the SIGVTALRM handler for quantum expiry
///
/// The handler runs with SIGVTALRM masked (no SA_NODEFER).
pub fn install_preemption_handler(handler: extern "C" fn(libc::c_int)) -> UResult<()> {
    let action = SigAction::new(
        SigHandler::Handler(handler),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    unsafe { sigaction(PREEMPT_SIGNAL, &action) }
        .map(drop)
        .map_err(platform("sigaction"))
}

/// Restore the default SIGVTALRM disposition
pub fn restore_default_handler() -> UResult<()> {
    let action = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    unsafe { sigaction(PREEMPT_SIGNAL, &action) }
        .map(drop)
        .map_err(platform("sigaction"))
}

/// Unmask SIGVTALRM on the current thread
///
/// A freshly started thread calls this once: it begins life inside a
/// masked switch and has no guard of its own to drop.
pub fn unblock_preemption() -> UResult<()> {
    preempt_set()
        .thread_unblock()
        .map_err(platform("pthread_sigmask"))
}

/// Check whether SIGVTALRM is currently masked
pub fn preemption_blocked() -> bool {
    SigSet::thread_get_mask()
        .map(|mask| mask.contains(PREEMPT_SIGNAL))
        .unwrap_or(false)
}

/// Check whether a SIGVTALRM is pending delivery
pub fn preemption_pending() -> bool {
    unsafe {
        let mut pending: libc::sigset_t = std::mem::zeroed();
        libc::sigemptyset(&mut pending);
        libc::sigpending(&mut pending) == 0 && libc::sigismember(&pending, libc::SIGVTALRM) == 1
    }
}

/// Consume a pending SIGVTALRM, if any
///
/// Must be called with the signal masked, otherwise it would have been
/// delivered already.
pub fn discard_pending() -> UResult<()> {
    if preemption_pending() {
        preempt_set().wait().map_err(platform("sigwait"))?;
    }
    Ok(())
}

/// RAII guard masking SIGVTALRM for a critical section
///
/// Restores the mask that was in force when the guard was created. When a
/// thread suspends while holding a guard, the guard lives on that thread's
/// stack and restores its mask once the thread resumes and leaves the
/// section.
pub struct PreemptionGuard {
    saved: SigSet,
}

impl PreemptionGuard {
    pub fn new() -> UResult<Self> {
        let saved = preempt_set()
            .thread_swap_mask(SigmaskHow::SIG_BLOCK)
            .map_err(platform("pthread_sigmask"))?;
        Ok(Self { saved })
    }
}

impl Drop for PreemptionGuard {
    fn drop(&mut self) {
        let _ = self.saved.thread_set_mask();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_masks_and_restores() {
        assert!(!preemption_blocked());
        {
            let _guard = PreemptionGuard::new().unwrap();
            assert!(preemption_blocked());
            {
                let _inner = PreemptionGuard::new().unwrap();
                assert!(preemption_blocked());
            }
            // Inner guard restores the outer (masked) state
            assert!(preemption_blocked());
        }
        assert!(!preemption_blocked());
    }

    #[test]
    fn test_discard_pending() {
        let _guard = PreemptionGuard::new().unwrap();
        nix::sys::signal::raise(PREEMPT_SIGNAL).unwrap();
        assert!(preemption_pending());

        discard_pending().unwrap();
        assert!(!preemption_pending());

        // Nothing pending is fine too
        discard_pending().unwrap();
    }

    #[test]
    fn test_platform_error_mapping() {
        let err = platform("setitimer")(Errno::EINVAL);
        assert_eq!(
            err,
            UThreadError::Platform { op: "setitimer", errno: libc::EINVAL }
        );
        assert!(err.is_fatal());
    }
}
