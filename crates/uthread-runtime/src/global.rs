//! Process-wide runtime and its masked entry points
//!
//! The single [`Runtime`] (scheduler + timer) lives in one static cell. It
//! is only touched with SIGVTALRM masked: API entry points hold a
//! [`PreemptionGuard`], and the handler runs with the signal masked by the
//! kernel. Borrows of the runtime never span a context switch; only raw
//! context pointers cross it.

use crate::config::SchedulerConfig;
use crate::current_arch::{restore_context, switch_context, Context};
use crate::scheduler::{Scheduler, Switch, Termination};
use crate::signal::{self, PreemptionGuard};
use crate::tcb::EntryFn;
use crate::timer::IntervalTimer;

use uthread_core::kprint::{self, LogLevel};
use uthread_core::{kdebug, kerror, kprintln};
use uthread_core::{ThreadId, ThreadState, UResult, UThreadError};

use std::cell::UnsafeCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

/// Library state, created by `init` and destroyed at shutdown
pub struct Runtime {
    sched: Scheduler,
    timer: IntervalTimer,
}

struct RuntimeCell(UnsafeCell<Option<Runtime>>);

// Accessed from one OS thread, with SIGVTALRM masked
unsafe impl Sync for RuntimeCell {}

static RUNTIME: RuntimeCell = RuntimeCell(UnsafeCell::new(None));

/// Set by a non-main thread terminating main; main tears down on resume
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// # Safety
///
/// SIGVTALRM must be masked and the borrow must end before any switch.
#[inline]
unsafe fn runtime_slot() -> &'static mut Option<Runtime> {
    &mut *RUNTIME.0.get()
}

/// # Safety
///
/// Same as [`runtime_slot`].
#[inline]
unsafe fn runtime() -> UResult<&'static mut Runtime> {
    runtime_slot().as_mut().ok_or(UThreadError::NotInitialized)
}

/// Check whether `init` has completed
pub fn is_initialized() -> bool {
    let Ok(_guard) = PreemptionGuard::new() else {
        return false;
    };
    unsafe { runtime_slot().is_some() }
}

/// Report an unrecoverable error and abort the process
pub fn fatal(e: UThreadError) -> ! {
    kprintln!("system error: {}", e);
    std::process::abort()
}

/// Initialize the library: main thread RUNNING, timer armed
pub fn init_with_config(config: SchedulerConfig) -> UResult<()> {
    kprint::init();
    let _guard = PreemptionGuard::new()?;

    let slot = unsafe { runtime_slot() };
    if slot.is_some() {
        return Err(UThreadError::AlreadyInitialized);
    }
    config.validate()?;

    if config.debug_logging && !kprint::level_enabled(LogLevel::Debug) {
        kprint::set_log_level(LogLevel::Debug);
    }

    let timer = IntervalTimer::new(config.quantum);
    let sched = Scheduler::new(config)?;
    let rt = slot.insert(Runtime { sched, timer });

    SHUTDOWN_REQUESTED.store(false, Ordering::SeqCst);
    signal::install_preemption_handler(on_quantum_expired)?;
    rt.timer.arm()?;

    kprint::set_thread_id(ThreadId::MAIN.as_u32());
    kdebug!(
        "uthread initialized: quantum {}us, {} threads max",
        rt.timer.quantum_usecs(),
        rt.sched.config().max_threads
    );
    Ok(())
}

/// SIGVTALRM handler: the running thread's quantum is over
extern "C" fn on_quantum_expired(_sig: libc::c_int) {
    let switch = match unsafe { runtime() } {
        Ok(rt) => rt.sched.preempt(),
        Err(_) => return,
    };
    match switch {
        Ok(switch) => unsafe { perform(switch, false) },
        Err(e) => fatal(e),
    }
}

/// Carry out a scheduler decision
///
/// Returns once the outgoing thread has been dispatched again. A voluntary
/// switch restarts the quantum for the incoming thread.
///
/// # Safety
///
/// SIGVTALRM must be masked.
unsafe fn perform(switch: Switch, voluntary: bool) {
    let Switch::Swap { from, to } = switch else {
        return;
    };
    debug_assert!(signal::preemption_blocked());

    let (old, new) = {
        let rt = runtime().unwrap_or_else(|e| fatal(e));
        if voluntary {
            rt.timer.rearm().unwrap_or_else(|e| fatal(e));
        }
        rt.sched.context_pair(from, to).unwrap_or_else(|e| fatal(e))
    };

    switch_context(old, new);
    on_resume();
}

/// Resume `to` from a stack that is about to disappear
///
/// # Safety
///
/// SIGVTALRM must be masked.
unsafe fn abandon(to: ThreadId) -> ! {
    let new: *const Context = {
        let rt = runtime().unwrap_or_else(|e| fatal(e));
        rt.timer.rearm().unwrap_or_else(|e| fatal(e));
        rt.sched.context_ptr(to).unwrap_or_else(|e| fatal(e))
    };
    restore_context(new)
}

/// First thing a thread does after being switched to
fn on_resume() {
    if SHUTDOWN_REQUESTED.load(Ordering::SeqCst) {
        teardown_and_exit();
    }

    let rt = unsafe { runtime() }.unwrap_or_else(|e| fatal(e));
    rt.sched.reap().unwrap_or_else(|e| fatal(e));
    kprint::set_thread_id(rt.sched.running().as_u32());
}

/// Entry point of every spawned thread, running on its own stack
extern "C" fn thread_entry(arg: usize) -> ! {
    on_resume();

    let id = ThreadId::new(arg as u32);
    let entry = unsafe { runtime() }
        .map(|rt| rt.sched.take_entry(id))
        .unwrap_or_else(|e| fatal(e));

    // Started inside a masked switch, with no guard of its own to drop
    signal::unblock_preemption().unwrap_or_else(|e| fatal(e));

    if let Some(entry) = entry {
        if panic::catch_unwind(AssertUnwindSafe(entry)).is_err() {
            kerror!("thread {} panicked", id);
            std::process::abort();
        }
    }

    // Returning from the entry function terminates the thread
    match terminate(id) {
        Ok(()) => fatal(UThreadError::InvalidTarget("terminated thread resumed")),
        Err(e) => fatal(e),
    }
}

/// Release every library resource and exit with status 0
fn teardown_and_exit() -> ! {
    if let Some(mut rt) = unsafe { runtime_slot() }.take() {
        if let Err(e) = rt.timer.disarm() {
            kerror!("disarming the timer at shutdown: {}", e);
        }
        if let Err(e) = signal::restore_default_handler() {
            kerror!("restoring the SIGVTALRM handler at shutdown: {}", e);
        }
        kdebug!(
            "uthread shutting down after {} quantums",
            rt.sched.total_quantums()
        );
        drop(rt);
    }
    kprint::clear_thread_id();
    std::process::exit(0)
}

/// Create a thread at the ready-queue tail
pub fn spawn(entry: EntryFn) -> UResult<ThreadId> {
    let _guard = PreemptionGuard::new()?;
    let rt = unsafe { runtime() }?;
    let id = rt.sched.spawn(entry, thread_entry)?;
    kdebug!("spawned thread {}", id);
    Ok(id)
}

/// Destroy a thread; naming the main thread ends the process
///
/// Returns only when another thread was destroyed.
pub fn terminate(id: ThreadId) -> UResult<()> {
    let _guard = PreemptionGuard::new()?;
    let rt = unsafe { runtime() }?;

    match rt.sched.terminate(id)? {
        Termination::Removed => {
            kdebug!("terminated thread {}", id);
            Ok(())
        }
        Termination::Exit { to } => {
            kdebug!("thread {} exited", id);
            unsafe { abandon(to) }
        }
        Termination::Shutdown => {
            if rt.sched.running().is_main() {
                teardown_and_exit();
            }
            // Hand control to main, which tears down on its own stack
            SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
            let main = rt.sched.context_ptr(ThreadId::MAIN)?;
            unsafe { restore_context(main) }
        }
    }
}

/// Block a thread until resumed; blocking oneself returns after the resume
pub fn block(id: ThreadId) -> UResult<()> {
    let _guard = PreemptionGuard::new()?;
    let switch = unsafe { runtime() }?.sched.block(id)?;
    unsafe { perform(switch, true) };
    Ok(())
}

/// Move an explicitly blocked thread back to READY
pub fn resume(id: ThreadId) -> UResult<()> {
    let _guard = PreemptionGuard::new()?;
    unsafe { runtime() }?.sched.resume(id)
}

/// Block the running thread until `id` terminates
pub fn sync(id: ThreadId) -> UResult<()> {
    let _guard = PreemptionGuard::new()?;
    let switch = unsafe { runtime() }?.sched.sync(id)?;
    unsafe { perform(switch, true) };
    Ok(())
}

/// Id of the running thread
pub fn current() -> UResult<ThreadId> {
    let _guard = PreemptionGuard::new()?;
    Ok(unsafe { runtime() }?.sched.running())
}

/// Dispatches since init
pub fn total_quantums() -> UResult<u64> {
    let _guard = PreemptionGuard::new()?;
    Ok(unsafe { runtime() }?.sched.total_quantums())
}

/// Quanta started by a live thread
pub fn quantums(id: ThreadId) -> UResult<u64> {
    let _guard = PreemptionGuard::new()?;
    unsafe { runtime() }?.sched.quantums(id)
}

pub fn thread_state(id: ThreadId) -> UResult<ThreadState> {
    let _guard = PreemptionGuard::new()?;
    unsafe { runtime() }?.sched.thread_state(id)
}

/// Ids of all live threads in ascending order
pub fn live_threads() -> UResult<Vec<ThreadId>> {
    let _guard = PreemptionGuard::new()?;
    Ok(unsafe { runtime() }?.sched.live_ids().collect())
}

/// Ids of BLOCKED threads in ascending order
pub fn blocked_threads() -> UResult<Vec<ThreadId>> {
    let _guard = PreemptionGuard::new()?;
    Ok(unsafe { runtime() }?.sched.blocked_ids().collect())
}
