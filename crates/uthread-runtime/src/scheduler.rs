//! Scheduler state machine
//!
//! Owns the TCB store, the ready queue and the blocked set, and decides
//! every state transition. It never switches stacks itself: operations that
//! reschedule return a [`Switch`] (or [`Termination`]) describing what the
//! caller must do next, and the caller performs the switch with
//! SIGVTALRM masked.
//!
//! Nothing on the preemption path ([`Scheduler::preempt`],
//! [`Scheduler::reap`]) allocates or frees heap memory.

use crate::config::SchedulerConfig;
use crate::current_arch::Context;
use crate::ready_queue::{FifoQueue, ReadyQueue};
use crate::tcb::{EntryFn, TcbStore, Trampoline};

use uthread_core::{BlockCause, ThreadBitmap, ThreadId, ThreadState, UResult, UThreadError};

/// Context switch the caller must perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    /// Keep running the current thread
    Stay,

    /// Save `from` and resume `to`
    Swap { from: ThreadId, to: ThreadId },
}

/// Outcome of terminating a thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Another thread was destroyed; the caller keeps running
    Removed,

    /// The running thread destroyed itself; resume `to` without saving
    Exit { to: ThreadId },

    /// The main thread was named; the whole process must shut down
    Shutdown,
}

/// Main scheduler
pub struct Scheduler {
    /// Configuration
    config: SchedulerConfig,

    /// TCBs and stacks
    store: TcbStore,

    /// READY threads in dispatch order
    ready: FifoQueue,

    /// BLOCKED threads (either cause)
    blocked: ThreadBitmap,

    /// The RUNNING thread
    running: ThreadId,

    /// Dispatches since init, the main thread's first quantum included
    total_quantums: u64,

    /// Self-terminated thread whose stack still awaits reclamation
    zombie: Option<ThreadId>,
}

impl Scheduler {
    /// Create a scheduler with the main thread RUNNING in its first quantum
    pub fn new(config: SchedulerConfig) -> UResult<Self> {
        config.validate()?;

        let store = TcbStore::new(config.max_threads, config.stack_size)?;

        Ok(Self {
            ready: FifoQueue::with_capacity(config.max_threads),
            blocked: ThreadBitmap::new(config.max_threads),
            store,
            running: ThreadId::MAIN,
            total_quantums: 1,
            zombie: None,
            config,
        })
    }

    #[inline]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    #[inline]
    pub fn running(&self) -> ThreadId {
        self.running
    }

    #[inline]
    pub fn total_quantums(&self) -> u64 {
        self.total_quantums
    }

    /// Quanta a live thread has started
    pub fn quantums(&self, id: ThreadId) -> UResult<u64> {
        Ok(self.store.lookup(id)?.quantums)
    }

    pub fn thread_state(&self, id: ThreadId) -> UResult<ThreadState> {
        Ok(self.store.lookup(id)?.state)
    }

    /// Number of live threads, main included
    pub fn live_count(&self) -> usize {
        self.store.live_count()
    }

    /// Ids of live threads in ascending order
    pub fn live_ids(&self) -> impl Iterator<Item = ThreadId> + '_ {
        self.store.iter().map(|tcb| tcb.id)
    }

    /// READY ids, head first
    pub fn ready_ids(&self) -> impl Iterator<Item = ThreadId> + '_ {
        self.ready.iter()
    }

    /// BLOCKED ids (either cause) in ascending order
    pub fn blocked_ids(&self) -> impl Iterator<Item = ThreadId> + '_ {
        self.blocked.iter()
    }

    /// Number of threads in the RUNNING state
    pub fn running_count(&self) -> usize {
        self.store
            .iter()
            .filter(|tcb| tcb.state == ThreadState::Running)
            .count()
    }

    /// Create a READY thread at the ready-queue tail
    pub fn spawn(&mut self, entry: EntryFn, trampoline: Trampoline) -> UResult<ThreadId> {
        let id = self.store.allocate(entry, trampoline)?;
        self.ready.push_back(id);
        Ok(id)
    }

    /// Pop the ready-queue head and make it RUNNING
    fn dispatch(&mut self) -> UResult<ThreadId> {
        let next = self.ready.pop_front().ok_or(UThreadError::NoReadyThread)?;
        debug_assert!(!self.blocked.is_set(next), "thread {} both ready and blocked", next);
        let tcb = self.store.lookup_mut(next)?;

        tcb.state = ThreadState::Running;
        tcb.quantums += 1;
        self.running = next;
        self.total_quantums += 1;

        Ok(next)
    }

    /// Switch away from `from`, which has already left the RUNNING state
    fn reschedule(&mut self, from: ThreadId) -> UResult<Switch> {
        let to = self.dispatch()?;
        if to == from {
            Ok(Switch::Stay)
        } else {
            Ok(Switch::Swap { from, to })
        }
    }

    /// Quantum expiry: the running thread goes to the tail
    ///
    /// With nothing else READY the running thread is dispatched again and
    /// starts a new quantum.
    pub fn preempt(&mut self) -> UResult<Switch> {
        let current = self.running;
        self.store.lookup_mut(current)?.state = ThreadState::Ready;
        self.ready.push_back(current);
        self.reschedule(current)
    }

    /// Block a thread until it is resumed
    ///
    /// Blocking a thread that is already BLOCKED (for either cause) changes
    /// nothing. Blocking the running thread reschedules.
    pub fn block(&mut self, id: ThreadId) -> UResult<Switch> {
        if id.is_main() {
            return Err(UThreadError::InvalidTarget("the main thread cannot be blocked"));
        }

        let tcb = self.store.lookup_mut(id)?;
        match tcb.state {
            ThreadState::Blocked(_) => Ok(Switch::Stay),
            ThreadState::Ready => {
                tcb.state = ThreadState::Blocked(BlockCause::Explicit);
                self.ready.remove(id);
                self.blocked.set(id);
                Ok(Switch::Stay)
            }
            ThreadState::Running => {
                tcb.state = ThreadState::Blocked(BlockCause::Explicit);
                self.blocked.set(id);
                self.reschedule(id)
            }
        }
    }

    /// Move an explicitly blocked thread back to the ready-queue tail
    ///
    /// READY and RUNNING threads are left alone, and so is a thread blocked
    /// by sync: only the termination of its target releases it.
    pub fn resume(&mut self, id: ThreadId) -> UResult<()> {
        let tcb = self.store.lookup_mut(id)?;
        if tcb.state.is_resumable() {
            tcb.state = ThreadState::Ready;
            self.blocked.clear(id);
            self.ready.push_back(id);
        }
        Ok(())
    }

    /// Block the running thread until `target` terminates
    pub fn sync(&mut self, target: ThreadId) -> UResult<Switch> {
        let caller = self.running;

        self.store.lookup(target)?;
        if target == caller {
            return Err(UThreadError::InvalidTarget("a thread cannot sync on itself"));
        }
        if caller.is_main() {
            return Err(UThreadError::InvalidTarget("the main thread cannot sync"));
        }

        self.store.lookup_mut(target)?.waiters.push(caller);
        self.store.lookup_mut(caller)?.state = ThreadState::Blocked(BlockCause::Sync(target));
        self.blocked.set(caller);

        self.reschedule(caller)
    }

    /// Destroy a thread
    ///
    /// Every thread sync-waiting on it is moved to the ready-queue tail in
    /// registration order before the next dispatch. If the destroyed
    /// thread was itself sync-waiting, it is dropped from its target's
    /// waiters.
    pub fn terminate(&mut self, id: ThreadId) -> UResult<Termination> {
        self.store.lookup(id)?;
        if id.is_main() {
            return Ok(Termination::Shutdown);
        }

        // A running thread is still on its stack: reclaimed once the next
        // thread runs
        let running = id == self.running;
        let tcb = if running {
            self.store.remove(id)?
        } else {
            self.store.release(id)?
        };
        self.ready.remove(id);
        self.blocked.clear(id);

        if let Some(target) = tcb.state.sync_target() {
            if let Some(target) = self.store.get_mut(target) {
                target.waiters.retain(|&w| w != id);
            }
        }

        for &waiter in &tcb.waiters {
            self.wake_sync_waiter(waiter, id);
        }

        if !running {
            return Ok(Termination::Removed);
        }

        debug_assert!(self.zombie.is_none());
        self.zombie = Some(id);
        let to = self.dispatch()?;
        Ok(Termination::Exit { to })
    }

    fn wake_sync_waiter(&mut self, waiter: ThreadId, target: ThreadId) {
        let Some(tcb) = self.store.get_mut(waiter) else {
            return;
        };
        if tcb.state == ThreadState::Blocked(BlockCause::Sync(target)) {
            tcb.state = ThreadState::Ready;
            self.blocked.clear(waiter);
            self.ready.push_back(waiter);
        }
    }

    /// Reclaim the stack of a self-terminated thread
    ///
    /// Called by whichever thread resumes next, once execution has left the
    /// dead stack.
    pub fn reap(&mut self) -> UResult<()> {
        match self.zombie.take() {
            Some(id) => self.store.reclaim(id),
            None => Ok(()),
        }
    }

    /// Take the entry closure of a thread on its first dispatch
    pub fn take_entry(&mut self, id: ThreadId) -> Option<EntryFn> {
        self.store.take_entry(id)
    }

    /// Saved-context pointers for a [`Switch::Swap`]
    pub fn context_pair(
        &mut self,
        from: ThreadId,
        to: ThreadId,
    ) -> UResult<(*mut Context, *const Context)> {
        let old = self.context_ptr(from)?;
        let new = self.context_ptr(to)?;
        Ok((old, new as *const Context))
    }

    /// Saved-context pointer of a live thread
    pub fn context_ptr(&mut self, id: ThreadId) -> UResult<*mut Context> {
        self.store.context_ptr(id).ok_or(UThreadError::NoSuchThread(id))
    }
}
