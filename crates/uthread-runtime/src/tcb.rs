//! Thread control blocks and their store
//!
//! The store owns every live TCB, the stack region and the id allocator.
//! A TCB's id is also its stack slot index.

use crate::current_arch::{init_context, Context};
use crate::memory::StackRegion;
use uthread_core::{IdAllocator, ThreadId, ThreadState, UResult, UThreadError};

/// Closure a thread starts executing
pub type EntryFn = Box<dyn FnOnce() + 'static>;

/// First function run on a fresh stack, given the thread id
pub type Trampoline = extern "C" fn(usize) -> !;

/// Thread control block
pub struct Tcb {
    pub id: ThreadId,
    pub state: ThreadState,

    /// Saved registers, valid while the thread is not RUNNING
    pub context: Context,

    /// Consumed on first dispatch
    entry: Option<EntryFn>,

    /// Quanta this thread has started, the current one included
    pub quantums: u64,

    /// Threads sync-blocked on this one, in registration order
    pub waiters: Vec<ThreadId>,
}

impl Tcb {
    fn main() -> Self {
        Self {
            id: ThreadId::MAIN,
            state: ThreadState::Running,
            context: Context::default(),
            entry: None,
            quantums: 1,
            waiters: Vec::new(),
        }
    }
}

impl std::fmt::Debug for Tcb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tcb")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("quantums", &self.quantums)
            .field("waiters", &self.waiters)
            .field("started", &self.entry.is_none())
            .finish()
    }
}

/// Owner of all TCBs and their stacks
pub struct TcbStore {
    /// Indexed by thread id
    slots: Box<[Option<Tcb>]>,
    ids: IdAllocator,
    stacks: StackRegion,
}

impl TcbStore {
    /// Create the store with the main thread RUNNING in slot 0
    pub fn new(max_threads: usize, stack_size: usize) -> UResult<Self> {
        let stacks = StackRegion::reserve(max_threads, stack_size)?;
        let mut slots: Box<[Option<Tcb>]> = (0..max_threads).map(|_| None).collect();
        slots[0] = Some(Tcb::main());

        Ok(Self {
            slots,
            ids: IdAllocator::new(max_threads),
            stacks,
        })
    }

    /// Create a READY thread on a fresh stack
    ///
    /// The saved context starts `trampoline(id)` on the 16-byte aligned
    /// top of the thread's stack.
    pub fn allocate(&mut self, entry: EntryFn, trampoline: Trampoline) -> UResult<ThreadId> {
        let id = self.ids.allocate()?;

        if let Err(e) = self.stacks.activate(id) {
            self.ids.release(id);
            return Err(e);
        }

        let mut context = Context::default();
        unsafe { init_context(&mut context, self.stacks.stack_top(id), trampoline, id.as_usize()) };

        self.slots[id.as_usize()] = Some(Tcb {
            id,
            state: ThreadState::Ready,
            context,
            entry: Some(entry),
            quantums: 0,
            waiters: Vec::new(),
        });

        Ok(id)
    }

    /// Remove a TCB, keeping its id and stack reserved
    ///
    /// Used for a thread terminating itself: it is still executing on that
    /// stack until the next thread resumes.
    pub fn remove(&mut self, id: ThreadId) -> UResult<Tcb> {
        if id.is_main() {
            return Err(UThreadError::InvalidTarget("the main thread is never removed"));
        }
        self.slots
            .get_mut(id.as_usize())
            .and_then(Option::take)
            .ok_or(UThreadError::NoSuchThread(id))
    }

    /// Release the stack and id of an already removed TCB
    pub fn reclaim(&mut self, id: ThreadId) -> UResult<()> {
        debug_assert!(self.get(id).is_none());
        if !self.ids.is_allocated(id) {
            return Ok(());
        }
        self.stacks.deactivate(id)?;
        self.ids.release(id);
        Ok(())
    }

    /// Remove a TCB and free its stack and id at once
    pub fn release(&mut self, id: ThreadId) -> UResult<Tcb> {
        let tcb = self.remove(id)?;
        self.reclaim(id)?;
        Ok(tcb)
    }

    #[inline]
    pub fn get(&self, id: ThreadId) -> Option<&Tcb> {
        self.slots.get(id.as_usize()).and_then(Option::as_ref)
    }

    #[inline]
    pub fn get_mut(&mut self, id: ThreadId) -> Option<&mut Tcb> {
        self.slots.get_mut(id.as_usize()).and_then(Option::as_mut)
    }

    pub fn lookup(&self, id: ThreadId) -> UResult<&Tcb> {
        self.get(id).ok_or(UThreadError::NoSuchThread(id))
    }

    pub fn lookup_mut(&mut self, id: ThreadId) -> UResult<&mut Tcb> {
        self.get_mut(id).ok_or(UThreadError::NoSuchThread(id))
    }

    /// Take the entry closure of a thread about to start
    pub fn take_entry(&mut self, id: ThreadId) -> Option<EntryFn> {
        self.get_mut(id).and_then(|tcb| tcb.entry.take())
    }

    /// Raw pointer to a thread's saved context
    ///
    /// The slot table never reallocates, so the pointer stays valid for as
    /// long as the TCB lives.
    pub fn context_ptr(&mut self, id: ThreadId) -> Option<*mut Context> {
        self.get_mut(id).map(|tcb| &mut tcb.context as *mut Context)
    }

    /// Live TCBs in id order
    pub fn iter(&self) -> impl Iterator<Item = &Tcb> + '_ {
        self.slots.iter().flatten()
    }

    /// Number of live TCBs, main included
    pub fn live_count(&self) -> usize {
        self.iter().count()
    }

}
