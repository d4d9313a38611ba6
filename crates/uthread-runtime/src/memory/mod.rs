//! Stack region management for uthread slots
//!
//! All thread stacks live in one reserved virtual memory region, one slot
//! per thread id. A slot is laid out as `[guard | stack]`: the stack grows
//! down from the slot's end toward a `PROT_NONE` guard, so an overflow
//! faults instead of corrupting the neighbouring slot.
//!
//! Slot 0 belongs to the main thread, which runs on the process stack, and
//! is never activated.
//!
//! Platform-specific code (reserve, protect, advise, unmap) lives in the
//! submodules.

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        mod unix;
        pub use unix::*;
    } else {
        compile_error!("uthread stacks require a unix platform");
    }
}

use uthread_core::ThreadId;

/// Reserved region holding every thread stack
pub struct StackRegion {
    /// Base address of the region
    base: *mut u8,

    /// Bytes per slot (guard + stack)
    slot_size: usize,

    /// Bytes of guard at the low end of each slot
    guard_size: usize,

    /// Number of slots (one per possible thread id)
    max_slots: usize,
}

impl StackRegion {
    /// Usable stack bytes per slot
    #[inline]
    pub fn stack_size(&self) -> usize {
        self.slot_size - self.guard_size
    }

    /// Check if a slot index lies inside the region
    #[inline]
    pub fn contains(&self, id: ThreadId) -> bool {
        id.as_usize() < self.max_slots
    }

    /// Calculate the base address of a slot
    #[inline]
    pub fn slot_base(&self, id: ThreadId) -> *mut u8 {
        debug_assert!(self.contains(id));
        unsafe { self.base.add(id.as_usize() * self.slot_size) }
    }

    /// Lowest usable stack address of a slot (just above the guard)
    #[inline]
    pub fn stack_bottom(&self, id: ThreadId) -> *mut u8 {
        unsafe { self.slot_base(id).add(self.guard_size) }
    }

    /// Initial stack pointer of a slot (stack grows down)
    #[inline]
    pub fn stack_top(&self, id: ThreadId) -> *mut u8 {
        unsafe { self.slot_base(id).add(self.slot_size) }
    }
}

/// Round `n` up to a multiple of `align` (a power of two)
#[inline]
pub(crate) const fn round_up(n: usize, align: usize) -> usize {
    (n + align - 1) & !(align - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_up() {
        assert_eq!(round_up(1, 4096), 4096);
        assert_eq!(round_up(4096, 4096), 4096);
        assert_eq!(round_up(64 * 1024 + 1, 4096), 68 * 1024);
    }

    #[test]
    fn test_slot_layout() {
        let region = StackRegion::reserve(4, 64 * 1024).unwrap();
        let page = page_size();

        assert!(region.contains(ThreadId::new(3)));
        assert_eq!(region.stack_size(), 64 * 1024);

        let one = ThreadId::new(1);
        let two = ThreadId::new(2);
        assert_eq!(region.stack_bottom(one) as usize, region.slot_base(one) as usize + page);
        assert_eq!(region.stack_top(one), region.slot_base(two));
        assert_eq!(region.stack_top(one) as usize % 16, 0);
        assert!(!region.contains(ThreadId::new(4)));
    }

    #[test]
    fn test_activate_write_deactivate() {
        let region = StackRegion::reserve(3, 32 * 1024).unwrap();
        let id = ThreadId::new(2);

        region.activate(id).unwrap();
        unsafe {
            let top = region.stack_top(id);
            let bottom = region.stack_bottom(id);
            top.sub(1).write(0xAB);
            bottom.write(0xCD);
            assert_eq!(top.sub(1).read(), 0xAB);
            assert_eq!(bottom.read(), 0xCD);
        }
        region.deactivate(id).unwrap();

        // Reactivated pages come back zeroed
        region.activate(id).unwrap();
        unsafe {
            assert_eq!(region.stack_top(id).sub(1).read(), 0);
        }
        region.deactivate(id).unwrap();
    }

    #[test]
    fn test_invalid_slot() {
        let region = StackRegion::reserve(2, 16 * 1024).unwrap();
        let err = region.activate(ThreadId::new(2)).unwrap_err();
        assert_eq!(
            err,
            uthread_core::UThreadError::MemoryError(uthread_core::MemoryError::InvalidSlot)
        );
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut region = StackRegion::reserve(2, 16 * 1024).unwrap();
        region.release().unwrap();
        region.release().unwrap();

        // Nothing left to activate
        assert_eq!(
            region.activate(ThreadId::new(1)).unwrap_err(),
            uthread_core::UThreadError::MemoryError(uthread_core::MemoryError::AllocationFailed)
        );
    }
}
