//! Unix memory implementation using mmap

use super::{round_up, StackRegion};
use uthread_core::constants::GUARD_SIZE;
use uthread_core::error::{MemoryError, UResult};
use uthread_core::ThreadId;

/// System page size (falls back to the guard size if sysconf fails)
pub fn page_size() -> usize {
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as usize
    } else {
        GUARD_SIZE
    }
}

impl StackRegion {
    /// Reserve virtual address space for `max_slots` thread stacks
    ///
    /// Memory is reserved with PROT_NONE (no access) and MAP_NORESERVE, so
    /// nothing is committed until a slot is activated.
    pub fn reserve(max_slots: usize, stack_size: usize) -> UResult<Self> {
        let page = page_size();
        let guard_size = round_up(GUARD_SIZE, page);
        let slot_size = round_up(stack_size, page)
            .checked_add(guard_size)
            .ok_or(MemoryError::TooManySlots)?;
        let total_size = max_slots
            .checked_mul(slot_size)
            .ok_or(MemoryError::TooManySlots)?;

        let base = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                total_size,
                libc::PROT_NONE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | libc::MAP_NORESERVE,
                -1,
                0,
            )
        };

        if base == libc::MAP_FAILED {
            return Err(MemoryError::AllocationFailed.into());
        }

        Ok(Self {
            base: base as *mut u8,
            slot_size,
            guard_size,
            max_slots,
        })
    }

    fn check_slot(&self, id: ThreadId) -> UResult<()> {
        if self.base.is_null() {
            return Err(MemoryError::AllocationFailed.into());
        }
        if !self.contains(id) {
            return Err(MemoryError::InvalidSlot.into());
        }
        Ok(())
    }

    /// Activate a slot (make its stack readable/writable)
    ///
    /// The guard at the low end stays PROT_NONE from the initial mapping.
    pub fn activate(&self, id: ThreadId) -> UResult<()> {
        self.check_slot(id)?;

        let ret = unsafe {
            libc::mprotect(
                self.stack_bottom(id) as *mut libc::c_void,
                self.stack_size(),
                libc::PROT_READ | libc::PROT_WRITE,
            )
        };
        if ret != 0 {
            return Err(MemoryError::ProtectionFailed.into());
        }

        Ok(())
    }

    /// Deactivate a slot (drop its physical pages and revoke access)
    ///
    /// Only madvise and mprotect, both async-signal-safe.
    pub fn deactivate(&self, id: ThreadId) -> UResult<()> {
        self.check_slot(id)?;

        let stack = self.stack_bottom(id) as *mut libc::c_void;

        let ret = unsafe { libc::madvise(stack, self.stack_size(), libc::MADV_DONTNEED) };
        if ret != 0 {
            return Err(MemoryError::AdviseFailed.into());
        }

        let ret = unsafe { libc::mprotect(stack, self.stack_size(), libc::PROT_NONE) };
        if ret != 0 {
            return Err(MemoryError::ProtectionFailed.into());
        }

        Ok(())
    }

    /// Release the entire memory region
    pub fn release(&mut self) -> UResult<()> {
        if self.base.is_null() {
            return Ok(());
        }

        let ret = unsafe {
            libc::munmap(
                self.base as *mut libc::c_void,
                self.max_slots * self.slot_size,
            )
        };
        if ret != 0 {
            return Err(MemoryError::AllocationFailed.into());
        }

        self.base = std::ptr::null_mut();
        self.max_slots = 0;

        Ok(())
    }
}

impl Drop for StackRegion {
    fn drop(&mut self) {
        let _ = self.release();
    }
}
