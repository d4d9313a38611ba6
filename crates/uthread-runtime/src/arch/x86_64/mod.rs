//! x86_64 context switching implementation
//!
//! Only callee-saved registers are stored. A thread is always suspended
//! inside a call to `switch_context` (from an API call or from the
//! SIGVTALRM handler), so caller-saved registers are already preserved by
//! the compiler, and the kernel's signal frame on the suspended stack holds
//! the full interrupted state for the preemption path.

use std::arch::naked_asm;

/// Saved execution context (System V AMD64 callee-saved set)
///
/// Layout is fixed: the assembly below addresses fields by offset.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct Context {
    pub rsp: u64, // 0x00
    pub rip: u64, // 0x08
    pub rbx: u64, // 0x10
    pub rbp: u64, // 0x18
    pub r12: u64, // 0x20
    pub r13: u64, // 0x28
    pub r14: u64, // 0x30
    pub r15: u64, // 0x38
}

/// Initialize a new thread's context
///
/// Sets up the registers so that when switched to, execution begins in the
/// trampoline, which calls `entry_fn(entry_arg)`.
///
/// # Safety
///
/// `stack_top` must be the top of a writable stack.
#[inline]
pub unsafe fn init_context(
    ctx: &mut Context,
    stack_top: *mut u8,
    entry_fn: extern "C" fn(usize) -> !,
    entry_arg: usize,
) {
    // The trampoline is entered by `jmp`, so rsp must already be 16-byte
    // aligned for its `call` to leave the entry function ABI-aligned.
    let aligned_sp = (stack_top as usize) & !0xF;

    *ctx = Context {
        rsp: aligned_sp as u64,
        rip: entry_trampoline as *const () as usize as u64,
        rbx: 0,
        rbp: 0,
        r12: entry_fn as *const () as usize as u64,
        r13: entry_arg as u64,
        r14: 0,
        r15: 0,
    };
}

/// Trampoline that calls the entry function with its argument
#[unsafe(naked)]
unsafe extern "C" fn entry_trampoline() {
    naked_asm!(
        "mov rdi, r13",
        "call r12",
        // entry_fn never returns
        "ud2",
    );
}

/// Save the current context into `old` and resume `new`
///
/// Returns when some other thread later switches back to `old`.
///
/// # Safety
///
/// `old` must be writable and `new` must hold a context produced by
/// `init_context` or a previous `switch_context`.
#[unsafe(naked)]
pub unsafe extern "C" fn switch_context(_old: *mut Context, _new: *const Context) {
    naked_asm!(
        // Save callee-saved registers to old (RDI)
        "mov [rdi + 0x00], rsp",
        "lea rax, [rip + 1f]",
        "mov [rdi + 0x08], rax",
        "mov [rdi + 0x10], rbx",
        "mov [rdi + 0x18], rbp",
        "mov [rdi + 0x20], r12",
        "mov [rdi + 0x28], r13",
        "mov [rdi + 0x30], r14",
        "mov [rdi + 0x38], r15",
        // Load callee-saved registers from new (RSI)
        "mov rsp, [rsi + 0x00]",
        "mov rax, [rsi + 0x08]",
        "mov rbx, [rsi + 0x10]",
        "mov rbp, [rsi + 0x18]",
        "mov r12, [rsi + 0x20]",
        "mov r13, [rsi + 0x28]",
        "mov r14, [rsi + 0x30]",
        "mov r15, [rsi + 0x38]",
        "jmp rax",
        // Resume point for a saved context
        "1:",
        "ret",
    );
}

/// Resume `new` without saving anything
///
/// Used when the outgoing thread no longer exists (self-termination).
///
/// # Safety
///
/// Same requirements on `new` as `switch_context`.
#[unsafe(naked)]
pub unsafe extern "C" fn restore_context(_new: *const Context) -> ! {
    naked_asm!(
        "mov rsp, [rdi + 0x00]",
        "mov rax, [rdi + 0x08]",
        "mov rbx, [rdi + 0x10]",
        "mov rbp, [rdi + 0x18]",
        "mov r12, [rdi + 0x20]",
        "mov r13, [rdi + 0x28]",
        "mov r14, [rdi + 0x30]",
        "mov r15, [rdi + 0x38]",
        "jmp rax",
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn never(_arg: usize) -> ! {
        unreachable!()
    }

    #[test]
    fn test_context_layout() {
        assert_eq!(std::mem::size_of::<Context>(), 64);
    }

    #[test]
    fn test_init_context_aligns_stack() {
        let mut ctx = Context::default();
        let fake_top = 0x7000_0000_1238usize as *mut u8;
        unsafe { init_context(&mut ctx, fake_top, never, 5) };

        assert_eq!(ctx.rsp % 16, 0);
        assert!(ctx.rsp <= fake_top as u64);
        assert_eq!(ctx.rip, entry_trampoline as *const () as usize as u64);
        assert_eq!(ctx.r12, never as *const () as usize as u64);
        assert_eq!(ctx.r13, 5);
    }
}
