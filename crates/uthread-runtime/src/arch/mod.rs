//! Architecture-specific context switching
//!
//! Each architecture module exposes the same narrow surface:
//! - `Context` - opaque saved register set
//! - `init_context` - prime a context to start at an entry function
//! - `switch_context` - save the current context and resume another
//! - `restore_context` - resume a context without saving (outgoing thread is gone)
//!
//! Everything above this module is architecture-agnostic.

cfg_if::cfg_if! {
    if #[cfg(target_arch = "x86_64")] {
        pub mod x86_64;
    } else if #[cfg(target_arch = "aarch64")] {
        pub mod aarch64;
    }
}
