//! C ABI
//!
//! Thin `extern "C"` wrappers over the Rust API. Ids are plain `int`s and
//! every failure is reported as `-1` after the error has been logged.

use crate::{ThreadId, UResult, UThreadError};
use libc::c_int;

/// Entry function of a thread spawned through the C ABI
pub type ThreadEntry = extern "C" fn();

fn to_int(result: UResult<()>) -> c_int {
    match result {
        Ok(()) => 0,
        Err(_) => -1,
    }
}

fn tid_from(raw: c_int) -> UResult<ThreadId> {
    ThreadId::from_raw(raw).ok_or(UThreadError::InvalidArgument("thread id must be non-negative"))
}

/// Run `op` on a validated id; a bad id is logged and yields -1
fn with_tid(raw: c_int, op: fn(ThreadId) -> UResult<()>) -> c_int {
    match tid_from(raw) {
        Ok(tid) => to_int(op(tid)),
        Err(e) => to_int(crate::report(Err(e))),
    }
}

#[no_mangle]
pub extern "C" fn uthread_init(quantum_usecs: c_int) -> c_int {
    to_int(crate::init(quantum_usecs))
}

#[no_mangle]
pub extern "C" fn uthread_spawn(entry: Option<ThreadEntry>) -> c_int {
    let Some(entry) = entry else {
        return to_int(crate::report(Err(UThreadError::InvalidArgument(
            "entry function is null",
        ))));
    };
    match crate::spawn(move || entry()) {
        Ok(tid) => tid.as_u32() as c_int,
        Err(_) => -1,
    }
}

#[no_mangle]
pub extern "C" fn uthread_terminate(tid: c_int) -> c_int {
    with_tid(tid, crate::terminate)
}

#[no_mangle]
pub extern "C" fn uthread_block(tid: c_int) -> c_int {
    with_tid(tid, crate::block)
}

#[no_mangle]
pub extern "C" fn uthread_resume(tid: c_int) -> c_int {
    with_tid(tid, crate::resume)
}

#[no_mangle]
pub extern "C" fn uthread_sync(tid: c_int) -> c_int {
    with_tid(tid, crate::sync)
}

#[no_mangle]
pub extern "C" fn uthread_get_tid() -> c_int {
    crate::get_tid().as_u32() as c_int
}

#[no_mangle]
pub extern "C" fn uthread_get_total_quantums() -> c_int {
    crate::get_total_quantums().min(c_int::MAX as u64) as c_int
}

#[no_mangle]
pub extern "C" fn uthread_get_quantums(tid: c_int) -> c_int {
    let quantums = match tid_from(tid) {
        Ok(tid) => crate::get_quantums(tid),
        Err(e) => crate::report(Err(e)),
    };
    match quantums {
        Ok(n) => n.min(c_int::MAX as u64) as c_int,
        Err(_) => -1,
    }
}
