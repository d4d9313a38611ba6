//! The C ABI returns -1 sentinels and plain int ids

mod common;

use common::spin_until;
use std::sync::atomic::{AtomicI32, Ordering};
use uthread::capi::*;

static C_TID: AtomicI32 = AtomicI32::new(-1);

extern "C" fn c_entry() {
    C_TID.store(uthread_get_tid(), Ordering::SeqCst);
}

fn main() {
    assert_eq!(uthread_spawn(Some(c_entry)), -1);
    assert_eq!(uthread_init(-1), -1);
    // Long quantum: the checks below run inside main's first one
    assert_eq!(uthread_init(100_000), 0);
    assert_eq!(uthread_init(1000), -1);
    assert_eq!(uthread_get_total_quantums(), 1);
    assert_eq!(uthread_get_tid(), 0);

    assert_eq!(uthread_spawn(None), -1);
    let tid = uthread_spawn(Some(c_entry));
    assert_eq!(tid, 1);

    assert_eq!(uthread_block(0), -1);
    assert_eq!(uthread_sync(0), -1);
    assert_eq!(uthread_block(-3), -1);
    assert_eq!(uthread_resume(42), -1);
    assert_eq!(uthread_get_quantums(-1), -1);
    assert_eq!(uthread_resume(tid), 0);
    assert!(uthread_get_quantums(0) >= 1);

    spin_until("c thread to run", || C_TID.load(Ordering::SeqCst) == tid);
    spin_until("c thread to exit", || uthread_get_quantums(tid) == -1);
    assert_eq!(uthread_terminate(tid), -1);

    println!("capi_surface: ok");
    uthread_terminate(0);
    unreachable!("uthread_terminate(0) returned");
}
