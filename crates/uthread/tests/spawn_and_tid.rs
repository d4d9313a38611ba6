//! init, spawn, get_tid and entry-function return

mod common;

use common::{finish, spin_until};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use uthread::{ThreadId, ThreadState, UThreadError};

static SEEN_TID: AtomicU32 = AtomicU32::new(u32::MAX);
static RETURNED: AtomicBool = AtomicBool::new(false);

fn main() {
    assert!(!uthread::is_initialized());
    assert_eq!(uthread::get_total_quantums(), 0);

    // Long quantum: the checks below run well inside main's first one
    uthread::init(100_000).unwrap();
    assert!(uthread::is_initialized());
    assert_eq!(uthread::get_tid(), ThreadId::MAIN);
    assert_eq!(uthread::get_total_quantums(), 1);
    assert_eq!(uthread::get_quantums(ThreadId::MAIN).unwrap(), 1);
    assert_eq!(uthread::thread_state(ThreadId::MAIN).unwrap(), ThreadState::Running);

    // A second init changes nothing
    assert_eq!(uthread::init(500), Err(UThreadError::AlreadyInitialized));
    assert_eq!(uthread::get_total_quantums(), 1);

    let tid = uthread::spawn(|| {
        SEEN_TID.store(uthread::get_tid().as_u32(), Ordering::SeqCst);
        RETURNED.store(true, Ordering::SeqCst);
    })
    .unwrap();
    assert_eq!(tid, ThreadId::new(1));
    assert_eq!(uthread::thread_state(tid).unwrap(), ThreadState::Ready);
    assert_eq!(uthread::get_quantums(tid).unwrap(), 0);
    assert_eq!(uthread::live_threads(), vec![ThreadId::MAIN, tid]);

    // Returning from the entry function terminates the thread
    spin_until("thread 1 to finish", || uthread::get_quantums(tid).is_err());
    assert!(RETURNED.load(Ordering::SeqCst));
    assert_eq!(SEEN_TID.load(Ordering::SeqCst), 1);
    assert_eq!(uthread::live_threads(), vec![ThreadId::MAIN]);
    assert!(uthread::get_total_quantums() >= 3);
    assert!(uthread::get_quantums(ThreadId::MAIN).unwrap() >= 2);

    // The freed id is handed out again
    let again = uthread::spawn(|| {}).unwrap();
    assert_eq!(again, tid);

    finish("spawn_and_tid");
}
