//! Terminating the main thread from another thread ends the process

mod common;

use common::spin_until;
use std::sync::atomic::{AtomicBool, Ordering};
use uthread::ThreadId;

static REACHED: AtomicBool = AtomicBool::new(false);

fn main() {
    uthread::init(1000).unwrap();

    uthread::spawn(|| {
        // Keep a sync waiter and a blocked thread around at shutdown
        let parked = uthread::spawn(|| loop {
            let _ = uthread::block(uthread::get_tid());
        })
        .unwrap();
        uthread::spawn(move || {
            let _ = uthread::sync(parked);
        })
        .unwrap();

        REACHED.store(true, Ordering::SeqCst);
        println!("shutdown_from_thread: ok");
        let _ = uthread::terminate(ThreadId::MAIN);
        unreachable!("process survived termination of main");
    })
    .unwrap();

    // Main keeps running until it is switched back in to tear down
    spin_until("shutdown", || false);
    unreachable!("reached: {}", REACHED.load(Ordering::SeqCst));
}
