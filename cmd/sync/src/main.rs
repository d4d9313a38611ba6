//! Block / resume / sync example
//!
//! A producer fills a shared slot and parks itself until the main thread
//! has drained it. A collector waits (sync) for the producer to finish.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use uthread::{uprintln, ThreadId};

const ITEMS: u64 = 4;

struct Slot {
    value: AtomicU64,
    full: AtomicBool,
}

fn main() {
    uprintln!("=== uthread Sync Example ===\n");

    if uthread::init(2_000).is_err() {
        std::process::exit(1);
    }

    let slot = Arc::new(Slot {
        value: AtomicU64::new(0),
        full: AtomicBool::new(false),
    });

    let producer_slot = slot.clone();
    let producer = uthread::spawn(move || {
        for item in 1..=ITEMS {
            producer_slot.value.store(item * 10, Ordering::SeqCst);
            producer_slot.full.store(true, Ordering::SeqCst);
            uprintln!("[producer] put {}, blocking", item * 10);

            // Parked until main resumes us
            let _ = uthread::block(uthread::get_tid());
        }
        uprintln!("[producer] done");
    })
    .unwrap_or(ThreadId::MAIN);

    let collector = uthread::spawn(move || {
        uprintln!("[collector] waiting for producer {}", producer);
        let _ = uthread::sync(producer);
        uprintln!("[collector] producer finished after {} quantums", uthread::get_total_quantums());
    })
    .unwrap_or(ThreadId::MAIN);

    let mut drained = 0;
    while drained < ITEMS {
        if slot.full.swap(false, Ordering::SeqCst) {
            uprintln!("[main] took {}", slot.value.load(Ordering::SeqCst));
            drained += 1;

            // Wait until the producer is parked, then wake it
            while !matches!(uthread::thread_state(producer), Ok(s) if s.is_blocked()) {
                std::hint::spin_loop();
            }
            let _ = uthread::resume(producer);
        }
        std::hint::spin_loop();
    }

    // The collector finishes once the producer's entry function returns
    while uthread::live_threads().contains(&collector) {
        std::hint::spin_loop();
    }

    uprintln!("\n=== Example Complete ===");
    let _ = uthread::terminate(ThreadId::MAIN);
}
