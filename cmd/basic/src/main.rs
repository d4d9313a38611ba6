//! Basic uthread example
//!
//! Spawns a few CPU-bound threads and lets the timer interleave them.
//!
//! # Environment Variables
//!
//! - `UT_LOG_LEVEL=debug` - Trace spawns and exits on stderr (off, error, debug)
//! - `UT_MAX_THREADS`, `UT_STACK_SIZE` - Override the scheduler limits

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uthread::{uprintln, ThreadId};

const WORKERS: usize = 4;
const ROUNDS: u64 = 5;

// UT_LOG_LEVEL=debug cargo run -p uthread-basic
fn main() {
    uprintln!("=== uthread Basic Example ===\n");

    // 5ms quantum
    if uthread::init(5_000).is_err() {
        std::process::exit(1);
    }

    let completed = Arc::new(AtomicUsize::new(0));

    for i in 1..=WORKERS {
        let c = completed.clone();
        let spawned = uthread::spawn(move || {
            let me = uthread::get_tid();
            let mut last = 0;

            // Report every time a new quantum starts for this thread
            while let Ok(q) = uthread::get_quantums(me) {
                if q != last {
                    last = q;
                    uprintln!("[worker {} / tid {}] quantum {}", i, me, q);
                }
                if q >= ROUNDS {
                    break;
                }
                std::hint::spin_loop();
            }

            c.fetch_add(1, Ordering::SeqCst);
        });

        match spawned {
            Ok(id) => uprintln!("Spawned worker {} (ID={})", i, id),
            Err(e) => uprintln!("spawn failed: {}", e),
        }
    }

    uprintln!("\nWaiting for {} workers to complete...\n", WORKERS);
    while completed.load(Ordering::SeqCst) < WORKERS {
        std::hint::spin_loop();
    }

    uprintln!(
        "{} worker(s) completed in {} quantums",
        completed.load(Ordering::SeqCst),
        uthread::get_total_quantums()
    );
    uprintln!("\n=== Example Complete ===");

    let _ = uthread::terminate(ThreadId::MAIN);
}
