//! Helpers shared by the scenario binaries

#![allow(dead_code)]

use std::time::{Duration, Instant};

/// Burn CPU until `cond` holds
///
/// The preemption timer counts process CPU time, so waiting must spin
/// rather than sleep.
pub fn spin_until(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        std::hint::spin_loop();
    }
}

/// Burn CPU until `n` more quanta have been dispatched
pub fn spin_quanta(n: u64) {
    let target = uthread::get_total_quantums() + n;
    spin_until("quanta to pass", || uthread::get_total_quantums() >= target);
}

/// Spin forever; the thread only leaves through preemption or termination
pub fn spin_forever() -> ! {
    loop {
        std::hint::spin_loop();
    }
}

/// Report success and end the process through the library
pub fn finish(name: &str) -> ! {
    println!("{}: ok", name);
    let _ = uthread::terminate(uthread::ThreadId::MAIN);
    unreachable!("terminating the main thread returned")
}
