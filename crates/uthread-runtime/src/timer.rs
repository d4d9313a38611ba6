//! Virtual interval timer driving preemption
//!
//! ITIMER_VIRTUAL counts down only while the process executes in user
//! mode and raises SIGVTALRM on expiry. The timer is armed as a repeating
//! interval, one quantum long.

use crate::signal::{self, platform};
use nix::errno::Errno;
use std::time::Duration;
use uthread_core::error::UResult;

/// Repeating SIGVTALRM source
#[derive(Debug)]
pub struct IntervalTimer {
    quantum: libc::timeval,
    armed: bool,
}

fn to_timeval(d: Duration) -> libc::timeval {
    libc::timeval {
        tv_sec: d.as_secs() as libc::time_t,
        tv_usec: d.subsec_micros() as libc::suseconds_t,
    }
}

fn set_virtual_timer(interval: libc::timeval) -> UResult<()> {
    let value = libc::itimerval {
        it_interval: interval,
        it_value: interval,
    };
    let ret = unsafe {
        libc::setitimer(libc::ITIMER_VIRTUAL as _, &value, std::ptr::null_mut())
    };
    Errno::result(ret).map(drop).map_err(platform("setitimer"))
}

impl IntervalTimer {
    /// Create a disarmed timer for the given quantum
    pub fn new(quantum: Duration) -> Self {
        Self {
            quantum: to_timeval(quantum),
            armed: false,
        }
    }

    /// Quantum length in microseconds
    pub fn quantum_usecs(&self) -> u64 {
        self.quantum.tv_sec as u64 * 1_000_000 + self.quantum.tv_usec as u64
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Start the repeating countdown
    pub fn arm(&mut self) -> UResult<()> {
        set_virtual_timer(self.quantum)?;
        self.armed = true;
        Ok(())
    }

    /// Restart the countdown from a full quantum
    ///
    /// Also consumes an expiry that fired while SIGVTALRM was masked, so
    /// the thread about to run is not preempted immediately. Call with the
    /// signal masked.
    pub fn rearm(&mut self) -> UResult<()> {
        if !self.armed {
            return Ok(());
        }
        set_virtual_timer(self.quantum)?;
        signal::discard_pending()
    }

    /// Stop the timer
    pub fn disarm(&mut self) -> UResult<()> {
        if !self.armed {
            return Ok(());
        }
        set_virtual_timer(to_timeval(Duration::ZERO))?;
        self.armed = false;
        Ok(())
    }
}
