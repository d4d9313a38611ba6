//! Stderr output for uthread
//!
//! Two kinds of lines:
//!
//! - `kprintln!` writes a bare line and is never filtered. The library's
//!   reports to the user (`thread library error: ...`, `system error: ...`)
//!   go through it.
//! - `kerror!` and `kdebug!` are diagnostics, tagged with the level and the
//!   running uthread, and filtered by `UT_LOG_LEVEL` (`off`, `error` or
//!   `debug`, also `0`-`2`; default `error`).
//!
//! ```ignore
//! use uthread_core::{kdebug, kprintln};
//!
//! kprintln!("thread library error: {}", e);
//! kdebug!("spawned thread {}", id);   // uthread debug [0]: spawned thread 1
//! ```
//!
//! Callers mask preemption around every line: std's stderr lock is not
//! reentrant across green threads.

use crate::env::env_get_opt;
use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

/// Diagnostic verbosity
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Debug = 2,
}

impl LogLevel {
    const DEFAULT: LogLevel = LogLevel::Error;

    fn tag(self) -> &'static str {
        match self {
            LogLevel::Off => "",
            LogLevel::Error => "error",
            LogLevel::Debug => "debug",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s.to_ascii_lowercase().as_str() {
            "off" | "0" => Ok(LogLevel::Off),
            "error" | "1" => Ok(LogLevel::Error),
            "debug" | "2" => Ok(LogLevel::Debug),
            _ => Err(()),
        }
    }
}

/// Not read from the environment yet
const LEVEL_UNSET: u8 = u8::MAX;

/// No uthread running (before init, after shutdown)
const NO_THREAD: u32 = u32::MAX;

static LEVEL: AtomicU8 = AtomicU8::new(LEVEL_UNSET);
static CURRENT_THREAD: AtomicU32 = AtomicU32::new(NO_THREAD);

/// Read `UT_LOG_LEVEL` unless a level is already in force
///
/// `uthread::init` calls this before masking preemption so the first
/// diagnostic does not touch the environment.
pub fn init() {
    let level = env_get_opt::<LogLevel>("UT_LOG_LEVEL").unwrap_or(LogLevel::DEFAULT);
    let _ = LEVEL.compare_exchange(LEVEL_UNSET, level as u8, Ordering::Relaxed, Ordering::Relaxed);
}

/// Level in force
pub fn log_level() -> LogLevel {
    match LEVEL.load(Ordering::Relaxed) {
        LEVEL_UNSET => {
            init();
            log_level()
        }
        0 => LogLevel::Off,
        1 => LogLevel::Error,
        _ => LogLevel::Debug,
    }
}

/// Override `UT_LOG_LEVEL`
pub fn set_log_level(level: LogLevel) {
    LEVEL.store(level as u8, Ordering::Relaxed);
}

#[inline]
pub fn level_enabled(level: LogLevel) -> bool {
    level != LogLevel::Off && level <= log_level()
}

/// Record the running uthread for diagnostics
///
/// A single atomic store, safe from the preemption handler.
#[inline]
pub fn set_thread_id(id: u32) {
    CURRENT_THREAD.store(id, Ordering::Relaxed);
}

#[inline]
pub fn clear_thread_id() {
    CURRENT_THREAD.store(NO_THREAD, Ordering::Relaxed);
}

fn write_line(
    out: &mut impl Write,
    level: Option<LogLevel>,
    tid: u32,
    args: fmt::Arguments<'_>,
) -> std::io::Result<()> {
    match (level, tid) {
        (None, _) => {}
        (Some(level), NO_THREAD) => write!(out, "uthread {}: ", level.tag())?,
        (Some(level), tid) => write!(out, "uthread {} [{}]: ", level.tag(), tid)?,
    }
    writeln!(out, "{}", args)
}

#[doc(hidden)]
pub fn _emit(level: Option<LogLevel>, args: fmt::Arguments<'_>) {
    if let Some(level) = level {
        if !level_enabled(level) {
            return;
        }
    }
    let tid = CURRENT_THREAD.load(Ordering::Relaxed);
    let _ = write_line(&mut std::io::stderr().lock(), level, tid, args);
}

/// Unfiltered line on stderr
#[macro_export]
macro_rules! kprintln {
    ($($arg:tt)*) => {
        $crate::kprint::_emit(None, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! kerror {
    ($($arg:tt)*) => {
        $crate::kprint::_emit(Some($crate::kprint::LogLevel::Error), format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! kdebug {
    ($($arg:tt)*) => {
        $crate::kprint::_emit(Some($crate::kprint::LogLevel::Debug), format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!("debug".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert_eq!("ERROR".parse::<LogLevel>(), Ok(LogLevel::Error));
        assert_eq!("0".parse::<LogLevel>(), Ok(LogLevel::Off));
        assert_eq!("2".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert_eq!("info".parse::<LogLevel>(), Err(()));
    }

    #[test]
    fn test_default_level_is_quiet() {
        // Only errors get through unless UT_LOG_LEVEL asks for more
        assert_eq!(LogLevel::DEFAULT, LogLevel::Error);
        assert!(LogLevel::Debug > LogLevel::DEFAULT);
    }

    #[test]
    fn test_level_filter() {
        set_log_level(LogLevel::Error);
        assert!(level_enabled(LogLevel::Error));
        assert!(!level_enabled(LogLevel::Debug));

        set_log_level(LogLevel::Off);
        assert!(!level_enabled(LogLevel::Error));
        assert!(!level_enabled(LogLevel::Off));

        // Filtered lines write nothing
        kerror!("hidden {}", 1);
        kdebug!("hidden");
    }

    fn render(level: Option<LogLevel>, tid: u32, args: fmt::Arguments<'_>) -> String {
        let mut buf = Vec::new();
        write_line(&mut buf, level, tid, args).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_line_format() {
        // User-facing reports carry no tag, whatever thread is running
        assert_eq!(
            render(None, 4, format_args!("thread library error: {}", "no thread with id 9")),
            "thread library error: no thread with id 9\n"
        );
        assert_eq!(
            render(Some(LogLevel::Debug), 2, format_args!("spawned thread {}", 3)),
            "uthread debug [2]: spawned thread 3\n"
        );
        assert_eq!(
            render(Some(LogLevel::Error), NO_THREAD, format_args!("down")),
            "uthread error: down\n"
        );
    }

    #[test]
    fn test_thread_id_context() {
        set_thread_id(3);
        assert_eq!(CURRENT_THREAD.load(Ordering::Relaxed), 3);
        clear_thread_id();
        assert_eq!(CURRENT_THREAD.load(Ordering::Relaxed), NO_THREAD);
    }
}
