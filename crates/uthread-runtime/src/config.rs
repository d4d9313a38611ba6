//! uthread configuration
//!
//! Provides compile-time defaults with runtime environment overrides.
//!
//! # Configuration Priority (highest wins)
//!
//! 1. Environment variables (runtime)
//! 2. User's ut_config.rs named by `UT_CONFIG_RS` (compile-time, merged by build.rs)
//! 3. Library defaults
//!
//! # Example
//!
//! ```rust,ignore
//! use uthread_runtime::config::SchedulerConfig;
//!
//! // Use defaults with env overrides
//! let config = SchedulerConfig::from_env();
//!
//! // Or customize programmatically
//! let config = SchedulerConfig::from_env()
//!     .max_threads(16)
//!     .quantum(Duration::from_micros(500));
//! ```

/// Defaults merged by build.rs
pub mod defaults {
    include!(concat!(env!("OUT_DIR"), "/ut_merged_config.rs"));
}

use std::time::Duration;
use uthread_core::constants::MIN_STACK_SIZE;
use uthread_core::env::{env_get, env_get_bool};
use uthread_core::UThreadError;

/// Upper bound on `max_threads`; ids must fit the C `int` surface.
pub const MAX_THREADS_LIMIT: usize = 1 << 20;

/// Scheduler configuration with builder pattern.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Length of one quantum of virtual (process CPU) time
    pub quantum: Duration,
    /// Maximum concurrent threads, main thread included
    pub max_threads: usize,
    /// Stack size per spawned thread (rounded up to whole pages)
    pub stack_size: usize,
    /// Enable debug logging of scheduler operations
    pub debug_logging: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl SchedulerConfig {
    /// Create config from compile-time defaults with environment overrides.
    ///
    /// Environment variables (all optional):
    /// - `UT_QUANTUM_USECS` - Quantum length in microseconds
    /// - `UT_MAX_THREADS` - Max concurrent threads (main included)
    /// - `UT_STACK_SIZE` - Stack size per thread in bytes
    /// - `UT_DEBUG` - Enable debug logging (0/1)
    pub fn from_env() -> Self {
        Self {
            quantum: Duration::from_micros(env_get("UT_QUANTUM_USECS", defaults::QUANTUM_USECS)),
            max_threads: env_get("UT_MAX_THREADS", defaults::MAX_THREADS),
            stack_size: env_get("UT_STACK_SIZE", defaults::STACK_SIZE),
            debug_logging: env_get_bool("UT_DEBUG", defaults::DEBUG_LOGGING),
        }
    }

    /// Create config with explicit defaults (no env override).
    /// Useful for testing or when you want full control.
    pub fn new() -> Self {
        Self {
            quantum: Duration::from_micros(defaults::QUANTUM_USECS),
            max_threads: defaults::MAX_THREADS,
            stack_size: defaults::STACK_SIZE,
            debug_logging: defaults::DEBUG_LOGGING,
        }
    }

    // Builder methods

    pub fn quantum(mut self, d: Duration) -> Self {
        self.quantum = d;
        self
    }

    pub fn quantum_usecs(mut self, usecs: u64) -> Self {
        self.quantum = Duration::from_micros(usecs);
        self
    }

    pub fn max_threads(mut self, n: usize) -> Self {
        self.max_threads = n;
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = size;
        self
    }

    pub fn debug_logging(mut self, enable: bool) -> Self {
        self.debug_logging = enable;
        self
    }

    /// Validate configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // setitimer works in whole microseconds; a zero interval disarms it
        if self.quantum.as_micros() == 0 {
            return Err(ConfigError::InvalidValue("quantum must be at least 1us"));
        }
        if self.max_threads == 0 {
            return Err(ConfigError::InvalidValue("max_threads must count the main thread"));
        }
        if self.max_threads > MAX_THREADS_LIMIT {
            return Err(ConfigError::InvalidValue("max_threads exceeds 2^20"));
        }
        if self.stack_size < MIN_STACK_SIZE {
            return Err(ConfigError::InvalidValue("stack_size must be >= 16KB"));
        }
        Ok(())
    }

}

/// Configuration error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for UThreadError {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::InvalidValue(msg) => UThreadError::InvalidArgument(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = SchedulerConfig::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_threads, defaults::MAX_THREADS);
    }

    #[test]
    fn test_builder() {
        let config = SchedulerConfig::new()
            .max_threads(8)
            .quantum_usecs(500)
            .stack_size(128 * 1024)
            .debug_logging(true);

        assert_eq!(config.max_threads, 8);
        assert_eq!(config.quantum, Duration::from_micros(500));
        assert_eq!(config.stack_size, 128 * 1024);
        assert!(config.debug_logging);
    }

    #[test]
    fn test_validation() {
        assert!(SchedulerConfig::new().quantum_usecs(0).validate().is_err());
        assert!(SchedulerConfig::new().quantum(Duration::from_nanos(500)).validate().is_err());
        assert!(SchedulerConfig::new().quantum(Duration::from_nanos(999)).validate().is_err());
        assert!(SchedulerConfig::new().quantum(Duration::from_micros(1)).validate().is_ok());
        assert!(SchedulerConfig::new().max_threads(0).validate().is_err());
        assert!(SchedulerConfig::new().max_threads(MAX_THREADS_LIMIT + 1).validate().is_err());
        assert!(SchedulerConfig::new().stack_size(1024).validate().is_err());
        assert!(SchedulerConfig::new().max_threads(1).validate().is_ok());
    }

    #[test]
    fn test_config_error_maps_to_invalid_argument() {
        let err: UThreadError = SchedulerConfig::new()
            .quantum_usecs(0)
            .validate()
            .unwrap_err()
            .into();
        assert_eq!(err, UThreadError::InvalidArgument("quantum must be at least 1us"));
    }

    #[test]
    fn test_env_override() {
        std::env::set_var("UT_MAX_THREADS", "7");
        let config = SchedulerConfig::from_env();
        std::env::remove_var("UT_MAX_THREADS");
        assert_eq!(config.max_threads, 7);
    }
}
