//! `UT_*` environment lookups
//!
//! Values are trimmed. An unset, empty or unparsable variable yields the
//! caller's default.

use std::str::FromStr;

fn raw(key: &str) -> Option<String> {
    let val = std::env::var(key).ok()?;
    let val = val.trim();
    (!val.is_empty()).then(|| val.to_owned())
}

/// Parsed value of `key`, if it is set and parses
pub fn env_get_opt<T: FromStr>(key: &str) -> Option<T> {
    raw(key)?.parse().ok()
}

/// Parsed value of `key`, or `default`
///
/// ```ignore
/// let max_threads: usize = env_get("UT_MAX_THREADS", 100);
/// ```
pub fn env_get<T: FromStr>(key: &str, default: T) -> T {
    env_get_opt(key).unwrap_or(default)
}

/// Flag value of `key`: `1`/`true`/`yes`/`on` or `0`/`false`/`no`/`off`
pub fn env_get_bool(key: &str, default: bool) -> bool {
    match raw(key).map(|v| v.to_ascii_lowercase()).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test owns its variable names: tests run in parallel.

    #[test]
    fn test_unset_uses_default() {
        assert_eq!(env_get("UT_TEST_UNSET_THREADS", 100usize), 100);
        assert!(env_get_bool("UT_TEST_UNSET_DEBUG", true));
        assert_eq!(env_get_opt::<u64>("UT_TEST_UNSET_QUANTUM"), None);
    }

    #[test]
    fn test_bad_or_empty_value_falls_back() {
        std::env::set_var("UT_TEST_BAD_STACK", "64k");
        assert_eq!(env_get("UT_TEST_BAD_STACK", 65536usize), 65536);
        std::env::set_var("UT_TEST_BAD_STACK", "   ");
        assert_eq!(env_get_opt::<usize>("UT_TEST_BAD_STACK"), None);
        std::env::remove_var("UT_TEST_BAD_STACK");
    }

    #[test]
    fn test_value_is_trimmed() {
        std::env::set_var("UT_TEST_QUANTUM", " 2500\n");
        assert_eq!(env_get::<u64>("UT_TEST_QUANTUM", 10_000), 2500);
        std::env::remove_var("UT_TEST_QUANTUM");
    }

    #[test]
    fn test_flag_spellings() {
        for (val, expected) in [("1", true), ("Yes", true), ("ON", true), ("0", false), ("no", false), ("False", false)] {
            std::env::set_var("UT_TEST_FLAG", val);
            assert_eq!(env_get_bool("UT_TEST_FLAG", !expected), expected, "{:?}", val);
        }

        // Anything else keeps the default
        std::env::set_var("UT_TEST_FLAG", "maybe");
        assert!(env_get_bool("UT_TEST_FLAG", true));
        assert!(!env_get_bool("UT_TEST_FLAG", false));
        std::env::remove_var("UT_TEST_FLAG");
    }
}
