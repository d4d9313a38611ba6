//! Build script for uthread-runtime
//!
//! Merges compile-time configuration:
//! 1. Start with library defaults
//! 2. If UT_CONFIG_RS names a file, read `pub const NAME: TYPE = VALUE;` lines from it
//! 3. User values replace defaults
//! 4. Write OUT_DIR/ut_merged_config.rs, included by `config::defaults`
//!
//! User only needs to specify values they want to change.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// Configuration parameter definition
struct ConfigParam {
    name: &'static str,
    rust_type: &'static str,
    default_value: &'static str,
}

/// All configuration parameters with their defaults
const CONFIG_PARAMS: &[ConfigParam] = &[
    ConfigParam {
        name: "QUANTUM_USECS",
        rust_type: "u64",
        default_value: "10_000", // 10ms
    },
    ConfigParam {
        name: "MAX_THREADS",
        rust_type: "usize",
        default_value: "100",
    },
    ConfigParam {
        name: "STACK_SIZE",
        rust_type: "usize",
        default_value: "64 * 1024", // 64KB
    },
    ConfigParam {
        name: "DEBUG_LOGGING",
        rust_type: "bool",
        default_value: "false",
    },
];

fn main() {
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR not set");
    let dest_path = Path::new(&out_dir).join("ut_merged_config.rs");

    // Start with defaults
    let mut config: HashMap<&str, String> = CONFIG_PARAMS
        .iter()
        .map(|p| (p.name, p.default_value.to_string()))
        .collect();

    // If user config specified, parse and merge
    if let Ok(user_path) = env::var("UT_CONFIG_RS") {
        println!("cargo:rerun-if-changed={}", user_path);
        
        match fs::read_to_string(&user_path) {
            Ok(content) => {
                parse_and_merge(&content, &mut config);
                println!("cargo:warning=Using custom config: {}", user_path);
            }
            Err(e) => {
                println!(
                    "cargo:warning=Failed to read UT_CONFIG_RS ({}): {}",
                    user_path, e
                );
            }
        }
    }
    
    println!("cargo:rerun-if-env-changed=UT_CONFIG_RS");

    // Generate merged config file
    let output = generate_config(&config);
    fs::write(&dest_path, &output).expect("Failed to write merged config");
}

/// Merge every recognised `pub const` line of the user's file into `config`
fn parse_and_merge(content: &str, config: &mut HashMap<&str, String>) {
    let consts = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with("//"))
        .filter_map(parse_const_line);

    for (name, value) in consts {
        match CONFIG_PARAMS.iter().find(|p| p.name == name) {
            Some(param) => {
                config.insert(param.name, value);
            }
            None => println!("cargo:warning=Unknown uthread config parameter: {}", name),
        }
    }
}

/// Split `pub const NAME: TYPE = VALUE;` into (NAME, VALUE)
fn parse_const_line(line: &str) -> Option<(String, String)> {
    let rest = line.strip_prefix("pub const ")?.trim();
    let (name, rest) = rest.split_once(':')?;
    let (_ty, value) = rest.split_once('=')?;
    let value = value.split(';').next()?.trim();

    Some((name.trim().to_string(), value.to_string()))
}

/// Generate the merged config Rust file
fn generate_config(config: &HashMap<&str, String>) -> String {
    let mut output = String::new();
    
    output.push_str("// Auto-generated by build.rs - do not edit\n");
    output.push_str("// Configuration merged from library defaults");
    
    if env::var("UT_CONFIG_RS").is_ok() {
        output.push_str(" and user's ut_config.rs");
    }
    output.push_str("\n\n");
    
    // Generate each constant
    for param in CONFIG_PARAMS {
        let value = config.get(param.name).map_or(param.default_value, String::as_str);
        output.push_str(&format!(
            "pub const {}: {} = {};\n",
            param.name, param.rust_type, value
        ));
    }
    
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_const_line() {
        let result = parse_const_line("pub const MAX_THREADS: usize = 8;");
        assert_eq!(result, Some(("MAX_THREADS".into(), "8".into())));

        let result = parse_const_line("pub const DEBUG_LOGGING: bool = true;");
        assert_eq!(result, Some(("DEBUG_LOGGING".into(), "true".into())));

        let result = parse_const_line("pub const STACK_SIZE: usize = 128 * 1024;");
        assert_eq!(result, Some(("STACK_SIZE".into(), "128 * 1024".into())));

        assert_eq!(parse_const_line("const PRIVATE: u8 = 1;"), None);
    }

    #[test]
    fn test_parse_and_merge() {
        let mut config: HashMap<&str, String> = HashMap::new();
        config.insert("MAX_THREADS", "100".into());
        config.insert("QUANTUM_USECS", "10_000".into());

        let user_config = r#"
            // Custom config
            pub const MAX_THREADS: usize = 16;
            pub const QUANTUM_USECS: u64 = 500;
            pub const NOT_A_PARAM: u8 = 1;
        "#;

        parse_and_merge(user_config, &mut config);

        assert_eq!(config.get("MAX_THREADS"), Some(&"16".to_string()));
        assert_eq!(config.get("QUANTUM_USECS"), Some(&"500".to_string()));
        assert_eq!(config.get("NOT_A_PARAM"), None);
    }
}