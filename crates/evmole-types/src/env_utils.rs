//! Environment variable parsing utilities.
//!
//! Type-safe helpers for reading configuration from the environment with
//! default values, replacing patterns like:
//!
//! ```ignore
//! std::env::var("VAR_NAME")
//!     .ok()
//!     .and_then(|v| v.parse::<usize>().ok())
//!     .unwrap_or(default_value)
//! ```
//!
//! # Example
//!
//! ```
//! use evmole_types::env_utils::{env_bool_or, env_var_or};
//!
//! let pool_size: usize = env_var_or("EVMOLE_POOL_SIZE", 4);
//! let optimize = env_bool_or("EVMOLE_OPTIMIZE", true);
//! ```

use std::path::PathBuf;
use std::str::FromStr;

/// Parse an environment variable into a type that implements `FromStr`.
///
/// Returns `None` if the variable is not set or cannot be parsed.
pub fn env_var<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Parse an environment variable with a default value.
///
/// Returns the default if the variable is not set or cannot be parsed.
pub fn env_var_or<T: FromStr>(key: &str, default: T) -> T {
    env_var(key).unwrap_or(default)
}

/// Check if an environment variable is set to a truthy value, with a default.
///
/// "1", "true", "yes" and "on" (case-insensitive) are truthy; any other set
/// value is falsy. An unset variable yields `default`.
pub fn env_bool_or(key: &str, default: bool) -> bool {
    match std::env::var(key).ok() {
        Some(v) => is_truthy(&v),
        None => default,
    }
}

/// Read an environment variable as a filesystem path.
///
/// Empty values are treated as unset.
pub fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
