//! Shared utilities for the cache library.

use std::time::{SystemTime, UNIX_EPOCH};

/// Build a store-level key from a prefix and a cache key.
///
/// Format: `{prefix}::{key}`
pub fn build_store_key(prefix: &str, key: &str) -> String {
    format!("{}::{}", prefix, key)
}

/// Get the current time in milliseconds since UNIX epoch.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
