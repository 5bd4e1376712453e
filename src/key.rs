//! Cache key construction.
//!
//! Catalogue keys hash the full parameter set (filters, page and per-page) so two
//! requests with the same filters always land on the same entry. The parameters
//! live in a `BTreeMap`, which serializes its keys in sorted order, making the
//! digest independent of the order in which callers inserted filters.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

const CATALOGUE_PREFIX: &str = "content_catalogue";
const ITEM_PREFIX: &str = "content_item";

/// A versioned cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for a catalogue page: `content_catalogue:{sha256(params)}:{version}`.
    pub fn catalogue(params: &BTreeMap<String, Value>, version: &str) -> Self {
        CacheKey(format!(
            "{}:{}:{}",
            CATALOGUE_PREFIX,
            stable_hash(params),
            version
        ))
    }

    /// Key for a single content item: `content_item:{id}:{version}`.
    pub fn item(id: u64, version: &str) -> Self {
        CacheKey(format!("{}:{}:{}", ITEM_PREFIX, id, version))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Hex SHA-256 digest of the canonical JSON form of `params`.
///
/// Nested objects inside values are canonicalized as well, since `serde_json`'s
/// default `Map` is itself ordered by key.
pub fn stable_hash(params: &BTreeMap<String, Value>) -> String {
    let canonical = serde_json::to_string(params).unwrap_or_default();
    hex::encode(Sha256::digest(canonical.as_bytes()))
}
