use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a cache entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// A serialized `CatalogueResult`.
    Catalogue,
    /// A raw upstream content record, normalized again on every read.
    Item,
}

/// A cache entry.
///
/// Payloads are plain JSON records, never normalized objects, so the store stays
/// independent of the content model. `cached_at_ms` is set when the entry is
/// built and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub kind: EntryKind,

    pub payload: Value,

    /// Unix timestamp in milliseconds at which the entry was written.
    pub cached_at_ms: i64,

    /// TTL the entry was written with.
    /// Tiered stores use this to backfill lower tiers with the remaining lifetime.
    pub ttl_secs: u64,

    /// Content type used to resolve the TTL when checking staleness.
    /// Catalogues record the type of their first item, items their own type.
    pub content_type_hint: Option<String>,
}

impl CacheEntry {
    /// Create a new cache entry.
    pub fn new(
        kind: EntryKind,
        payload: Value,
        cached_at_ms: i64,
        ttl_secs: u64,
        content_type_hint: Option<String>,
    ) -> Self {
        CacheEntry {
            kind,
            payload,
            cached_at_ms,
            ttl_secs,
            content_type_hint,
        }
    }

    /// Unix timestamp in milliseconds at which the store should drop the entry.
    pub fn expires_at_ms(&self) -> i64 {
        self.cached_at_ms
            .saturating_add((self.ttl_secs as i64).saturating_mul(1000))
    }

    /// Check if the entry has outlived its TTL.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms()
    }

    /// Fraction of `ttl_secs` that has elapsed since the entry was written.
    ///
    /// Returns `None` when `ttl_secs` is zero.
    pub fn elapsed_fraction(&self, now_ms: i64, ttl_secs: u64) -> Option<f64> {
        if ttl_secs == 0 {
            return None;
        }
        let elapsed_ms = (now_ms - self.cached_at_ms).max(0) as f64;
        Some(elapsed_ms / (ttl_secs as f64 * 1000.0))
    }

    /// Whole seconds left before expiry, rounded up and at least one.
    pub fn remaining_ttl_secs(&self, now_ms: i64) -> u64 {
        let remaining_ms = self.expires_at_ms() - now_ms;
        if remaining_ms <= 0 {
            return 1;
        }
        ((remaining_ms + 999) / 1000).max(1) as u64
    }
}
