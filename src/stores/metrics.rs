//! Metrics middleware for cache stores.
//!
//! This module provides a `MetricsStore` wrapper that emits metrics for all
//! cache operations (reads, writes, deletes) to a user-provided sink.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use acorn_catalogue_cache::{MokaStore, Store};
//! use acorn_catalogue_cache::stores::metrics::{MetricsStore, TracingSink};
//!
//! let moka: Arc<dyn Store> = Arc::new(MokaStore::default());
//! let store: Arc<dyn Store> = Arc::new(MetricsStore::new(moka, Arc::new(TracingSink)));
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

use crate::entry::{CacheEntry, EntryKind};
use crate::error::CacheError;
use crate::store::Store;

/// Metrics emitted by the MetricsStore wrapper.
#[derive(Debug, Clone)]
pub enum CacheMetric {
    /// Emitted on every cache read (get) operation.
    Read {
        /// The cache key that was read.
        key: String,
        /// Whether the key was found in the cache.
        hit: bool,
        /// Kind of the entry (only present when hit=true).
        kind: Option<EntryKind>,
        /// Latency of the operation in milliseconds.
        latency_ms: f64,
        /// Name of the store tier (from Store::name()).
        tier: String,
    },
    /// Emitted on every cache write (put) operation.
    Write {
        key: String,
        ttl_secs: u64,
        latency_ms: f64,
        tier: String,
    },
    /// Emitted on every cache delete operation.
    Delete {
        key: String,
        latency_ms: f64,
        tier: String,
    },
}

/// Trait for receiving cache metrics.
///
/// Implement this trait to collect metrics from `MetricsStore`.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Emit a single metric.
    ///
    /// This is called synchronously in the hot path of cache operations.
    /// Implementations should be fast (e.g., buffer metrics in memory).
    fn emit(&self, metric: CacheMetric);

    /// Flush any buffered metrics.
    async fn flush(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Writes every metric as a `debug` tracing event under the
/// `acorn_catalogue_cache::metrics` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

#[async_trait]
impl MetricsSink for TracingSink {
    fn emit(&self, metric: CacheMetric) {
        match metric {
            CacheMetric::Read {
                key,
                hit,
                kind,
                latency_ms,
                tier,
            } => tracing::debug!(
                target: "acorn_catalogue_cache::metrics",
                op = "read",
                key = %key,
                hit,
                kind = ?kind,
                latency_ms,
                tier = %tier,
                "Cache read"
            ),
            CacheMetric::Write {
                key,
                ttl_secs,
                latency_ms,
                tier,
            } => tracing::debug!(
                target: "acorn_catalogue_cache::metrics",
                op = "write",
                key = %key,
                ttl_secs,
                latency_ms,
                tier = %tier,
                "Cache write"
            ),
            CacheMetric::Delete {
                key,
                latency_ms,
                tier,
            } => tracing::debug!(
                target: "acorn_catalogue_cache::metrics",
                op = "delete",
                key = %key,
                latency_ms,
                tier = %tier,
                "Cache delete"
            ),
        }
    }

    async fn flush(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

/// A store wrapper that emits metrics for all operations.
pub struct MetricsStore {
    inner: Arc<dyn Store>,
    sink: Arc<dyn MetricsSink>,
    tier_name: String,
}

impl MetricsStore {
    /// Create a new MetricsStore wrapping the given store.
    pub fn new(inner: Arc<dyn Store>, sink: Arc<dyn MetricsSink>) -> Self {
        let tier_name = inner.name().to_string();
        MetricsStore {
            inner,
            sink,
            tier_name,
        }
    }

    fn elapsed_ms(start: Instant) -> f64 {
        start.elapsed().as_secs_f64() * 1000.0
    }
}

#[async_trait]
impl Store for MetricsStore {
    fn name(&self) -> &'static str {
        "metrics"
    }

    async fn has(&self, key: &str) -> Result<bool, CacheError> {
        self.inner.has(key).await
    }

    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let start = Instant::now();
        let result = self.inner.get(key).await;
        let latency_ms = Self::elapsed_ms(start);

        let (hit, kind) = match &result {
            Ok(Some(entry)) => (true, Some(entry.kind)),
            Ok(None) | Err(_) => (false, None),
        };

        self.sink.emit(CacheMetric::Read {
            key: key.to_string(),
            hit,
            kind,
            latency_ms,
            tier: self.tier_name.clone(),
        });

        result
    }

    async fn put(&self, key: &str, entry: CacheEntry, ttl_secs: u64) -> Result<(), CacheError> {
        let start = Instant::now();
        let result = self.inner.put(key, entry, ttl_secs).await;
        let latency_ms = Self::elapsed_ms(start);

        self.sink.emit(CacheMetric::Write {
            key: key.to_string(),
            ttl_secs,
            latency_ms,
            tier: self.tier_name.clone(),
        });

        result
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let start = Instant::now();
        let result = self.inner.delete(key).await;
        let latency_ms = Self::elapsed_ms(start);

        self.sink.emit(CacheMetric::Delete {
            key: key.to_string(),
            latency_ms,
            tier: self.tier_name.clone(),
        });

        result
    }
}
