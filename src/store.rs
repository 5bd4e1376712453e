use async_trait::async_trait;

use crate::entry::CacheEntry;
use crate::error::CacheError;

/// A store is a common interface for storing, reading and deleting cache entries.
///
/// Stores own entry lifetime: an entry written with `ttl_secs` must stop being
/// returned once that many seconds have passed since `put`. The catalogue manager
/// never expires entries itself; its staleness check only decides when to refresh.
///
/// Implementations are shared between concurrent requests and must make each
/// per-key operation atomic. No cross-key transactions are required.
#[async_trait]
pub trait Store: Send + Sync {
    /// A name for metrics/tracing.
    ///
    /// # Example
    /// - "hashmap"
    /// - "redis"
    /// - "tiered"
    fn name(&self) -> &'static str;

    /// Return whether a live entry exists for `key`.
    async fn has(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.get(key).await?.is_some())
    }

    /// Return the cached entry.
    ///
    /// The response must be `None` for cache misses and expired entries.
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;

    /// Store `entry` under `key` for `ttl_secs` seconds, replacing any previous entry.
    async fn put(&self, key: &str, entry: CacheEntry, ttl_secs: u64) -> Result<(), CacheError>;

    /// Remove the key from the store. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
