use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::store::Store;
use crate::utils::now_ms;

/// Configuration for purging expired entries on put.
#[derive(Debug, Clone)]
pub struct PurgeOnPutConfig {
    /// Provide a number between 0 and 1 to calculate whether a purge should run on each put.
    ///
    /// - `1.0` -> purge on every `put`
    /// - `0.5` -> purge on every 2nd `put` (on average)
    /// - `0.0` -> disable purging
    pub frequency: f64,
}

/// Frequency of the purge a default `HashMapStore` runs on `put`.
pub const DEFAULT_PURGE_FREQUENCY: f64 = 0.01;

/// Configuration for HashMapStore.
#[derive(Debug, Clone)]
pub struct HashMapStoreConfig {
    /// Sweep expired entries out of the map during `put` operations.
    ///
    /// With `None` an expired entry stays in the map until it is read again, so
    /// catalogue keys nobody asks for twice are never reclaimed.
    ///
    /// Default: one purge per hundred puts on average.
    pub purge_on_put: Option<PurgeOnPutConfig>,
}

impl Default for HashMapStoreConfig {
    fn default() -> Self {
        HashMapStoreConfig {
            purge_on_put: Some(PurgeOnPutConfig {
                frequency: DEFAULT_PURGE_FREQUENCY,
            }),
        }
    }
}

/// Internal stored entry with expiration time.
#[derive(Clone)]
struct Slot {
    expires: i64,
    entry: CacheEntry,
}

/// Thread-safe in-memory cache store using HashMap with RwLock.
///
/// This is a simple store suitable for:
/// - Low to moderate concurrency (<8 threads)
/// - Tests and single-process deployments
///
/// For high-concurrency scenarios, consider using `MokaStore` instead.
pub struct HashMapStore {
    state: RwLock<HashMap<String, Slot>>,
    purge_on_put: Option<PurgeOnPutConfig>,
}

impl HashMapStore {
    /// Create a new HashMapStore with the given configuration.
    pub fn new(config: HashMapStoreConfig) -> Self {
        HashMapStore {
            state: RwLock::new(HashMap::new()),
            purge_on_put: config.purge_on_put,
        }
    }

    /// Number of slots currently held, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.state.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.is_empty()
    }

    /// Run a purge if configured and the random check passes.
    async fn maybe_purge(&self) {
        let Some(ref config) = self.purge_on_put else {
            return;
        };

        if config.frequency <= 0.0 {
            return;
        }

        let should_purge = config.frequency >= 1.0 || rand::random::<f64>() < config.frequency;
        if !should_purge {
            return;
        }

        let now = now_ms();
        let mut state = self.state.write().await;
        state.retain(|_, slot| slot.expires > now);
    }
}

impl Default for HashMapStore {
    fn default() -> Self {
        Self::new(HashMapStoreConfig::default())
    }
}

#[async_trait]
impl Store for HashMapStore {
    fn name(&self) -> &'static str {
        "hashmap"
    }

    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let state = self.state.read().await;

        let Some(slot) = state.get(key) else {
            return Ok(None);
        };

        let now = now_ms();
        if slot.expires <= now {
            // Entry is expired, remove it
            drop(state);
            let mut state = self.state.write().await;
            if state.get(key).is_some_and(|slot| slot.expires <= now) {
                state.remove(key);
            }
            return Ok(None);
        }

        Ok(Some(slot.entry.clone()))
    }

    async fn put(&self, key: &str, entry: CacheEntry, ttl_secs: u64) -> Result<(), CacheError> {
        let expires = now_ms().saturating_add((ttl_secs as i64).saturating_mul(1000));

        {
            let mut state = self.state.write().await;
            state.insert(key.to_string(), Slot { expires, entry });
        }

        self.maybe_purge().await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut state = self.state.write().await;
        state.remove(key);
        Ok(())
    }
}
