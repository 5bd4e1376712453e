use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;

use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::store::Store;
use crate::utils::now_ms;

/// TieredStore is a store that checks multiple stores in order.
///
/// Stores are checked in the order they are provided.
/// The first store to return an entry is used to populate all previous stores,
/// with whatever lifetime the entry has left.
pub struct TieredStore {
    tiers: Vec<Arc<dyn Store>>,
}

impl TieredStore {
    /// Create a new tiered store.
    ///
    /// `stores` can accept `None` as members to allow you to construct the tiers dynamically.
    ///
    /// # Example
    /// ```ignore
    /// TieredStore::new(vec![
    ///     Some(Arc::new(memory_store)),
    ///     if enable_redis { Some(Arc::new(redis_store)) } else { None },
    /// ])
    /// ```
    pub fn new(stores: Vec<Option<Arc<dyn Store>>>) -> Self {
        let tiers = stores.into_iter().flatten().collect();
        TieredStore { tiers }
    }

    /// Create a tiered store from a vec of stores (no optional filtering).
    pub fn from_stores(stores: Vec<Arc<dyn Store>>) -> Self {
        TieredStore { tiers: stores }
    }

    fn backfill(&self, upto: usize, key: &str, entry: &CacheEntry) {
        let lower_tiers: Vec<_> = self.tiers[..upto].to_vec();
        let entry = entry.clone();
        let key = key.to_string();
        let ttl_secs = entry.remaining_ttl_secs(now_ms());

        tokio::spawn(async move {
            for tier in lower_tiers {
                match tier.put(&key, entry.clone(), ttl_secs).await {
                    Ok(()) => {
                        tracing::debug!(
                            tier = tier.name(),
                            key = %key,
                            ttl_secs,
                            "Populated lower cache tier"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(
                            tier = tier.name(),
                            key = %key,
                            error = %e,
                            "Failed to populate lower cache tier"
                        );
                    }
                }
            }
        });
    }
}

#[async_trait]
impl Store for TieredStore {
    fn name(&self) -> &'static str {
        "tiered"
    }

    async fn has(&self, key: &str) -> Result<bool, CacheError> {
        for tier in &self.tiers {
            if tier.has(key).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        for (i, tier) in self.tiers.iter().enumerate() {
            let Some(entry) = tier.get(key).await? else {
                continue;
            };

            // Fill all lower (earlier) tiers with this entry in the background
            if i > 0 {
                self.backfill(i, key, &entry);
            }

            return Ok(Some(entry));
        }

        Ok(None)
    }

    async fn put(&self, key: &str, entry: CacheEntry, ttl_secs: u64) -> Result<(), CacheError> {
        let futures: Vec<_> = self
            .tiers
            .iter()
            .map(|tier| tier.put(key, entry.clone(), ttl_secs))
            .collect();

        // Return first error if any
        for result in join_all(futures).await {
            result?;
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let futures: Vec<_> = self.tiers.iter().map(|tier| tier.delete(key)).collect();

        for result in join_all(futures).await {
            result?;
        }

        Ok(())
    }
}
