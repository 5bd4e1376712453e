//! acorn-catalogue-cache - a stale-while-revalidate cache in front of the ACORN
//! learning-content catalogue API.
//!
//! This library provides:
//! - Catalogue page and content item lookups served from cache or the API
//! - Per content type TTLs
//! - Background refresh once an entry has used up most of its TTL
//! - Explicit invalidation and bulk refresh
//! - Pluggable stores (in-memory, moka, Redis, tiered)
//!
//! # Example
//!
//! ```ignore
//! use acorn_catalogue_cache::{CatalogueCacheBuilder, CatalogueConfig, CatalogueFilters};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = CatalogueCacheBuilder::new(CatalogueConfig::from_env())
//!         .build_with_worker()?;
//!
//!     // First call hits the API, the second one is served from cache.
//!     let filters = CatalogueFilters::new().with_content_type("course");
//!     let page = manager.get_catalogue(1, None, filters.clone()).await?;
//!     let again = manager.get_catalogue(1, None, filters).await?;
//!     assert_eq!(page, again);
//!
//!     let item = manager.get_content_item(42, false).await?;
//!     println!("{} ({})", item.fullname, item.content_type);
//!
//!     manager.refresh_cache(Some(42), None).await;
//!     Ok(())
//! }
//! ```

mod builder;
pub mod catalogue;
pub mod config;
pub mod content;
mod entry;
mod error;
mod key;
mod manager;
pub mod refresh;
mod store;
pub mod stores;
mod tiered;
pub mod upstream;
mod utils;

// Re-export public API
pub use builder::CatalogueCacheBuilder;
pub use catalogue::{CatalogueFilters, CatalogueMetadata, CatalogueResult};
pub use config::{
    AcornApiConfig, BackgroundRefreshConfig, CacheConfig, CatalogueConfig, RetryConfig, TtlPolicy,
};
pub use content::{ContentDetails, ContentItem, ContentType, normalize};
pub use entry::{CacheEntry, EntryKind};
pub use error::{CacheError, CatalogueError, ConfigError};
pub use key::{CacheKey, stable_hash};
pub use manager::CatalogueCacheManager;
pub use refresh::{ChannelDispatcher, NoopDispatcher, RefreshDispatcher, RefreshTask, RefreshWorker};
pub use store::Store;
pub use stores::memory::{HashMapStore, HashMapStoreConfig, PurgeOnPutConfig};
pub use stores::metrics::{CacheMetric, MetricsSink, MetricsStore, TracingSink};
pub use stores::moka::{MokaStore, MokaStoreConfig};
pub use stores::redis::{RedisStore, RedisStoreConfig};
pub use tiered::TieredStore;
pub use upstream::{AcornApi, HttpUpstreamClient, MockUpstreamClient, UpstreamClient, UpstreamResponse};
