//! Store implementations for the cache library.

pub mod memory;
pub mod metrics;
pub mod moka;
pub mod redis;

pub use memory::{HashMapStore, HashMapStoreConfig, PurgeOnPutConfig};
pub use metrics::{CacheMetric, MetricsSink, MetricsStore, TracingSink};
pub use moka::{MokaStore, MokaStoreConfig};
pub use redis::{RedisStore, RedisStoreConfig};
