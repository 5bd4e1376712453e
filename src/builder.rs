//! Builder API for assembling a catalogue cache manager.

use std::sync::Arc;

use crate::config::CatalogueConfig;
use crate::error::ConfigError;
use crate::manager::CatalogueCacheManager;
use crate::refresh::{ChannelDispatcher, NoopDispatcher, RefreshDispatcher, RefreshWorker};
use crate::store::Store;
use crate::stores::MokaStore;
use crate::upstream::{AcornApi, HttpUpstreamClient, UpstreamClient};

/// Builder for [`CatalogueCacheManager`].
///
/// Anything not set explicitly gets a default: an in-memory [`MokaStore`], an
/// [`HttpUpstreamClient`] using the retry settings from the config, and a
/// dispatcher that drops refresh tasks.
///
/// # Example
///
/// ```ignore
/// use acorn_catalogue_cache::{CatalogueCacheBuilder, CatalogueConfig, CatalogueFilters};
///
/// let manager = CatalogueCacheBuilder::new(CatalogueConfig::from_env())
///     .build_with_worker()?;
///
/// let page = manager.get_catalogue(1, None, CatalogueFilters::new()).await?;
/// ```
pub struct CatalogueCacheBuilder {
    config: CatalogueConfig,
    store: Option<Arc<dyn Store>>,
    upstream: Option<Arc<dyn UpstreamClient>>,
    dispatcher: Option<Arc<dyn RefreshDispatcher>>,
}

impl CatalogueCacheBuilder {
    pub fn new(config: CatalogueConfig) -> Self {
        CatalogueCacheBuilder {
            config,
            store: None,
            upstream: None,
            dispatcher: None,
        }
    }

    pub fn store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn upstream(mut self, upstream: Arc<dyn UpstreamClient>) -> Self {
        self.upstream = Some(upstream);
        self
    }

    pub fn dispatcher(mut self, dispatcher: Arc<dyn RefreshDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Validate the config and build the manager.
    pub fn build(self) -> Result<CatalogueCacheManager, ConfigError> {
        self.config.validate()?;

        let upstream = match self.upstream {
            Some(upstream) => upstream,
            None => {
                let client = HttpUpstreamClient::new(self.config.retry.clone())
                    .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
                Arc::new(client)
            }
        };
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MokaStore::default()));
        let dispatcher = self
            .dispatcher
            .unwrap_or_else(|| Arc::new(NoopDispatcher));

        tracing::debug!(
            store = store.name(),
            cache_enabled = self.config.cache.enabled,
            version = %self.config.cache.version,
            "Building catalogue cache manager"
        );

        let api = AcornApi::new(upstream, self.config.api);
        Ok(CatalogueCacheManager::new(
            self.config.cache,
            store,
            api,
            dispatcher,
        ))
    }

    /// Build the manager with a [`ChannelDispatcher`] feeding a spawned
    /// [`RefreshWorker`]. Must be called inside a tokio runtime.
    ///
    /// Any dispatcher set on the builder is replaced.
    pub fn build_with_worker(self) -> Result<Arc<CatalogueCacheManager>, ConfigError> {
        let (dispatcher, receiver) = ChannelDispatcher::channel();
        let manager = Arc::new(self.dispatcher(Arc::new(dispatcher)).build()?);
        RefreshWorker::spawn(receiver, Arc::downgrade(&manager));
        Ok(manager)
    }
}
