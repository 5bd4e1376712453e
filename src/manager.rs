//! Cache-or-fetch orchestration for catalogue pages and content items.

use serde_json::{Value, json};
use std::sync::Arc;

use crate::catalogue::{
    CatalogueFilters, CatalogueMetadata, CatalogueResult, extract_catalogue_data,
    extract_item_record,
};
use crate::config::{CacheConfig, TtlPolicy};
use crate::content::{ContentItem, ContentType, normalize, normalize_collection};
use crate::entry::{CacheEntry, EntryKind};
use crate::error::CatalogueError;
use crate::key::CacheKey;
use crate::refresh::{RefreshDispatcher, RefreshTask};
use crate::store::Store;
use crate::upstream::AcornApi;
use crate::utils::now_ms;

/// Decides whether a lookup is served from cache, served from cache with a
/// background refresh, or fetched from the catalogue API.
///
/// Store failures never fail a lookup: they are logged and the manager falls
/// through to the API. Concurrent misses on one key may both fetch and write;
/// the last write wins.
pub struct CatalogueCacheManager {
    store: Arc<dyn Store>,
    api: AcornApi,
    dispatcher: Arc<dyn RefreshDispatcher>,
    config: CacheConfig,
    ttl_policy: TtlPolicy,
}

impl CatalogueCacheManager {
    pub fn new(
        config: CacheConfig,
        store: Arc<dyn Store>,
        api: AcornApi,
        dispatcher: Arc<dyn RefreshDispatcher>,
    ) -> Self {
        let ttl_policy = TtlPolicy::from_config(&config);
        CatalogueCacheManager {
            store,
            api,
            dispatcher,
            config,
            ttl_policy,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn ttl_policy(&self) -> &TtlPolicy {
        &self.ttl_policy
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Cache key of a catalogue page, with `per_page` resolved to the configured
    /// default when omitted.
    pub fn catalogue_key(
        &self,
        page: u32,
        per_page: Option<u32>,
        filters: &CatalogueFilters,
    ) -> CacheKey {
        let (_, params) = self.catalogue_params(page, per_page, filters);
        CacheKey::catalogue(&params, &self.config.version)
    }

    pub fn item_key(&self, id: u64) -> CacheKey {
        CacheKey::item(id, &self.config.version)
    }

    /// Get one page of the catalogue.
    ///
    /// `filters.no_cache` forces a fetch: any existing entry is deleted first and
    /// the fresh result is written back.
    pub async fn get_catalogue(
        &self,
        page: u32,
        per_page: Option<u32>,
        filters: CatalogueFilters,
    ) -> Result<CatalogueResult, CatalogueError> {
        let (resolved_per_page, params) = self.catalogue_params(page, per_page, &filters);
        let page = page.max(1);
        let key = CacheKey::catalogue(&params, &self.config.version);
        let content_type = filters.content_type();
        let ttl = self.ttl_policy.resolve(content_type);
        let bypass = filters.no_cache;

        if bypass && self.config.enabled {
            self.evict(&key).await;
        }

        if self.config.enabled && !bypass {
            if let Some(entry) = self.read(&key, EntryKind::Catalogue).await {
                match serde_json::from_value::<CatalogueResult>(entry.payload.clone()) {
                    Ok(result) => {
                        tracing::info!(key = %key, content_type, page, "Returning cached content catalogue");
                        if self.should_refresh_in_background(&entry, now_ms()) {
                            tracing::info!(
                                key = %key,
                                content_type,
                                "Cache is getting stale, triggering background refresh"
                            );
                            self.dispatch(RefreshTask::GetCatalogue {
                                page,
                                per_page,
                                filters: filters.fields.clone(),
                            });
                        }
                        return Ok(result);
                    }
                    Err(e) => {
                        tracing::warn!(key = %key, error = %e, "Ignoring unreadable catalogue entry");
                    }
                }
            }
        }

        tracing::info!(content_type, page, bypass_cache = bypass, "Fetching content catalogue from API");
        let body = self.api.external_catalogue(&params).await?;
        let data = extract_catalogue_data(&body).inspect_err(|e| {
            tracing::error!(error = %e, "Unexpected API response format");
        })?;

        let raw_items = data
            .get("items")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let items = normalize_collection(raw_items);
        let metadata = CatalogueMetadata::from_upstream(data, raw_items.len(), page, resolved_per_page);
        let result = CatalogueResult { items, metadata };

        if self.config.enabled {
            let hint = result.items.first().map(|item| item.content_type.clone());
            match serde_json::to_value(&result) {
                Ok(payload) => {
                    let entry = CacheEntry::new(EntryKind::Catalogue, payload, now_ms(), ttl, hint);
                    if self.write(&key, entry, ttl).await {
                        tracing::info!(
                            key = %key,
                            ttl,
                            content_type,
                            was_refresh = bypass,
                            "Cached content catalogue"
                        );
                    }
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Failed to serialize catalogue for caching");
                }
            }
        }

        Ok(result)
    }

    /// Get a single content item by id.
    pub async fn get_content_item(
        &self,
        id: u64,
        bypass_cache: bool,
    ) -> Result<ContentItem, CatalogueError> {
        let key = self.item_key(id);

        if bypass_cache && self.config.enabled {
            self.evict(&key).await;
        }

        if self.config.enabled && !bypass_cache {
            if let Some(entry) = self.read(&key, EntryKind::Item).await {
                tracing::info!(key = %key, id, "Returning cached content item");
                if self.should_refresh_in_background(&entry, now_ms()) {
                    tracing::info!(
                        key = %key,
                        id,
                        "Content item cache is getting stale, triggering background refresh"
                    );
                    self.dispatch(RefreshTask::GetContentItem { id });
                }
                return Ok(normalize(&entry.payload));
            }
        }

        tracing::info!(id, bypass_cache, "Fetching content item from API");
        let body = self.api.content_by_id(id).await?;
        let record = extract_item_record(&body).inspect_err(|e| {
            tracing::error!(id, error = %e, "Invalid content item data format");
        })?;

        let item = normalize(record);
        let ttl = self.ttl_policy.resolve(Some(item.content_type.as_str()));

        if self.config.enabled {
            let entry = CacheEntry::new(
                EntryKind::Item,
                record.clone(),
                now_ms(),
                ttl,
                Some(item.content_type.clone()),
            );
            if self.write(&key, entry, ttl).await {
                tracing::info!(
                    key = %key,
                    id,
                    ttl,
                    content_type = %item.content_type,
                    was_refresh = bypass_cache,
                    "Cached content item"
                );
            }
        }

        Ok(item)
    }

    /// Get a catalogue page filtered to one content type.
    pub async fn get_content_by_type(
        &self,
        content_type: &str,
        page: u32,
        per_page: Option<u32>,
        bypass_cache: bool,
    ) -> Result<CatalogueResult, CatalogueError> {
        tracing::info!(content_type, page, bypass_cache, "Getting content by type");
        let filters = CatalogueFilters::new()
            .with_content_type(content_type)
            .no_cache(bypass_cache);
        let result = self.get_catalogue(page, per_page, filters).await;
        tracing::info!(
            content_type,
            success = result.is_ok(),
            item_count = result.as_ref().map(|r| r.items.len()).unwrap_or(0),
            "Completed getting content by type"
        );
        result
    }

    /// Force a refresh of cached content. Always returns `true`; failures are
    /// only logged.
    ///
    /// - `id`: drop and re-fetch that item. An id of 0 counts as absent.
    /// - `content_type`: re-fetch the first page of that type and the first page
    ///   of the unfiltered catalogue.
    /// - neither: re-fetch the first page of the unfiltered catalogue, then the
    ///   first page of every known content type.
    pub async fn refresh_cache(&self, id: Option<u64>, content_type: Option<&str>) -> bool {
        tracing::info!(id, content_type, "Manually refreshing cache");

        if let Some(id) = id.filter(|id| *id > 0) {
            let key = self.item_key(id);
            self.evict(&key).await;
            let result = self.get_content_item(id, true).await;
            log_outcome("content item", &json!({ "id": id }), &result);
            return true;
        }

        if let Some(content_type) = content_type.filter(|t| !t.is_empty()) {
            let by_type = self.get_content_by_type(content_type, 1, None, true).await;
            log_outcome("content type catalogue", &json!({ "contentType": content_type }), &by_type);

            let general = self
                .get_catalogue(1, None, CatalogueFilters::new().no_cache(true))
                .await;
            log_outcome("general catalogue", &Value::Null, &general);
            return true;
        }

        let general = self
            .get_catalogue(1, None, CatalogueFilters::new().no_cache(true))
            .await;
        log_outcome("general catalogue", &Value::Null, &general);

        for content_type in ContentType::ALL {
            let result = self
                .get_content_by_type(content_type.as_str(), 1, None, true)
                .await;
            log_outcome("content type catalogue", &json!({ "contentType": content_type.as_str() }), &result);
        }

        tracing::info!("Completed refreshing all content caches");
        true
    }

    /// Whether a cache hit on `entry` should schedule a background refresh.
    ///
    /// True once the elapsed share of the entry's TTL reaches the configured
    /// threshold. The TTL comes from the entry's content-type hint.
    pub fn should_refresh_in_background(&self, entry: &CacheEntry, now_ms: i64) -> bool {
        let refresh = &self.config.background_refresh;
        if !refresh.enabled || entry.cached_at_ms <= 0 {
            return false;
        }

        let ttl = self.ttl_policy.resolve(entry.content_type_hint.as_deref());
        entry
            .elapsed_fraction(now_ms, ttl)
            .is_some_and(|fraction| fraction >= refresh.threshold)
    }

    fn catalogue_params(
        &self,
        page: u32,
        per_page: Option<u32>,
        filters: &CatalogueFilters,
    ) -> (u32, std::collections::BTreeMap<String, Value>) {
        let per_page = per_page
            .filter(|n| *n > 0)
            .unwrap_or(self.api.config().per_page);
        let mut params = filters.fields.clone();
        params.insert("page".to_string(), json!(page.max(1)));
        params.insert("perPage".to_string(), json!(per_page));
        (per_page, params)
    }

    fn dispatch(&self, task: RefreshTask) {
        tracing::info!(
            operation = task.operation_name(),
            task = ?task,
            "Triggered background cache refresh"
        );
        self.dispatcher.enqueue(task);
    }

    /// Read an entry, treating store errors and entries of the wrong kind as misses.
    async fn read(&self, key: &CacheKey, kind: EntryKind) -> Option<CacheEntry> {
        match self.store.get(key.as_str()).await {
            Ok(Some(entry)) if entry.kind == kind => Some(entry),
            Ok(Some(entry)) => {
                tracing::warn!(key = %key, found = ?entry.kind, expected = ?kind, "Ignoring cache entry of unexpected kind");
                None
            }
            Ok(None) => {
                tracing::debug!(key = %key, "Cache miss");
                None
            }
            Err(e) => {
                tracing::warn!(
                    key = %key,
                    tier = self.store.name(),
                    error = %e,
                    "Cache read failed, falling through to API"
                );
                None
            }
        }
    }

    /// Write an entry. Returns whether it was stored.
    async fn write(&self, key: &CacheKey, entry: CacheEntry, ttl: u64) -> bool {
        if ttl == 0 {
            tracing::debug!(key = %key, "TTL is zero, not caching");
            return false;
        }
        match self.store.put(key.as_str(), entry, ttl).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    key = %key,
                    tier = self.store.name(),
                    error = %e,
                    "Cache write failed"
                );
                false
            }
        }
    }

    /// Delete an entry if one exists.
    async fn evict(&self, key: &CacheKey) {
        match self.store.has(key.as_str()).await {
            Ok(false) => {}
            Ok(true) => match self.store.delete(key.as_str()).await {
                Ok(()) => tracing::info!(key = %key, "Removed existing cache entry before refreshing"),
                Err(e) => tracing::warn!(key = %key, error = %e, "Cache delete failed"),
            },
            Err(e) => tracing::warn!(key = %key, error = %e, "Cache lookup before delete failed"),
        }
    }
}

fn log_outcome<T>(what: &str, params: &Value, result: &Result<T, CatalogueError>) {
    match result {
        Ok(_) => tracing::info!(target_view = what, params = %params, "Refreshed cache"),
        Err(e) => tracing::warn!(
            target_view = what,
            params = %params,
            status = e.status_code(),
            error = %e,
            "Cache refresh failed"
        ),
    }
}
