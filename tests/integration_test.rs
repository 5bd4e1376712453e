//! Integration tests for the catalogue cache manager with memory, moka and Redis stores.

use acorn_catalogue_cache::{
    AcornApi, AcornApiConfig, CacheConfig, CacheEntry, CacheError, CatalogueCacheBuilder,
    CacheMetric, CatalogueCacheManager, CatalogueConfig, CatalogueError, CatalogueFilters,
    ContentDetails, EntryKind, HashMapStore, MetricsSink, MetricsStore, MockUpstreamClient,
    MokaStore, RedisStore, RedisStoreConfig, RefreshDispatcher, RefreshTask, Store, TieredStore,
    UpstreamClient, UpstreamResponse,
};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Test Doubles
// ============================================================================

/// Answers every request with the same response and records the queries.
struct RecordingUpstream {
    response: UpstreamResponse,
    queries: Mutex<Vec<Vec<(String, String)>>>,
}

impl RecordingUpstream {
    fn new(status: u16, body: Value) -> Self {
        RecordingUpstream {
            response: UpstreamResponse::new(status, body),
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl UpstreamClient for RecordingUpstream {
    async fn get(
        &self,
        _url: &str,
        query: &[(String, String)],
        _headers: &HashMap<String, String>,
    ) -> UpstreamResponse {
        self.queries.lock().unwrap().push(query.to_vec());
        self.response.clone()
    }
}

#[derive(Default)]
struct RecordingDispatcher {
    tasks: Mutex<Vec<RefreshTask>>,
}

impl RecordingDispatcher {
    fn tasks(&self) -> Vec<RefreshTask> {
        self.tasks.lock().unwrap().clone()
    }
}

impl RefreshDispatcher for RecordingDispatcher {
    fn enqueue(&self, task: RefreshTask) {
        self.tasks.lock().unwrap().push(task);
    }
}

/// A store whose backend is always down.
struct FailingStore {
    calls: AtomicUsize,
}

#[async_trait]
impl Store for FailingStore {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::operation("failing", key, "connection refused"))
    }

    async fn put(&self, key: &str, _entry: CacheEntry, _ttl_secs: u64) -> Result<(), CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::operation("failing", key, "connection refused"))
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::operation("failing", key, "connection refused"))
    }
}

/// Keeps every metric it receives.
#[derive(Default)]
struct RecordingSink {
    metrics: Mutex<Vec<CacheMetric>>,
}

#[async_trait]
impl MetricsSink for RecordingSink {
    fn emit(&self, metric: CacheMetric) {
        self.metrics.lock().unwrap().push(metric);
    }

    async fn flush(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}

fn build_manager(
    config: CacheConfig,
    store: Arc<dyn Store>,
    upstream: Arc<dyn UpstreamClient>,
    dispatcher: Arc<dyn RefreshDispatcher>,
) -> CatalogueCacheManager {
    let api = AcornApi::new(upstream, AcornApiConfig::default());
    CatalogueCacheManager::new(config, store, api, dispatcher)
}

fn mock_manager() -> (
    CatalogueCacheManager,
    Arc<MockUpstreamClient>,
    Arc<HashMapStore>,
    Arc<RecordingDispatcher>,
) {
    let upstream = Arc::new(MockUpstreamClient::new());
    let store = Arc::new(HashMapStore::default());
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let manager = build_manager(
        CacheConfig::default(),
        store.clone(),
        upstream.clone(),
        dispatcher.clone(),
    );
    (manager, upstream, store, dispatcher)
}

/// Rewrite the entry at `key` as if it had been cached `fraction` of its TTL ago.
async fn age_entry(store: &dyn Store, key: &str, fraction: f64) {
    let mut entry = store.get(key).await.unwrap().expect("entry should be cached");
    entry.cached_at_ms = now_ms() - (fraction * entry.ttl_secs as f64 * 1000.0) as i64;
    let ttl = entry.ttl_secs;
    store.put(key, entry, ttl).await.unwrap();
}

fn record(id: u64, fullname: &str, content_type: &str) -> Value {
    json!({
        "contentid": id,
        "fullname": fullname,
        "contenttype": content_type,
    })
}

async fn create_redis_store() -> RedisStore {
    let config = RedisStoreConfig {
        url: "redis://localhost:6379".to_string(),
        key_prefix: "acorn-test".to_string(),
    };
    RedisStore::new(config)
        .await
        .expect("Failed to connect to Redis - is it running?")
}

// ============================================================================
// Catalogue Tests
// ============================================================================

#[tokio::test]
async fn test_second_catalogue_call_served_from_cache() {
    let (manager, upstream, _, _) = mock_manager();

    let first = manager
        .get_catalogue(1, Some(10), CatalogueFilters::new())
        .await
        .unwrap();
    let second = manager
        .get_catalogue(1, Some(10), CatalogueFilters::new())
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first.items.len(), 5);
    // Origin should only have been called once
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn test_no_cache_fetches_and_replaces_entry() {
    let (manager, upstream, _, _) = mock_manager();

    let before = manager
        .get_catalogue(1, Some(10), CatalogueFilters::new())
        .await
        .unwrap();
    assert_eq!(before.items[0].fullname, "Test Course");

    upstream
        .set_items(vec![record(1, "Renamed Course", "course")])
        .await;

    let refreshed = manager
        .get_catalogue(1, Some(10), CatalogueFilters::new().no_cache(true))
        .await
        .unwrap();
    assert_eq!(upstream.calls(), 2);
    assert_eq!(refreshed.items.len(), 1);

    let after = manager
        .get_catalogue(1, Some(10), CatalogueFilters::new())
        .await
        .unwrap();
    assert_eq!(upstream.calls(), 2);
    assert_eq!(after.items[0].fullname, "Renamed Course");
}

#[tokio::test]
async fn test_no_cache_is_not_forwarded_upstream() {
    let upstream = Arc::new(RecordingUpstream::new(200, json!({"items": []})));
    let manager = build_manager(
        CacheConfig::default(),
        Arc::new(HashMapStore::default()),
        upstream.clone(),
        Arc::new(RecordingDispatcher::default()),
    );

    let mut raw = HashMap::new();
    raw.insert("contentType".to_string(), json!("video"));
    raw.insert("no_cache".to_string(), json!(true));
    manager
        .get_catalogue(2, None, CatalogueFilters::from_map(raw))
        .await
        .unwrap();

    let queries = upstream.queries.lock().unwrap();
    let query = &queries[0];
    assert!(query.iter().all(|(k, _)| k != "no_cache"));
    assert!(query.contains(&("contentType".to_string(), "video".to_string())));
    assert!(query.contains(&("page".to_string(), "2".to_string())));
    assert!(query.contains(&("perPage".to_string(), "10".to_string())));
}

#[tokio::test]
async fn test_end_to_end_course_normalization() {
    let upstream = Arc::new(RecordingUpstream::new(
        200,
        json!({
            "status": "Complete",
            "data": {
                "items": [{
                    "contentid": 1,
                    "fullname": "Rust Fundamentals",
                    "summary": "Ownership and borrowing",
                    "contenttype": "course",
                    "imageurl": "https://example.com/rust.png",
                    "topics": ["Ownership", "Lifetimes"],
                    "competencies": ["Systems Programming"],
                }],
                "total_items": 1,
                "current_page": 1,
                "per_page": 10,
                "total_pages": 1,
            }
        }),
    ));
    let manager = build_manager(
        CacheConfig::default(),
        Arc::new(HashMapStore::default()),
        upstream,
        Arc::new(RecordingDispatcher::default()),
    );

    let result = manager
        .get_catalogue(1, Some(10), CatalogueFilters::new())
        .await
        .unwrap();

    assert_eq!(result.items.len(), 1);
    let item = &result.items[0];
    assert_eq!(item.id, 1);
    assert_eq!(item.content_type, "course");
    assert_eq!(item.image.as_deref(), Some("https://example.com/rust.png"));
    assert_eq!(
        item.details,
        ContentDetails::Course {
            topics: Some(vec![json!("Ownership"), json!("Lifetimes")]),
            competencies: Some(vec![json!("Systems Programming")]),
        }
    );
    assert_eq!(result.metadata.total_items, 1);
    assert_eq!(result.metadata.total_pages, 1);
}

#[tokio::test]
async fn test_accepts_all_catalogue_shapes() {
    let items = json!([{"contentid": 7, "contenttype": "video"}]);
    let bodies = [
        json!({"status": "Complete", "data": {"items": items.clone(), "total_items": 1}}),
        json!({"data": {"items": items.clone(), "total_items": 1}}),
        json!({"items": items, "total_items": 1}),
    ];

    for body in bodies {
        let manager = build_manager(
            CacheConfig::default(),
            Arc::new(HashMapStore::default()),
            Arc::new(RecordingUpstream::new(200, body)),
            Arc::new(RecordingDispatcher::default()),
        );
        let result = manager
            .get_catalogue(1, None, CatalogueFilters::new())
            .await
            .unwrap();
        assert_eq!(result.items[0].id, 7);
        assert_eq!(result.metadata.total_pages, 1);
    }
}

#[tokio::test]
async fn test_unrecognized_shape_is_format_error_and_not_cached() {
    let store = Arc::new(HashMapStore::default());
    let manager = build_manager(
        CacheConfig::default(),
        store.clone(),
        Arc::new(RecordingUpstream::new(200, json!({"rows": []}))),
        Arc::new(RecordingDispatcher::default()),
    );

    let err = manager
        .get_catalogue(1, None, CatalogueFilters::new())
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogueError::Format(_)));
    assert_eq!(err.status_code(), 500);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_catalogue_upstream_error_not_cached() {
    let store = Arc::new(HashMapStore::default());
    let manager = build_manager(
        CacheConfig::default(),
        store.clone(),
        Arc::new(RecordingUpstream::new(503, json!({"error": "boom"}))),
        Arc::new(RecordingDispatcher::default()),
    );

    let err = manager
        .get_catalogue(1, None, CatalogueFilters::new().with_content_type("course"))
        .await
        .unwrap_err();

    assert_eq!(err, CatalogueError::upstream(503, "boom"));
    assert_eq!(err.status_code(), 503);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_content_type_ttl_override() {
    let mut config = CacheConfig::default();
    config.content_types.insert("course".to_string(), 3600);
    let store = Arc::new(HashMapStore::default());
    let manager = build_manager(
        config,
        store.clone(),
        Arc::new(MockUpstreamClient::new()),
        Arc::new(RecordingDispatcher::default()),
    );

    manager
        .get_content_by_type("course", 1, None, false)
        .await
        .unwrap();
    manager
        .get_catalogue(1, None, CatalogueFilters::new())
        .await
        .unwrap();

    let by_type = manager.catalogue_key(1, None, &CatalogueFilters::new().with_content_type("course"));
    let general = manager.catalogue_key(1, None, &CatalogueFilters::new());
    assert_eq!(store.get(by_type.as_str()).await.unwrap().unwrap().ttl_secs, 3600);
    assert_eq!(store.get(general.as_str()).await.unwrap().unwrap().ttl_secs, 900);
}

// ============================================================================
// Content Item Tests
// ============================================================================

#[tokio::test]
async fn test_item_cold_then_warm() {
    let (manager, upstream, store, _) = mock_manager();

    let cold = manager.get_content_item(1, false).await.unwrap();
    assert_eq!(upstream.calls(), 1);
    assert!(store.get("content_item:1:v1").await.unwrap().is_some());

    let warm = manager.get_content_item(1, false).await.unwrap();
    assert_eq!(upstream.calls(), 1);
    assert_eq!(cold, warm);
}

#[tokio::test]
async fn test_item_not_found_is_upstream_error_and_not_cached() {
    let (manager, _, store, _) = mock_manager();

    let err = manager.get_content_item(999, false).await.unwrap_err();

    assert_eq!(err, CatalogueError::upstream(404, "Item not found"));
    assert!(store.get("content_item:999:v1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_item_from_list_shape() {
    let upstream = Arc::new(RecordingUpstream::new(
        200,
        json!({"items": [record(3, "First", "resource"), record(4, "Second", "video")]}),
    ));
    let manager = build_manager(
        CacheConfig::default(),
        Arc::new(HashMapStore::default()),
        upstream,
        Arc::new(RecordingDispatcher::default()),
    );

    let item = manager.get_content_item(3, false).await.unwrap();
    assert_eq!(item.fullname, "First");
    assert!(matches!(item.details, ContentDetails::Resource { .. }));
}

#[tokio::test]
async fn test_item_without_id_is_format_error() {
    let store = Arc::new(HashMapStore::default());
    let manager = build_manager(
        CacheConfig::default(),
        store.clone(),
        Arc::new(RecordingUpstream::new(200, json!({"name": "no id here"}))),
        Arc::new(RecordingDispatcher::default()),
    );

    let err = manager.get_content_item(5, false).await.unwrap_err();
    assert!(matches!(err, CatalogueError::Format(_)));
    assert!(store.get("content_item:5:v1").await.unwrap().is_none());
    assert!(store.is_empty().await);
}

// ============================================================================
// Staleness Tests
// ============================================================================

#[tokio::test]
async fn test_stale_item_hit_dispatches_exactly_once() {
    let (manager, upstream, store, dispatcher) = mock_manager();

    manager.get_content_item(4, false).await.unwrap();
    age_entry(store.as_ref(), "content_item:4:v1", 0.85).await;

    let item = manager.get_content_item(4, false).await.unwrap();

    assert_eq!(item.fullname, "Test Video");
    assert_eq!(upstream.calls(), 1);
    assert_eq!(dispatcher.tasks(), vec![RefreshTask::GetContentItem { id: 4 }]);
}

#[tokio::test]
async fn test_fresh_hit_does_not_dispatch() {
    let (manager, _, store, dispatcher) = mock_manager();

    manager.get_content_item(4, false).await.unwrap();
    age_entry(store.as_ref(), "content_item:4:v1", 0.79).await;
    manager.get_content_item(4, false).await.unwrap();

    manager
        .get_catalogue(1, None, CatalogueFilters::new())
        .await
        .unwrap();
    let key = manager.catalogue_key(1, None, &CatalogueFilters::new());
    age_entry(store.as_ref(), key.as_str(), 0.79).await;
    manager
        .get_catalogue(1, None, CatalogueFilters::new())
        .await
        .unwrap();

    assert!(dispatcher.tasks().is_empty());
}

#[tokio::test]
async fn test_miss_never_dispatches() {
    let (manager, _, _, dispatcher) = mock_manager();

    manager.get_content_item(1, false).await.unwrap();
    manager.get_content_item(2, true).await.unwrap();

    assert!(dispatcher.tasks().is_empty());
}

#[tokio::test]
async fn test_worker_refreshes_stale_entry() {
    let upstream = Arc::new(MockUpstreamClient::new());
    let store = Arc::new(HashMapStore::default());
    let manager = CatalogueCacheBuilder::new(CatalogueConfig::default())
        .store(store.clone())
        .upstream(upstream.clone())
        .build_with_worker()
        .unwrap();

    manager.get_content_item(1, false).await.unwrap();
    age_entry(store.as_ref(), "content_item:1:v1", 0.9).await;
    upstream
        .set_items(vec![record(1, "Updated Course", "course")])
        .await;

    // Stale hit still serves the cached data
    let stale = manager.get_content_item(1, false).await.unwrap();
    assert_eq!(stale.fullname, "Test Course");

    // Give the worker time to refresh the entry
    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

    assert_eq!(upstream.calls(), 2);
    let fresh = manager.get_content_item(1, false).await.unwrap();
    assert_eq!(fresh.fullname, "Updated Course");
    assert_eq!(upstream.calls(), 2);
}

#[tokio::test]
async fn test_worker_failure_does_not_affect_request() {
    let upstream = Arc::new(MockUpstreamClient::new());
    let store = Arc::new(HashMapStore::default());
    let manager = CatalogueCacheBuilder::new(CatalogueConfig::default())
        .store(store.clone())
        .upstream(upstream.clone())
        .build_with_worker()
        .unwrap();

    manager.get_content_item(5, false).await.unwrap();
    age_entry(store.as_ref(), "content_item:5:v1", 0.9).await;
    upstream.set_items(Vec::new()).await;

    let served = manager.get_content_item(5, false).await.unwrap();
    assert_eq!(served.fullname, "Test Page");

    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

    // The refresh hit a 404 and the bypass removed the entry
    assert_eq!(upstream.calls(), 2);
    assert!(store.get("content_item:5:v1").await.unwrap().is_none());
}

// ============================================================================
// Refresh Tests
// ============================================================================

#[tokio::test]
async fn test_refresh_item_replaces_stale_data() {
    let (manager, upstream, store, _) = mock_manager();
    upstream.set_items(vec![record(42, "Old Title", "page")]).await;

    manager.get_content_item(42, false).await.unwrap();
    let old_entry = store.get("content_item:42:v1").await.unwrap().unwrap();

    upstream.set_items(vec![record(42, "New Title", "page")]).await;
    assert!(manager.refresh_cache(Some(42), None).await);

    let new_entry = store.get("content_item:42:v1").await.unwrap().unwrap();
    assert_ne!(old_entry.payload, new_entry.payload);

    let item = manager.get_content_item(42, false).await.unwrap();
    assert_eq!(item.fullname, "New Title");
    assert_eq!(upstream.calls(), 2);
}

#[tokio::test]
async fn test_refresh_item_failure_still_returns_true() {
    let (manager, _, store, _) = mock_manager();

    assert!(manager.refresh_cache(Some(999), None).await);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_refresh_with_zero_id_sweeps_instead_of_fetching_item() {
    let upstream = Arc::new(RecordingUpstream::new(200, json!({"items": []})));
    let manager = build_manager(
        CacheConfig::default(),
        Arc::new(HashMapStore::default()),
        upstream.clone(),
        Arc::new(RecordingDispatcher::default()),
    );

    assert!(manager.refresh_cache(Some(0), None).await);

    let queries = upstream.queries.lock().unwrap();
    assert_eq!(queries.len(), 8);
    assert!(
        queries
            .iter()
            .all(|query| query.iter().all(|(k, _)| k != "contentId"))
    );
}

#[tokio::test]
async fn test_refresh_content_type_also_refreshes_general_catalogue() {
    let upstream = Arc::new(RecordingUpstream::new(200, json!({"items": []})));
    let manager = build_manager(
        CacheConfig::default(),
        Arc::new(HashMapStore::default()),
        upstream.clone(),
        Arc::new(RecordingDispatcher::default()),
    );

    assert!(manager.refresh_cache(None, Some("video")).await);

    let queries = upstream.queries.lock().unwrap();
    assert_eq!(queries.len(), 2);
    assert!(queries[0].contains(&("contentType".to_string(), "video".to_string())));
    assert!(queries[1].iter().all(|(k, _)| k != "contentType"));
}

#[tokio::test]
async fn test_refresh_everything_sweeps_all_types() {
    let upstream = Arc::new(RecordingUpstream::new(500, json!({"error": "down"})));
    let manager = build_manager(
        CacheConfig::default(),
        Arc::new(HashMapStore::default()),
        upstream.clone(),
        Arc::new(RecordingDispatcher::default()),
    );

    // Every fetch fails, the sweep still reports success
    assert!(manager.refresh_cache(None, None).await);

    let queries = upstream.queries.lock().unwrap();
    assert_eq!(queries.len(), 8);
    assert!(queries[0].iter().all(|(k, _)| k != "contentType"));
    assert!(queries[2].contains(&("contentType".to_string(), "live learning".to_string())));
}

// ============================================================================
// Store Failure Tests
// ============================================================================

#[tokio::test]
async fn test_failing_store_falls_through_to_upstream() {
    let store = Arc::new(FailingStore {
        calls: AtomicUsize::new(0),
    });
    let upstream = Arc::new(MockUpstreamClient::new());
    let manager = build_manager(
        CacheConfig::default(),
        store.clone(),
        upstream.clone(),
        Arc::new(RecordingDispatcher::default()),
    );

    let item = manager.get_content_item(3, false).await.unwrap();
    assert_eq!(item.content_type, "resource");

    let page = manager
        .get_catalogue(1, None, CatalogueFilters::new().no_cache(true))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 5);

    assert_eq!(upstream.calls(), 2);
    assert!(store.calls.load(Ordering::SeqCst) >= 3);
}

// ============================================================================
// Store Backend Tests
// ============================================================================

#[tokio::test]
async fn test_moka_store_backs_manager() {
    let upstream = Arc::new(MockUpstreamClient::new());
    let manager = build_manager(
        CacheConfig::default(),
        Arc::new(MokaStore::default()),
        upstream.clone(),
        Arc::new(RecordingDispatcher::default()),
    );

    manager.get_content_item(2, false).await.unwrap();
    let item = manager.get_content_item(2, false).await.unwrap();

    assert_eq!(item.fullname, "Test Live Learning");
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn test_metrics_store_records_manager_traffic() {
    let sink = Arc::new(RecordingSink::default());
    let store = Arc::new(MetricsStore::new(
        Arc::new(HashMapStore::default()),
        sink.clone(),
    ));
    let upstream = Arc::new(MockUpstreamClient::new());
    let manager = build_manager(
        CacheConfig::default(),
        store,
        upstream.clone(),
        Arc::new(RecordingDispatcher::default()),
    );

    manager.get_content_item(2, false).await.unwrap();
    manager.get_content_item(2, false).await.unwrap();
    assert_eq!(upstream.calls(), 1);

    let metrics = sink.metrics.lock().unwrap();
    match &metrics[..] {
        [
            CacheMetric::Read { hit: false, .. },
            CacheMetric::Write { key, ttl_secs, tier, .. },
            CacheMetric::Read {
                hit: true,
                kind: Some(EntryKind::Item),
                ..
            },
        ] => {
            assert_eq!(key, "content_item:2:v1");
            assert_eq!(*ttl_secs, 900);
            assert_eq!(tier, "hashmap");
        }
        other => panic!("unexpected metrics: {:?}", other),
    }
}

#[tokio::test]
async fn test_tiered_store_l2_hit_populates_l1() {
    let l1: Arc<dyn Store> = Arc::new(HashMapStore::default());
    let l2: Arc<dyn Store> = Arc::new(MokaStore::default());
    let tiered: Arc<dyn Store> = Arc::new(TieredStore::from_stores(vec![l1.clone(), l2.clone()]));
    let upstream = Arc::new(MockUpstreamClient::new());

    let writer = build_manager(
        CacheConfig::default(),
        l2.clone(),
        upstream.clone(),
        Arc::new(RecordingDispatcher::default()),
    );
    writer.get_content_item(1, false).await.unwrap();

    let reader = build_manager(
        CacheConfig::default(),
        tiered,
        upstream.clone(),
        Arc::new(RecordingDispatcher::default()),
    );
    reader.get_content_item(1, false).await.unwrap();

    // Give background task time to populate L1
    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

    let backfilled = l1.get("content_item:1:v1").await.unwrap().unwrap();
    assert_eq!(backfilled.kind, EntryKind::Item);
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
#[ignore = "requires a local Redis"]
async fn test_redis_store_backs_manager() {
    let store: Arc<dyn Store> = Arc::new(create_redis_store().await);
    store.delete("content_item:3:v1").await.unwrap();
    let upstream = Arc::new(MockUpstreamClient::new());
    let manager = build_manager(
        CacheConfig::default(),
        store.clone(),
        upstream.clone(),
        Arc::new(RecordingDispatcher::default()),
    );

    let cold = manager.get_content_item(3, false).await.unwrap();
    let warm = manager.get_content_item(3, false).await.unwrap();

    assert_eq!(cold, warm);
    assert_eq!(upstream.calls(), 1);
    assert!(store.has("content_item:3:v1").await.unwrap());

    manager.refresh_cache(Some(3), None).await;
    assert_eq!(upstream.calls(), 2);
}
