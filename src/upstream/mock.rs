use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::{UpstreamClient, UpstreamResponse};

/// An in-process catalogue answering like the `external_catalogue` endpoint.
///
/// `contentId` selects one record (404 `Item not found` when absent),
/// `contentType` filters the list and `page`/`perPage` paginate it. Every call is
/// counted, so tests can assert how often the upstream was reached.
pub struct MockUpstreamClient {
    items: RwLock<Vec<Value>>,
    calls: AtomicUsize,
}

impl Default for MockUpstreamClient {
    fn default() -> Self {
        MockUpstreamClient::with_items(fixture_items())
    }
}

impl MockUpstreamClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<Value>) -> Self {
        MockUpstreamClient {
            items: RwLock::new(items),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of requests served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Replace the catalogue contents.
    pub async fn set_items(&self, items: Vec<Value>) {
        *self.items.write().await = items;
    }

    async fn answer(&self, query: &HashMap<&str, &str>) -> UpstreamResponse {
        let items = self.items.read().await;

        if let Some(raw_id) = query.get("contentId") {
            let found = raw_id
                .parse::<u64>()
                .ok()
                .and_then(|id| items.iter().find(|item| record_id(item) == Some(id)));
            return match found {
                Some(item) => UpstreamResponse::new(200, item.clone()),
                None => UpstreamResponse::new(404, json!({ "error": "Item not found" })),
            };
        }

        let matching: Vec<&Value> = match query.get("contentType") {
            Some(content_type) => items
                .iter()
                .filter(|item| {
                    item.get("contenttype")
                        .and_then(Value::as_str)
                        .is_some_and(|t| t.eq_ignore_ascii_case(content_type))
                })
                .collect(),
            None => items.iter().collect(),
        };

        let page: usize = query
            .get("page")
            .and_then(|p| p.parse().ok())
            .filter(|p| *p > 0)
            .unwrap_or(1);
        let per_page: usize = query
            .get("perPage")
            .and_then(|p| p.parse().ok())
            .filter(|p| *p > 0)
            .unwrap_or(10);

        let total_items = matching.len();
        let total_pages = total_items.div_ceil(per_page);
        let page_items: Vec<Value> = matching
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .cloned()
            .collect();

        UpstreamResponse::new(
            200,
            json!({
                "items": page_items,
                "total_items": total_items,
                "current_page": page,
                "per_page": per_page,
                "total_pages": total_pages,
                "next_page_url": (page < total_pages).then(|| format!("?page={}", page + 1)),
                "previous_page_url": (page > 1).then(|| format!("?page={}", page - 1)),
            }),
        )
    }
}

fn record_id(item: &Value) -> Option<u64> {
    item.get("contentid")
        .or_else(|| item.get("id"))
        .and_then(Value::as_u64)
}

#[async_trait]
impl UpstreamClient for MockUpstreamClient {
    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        _headers: &HashMap<String, String>,
    ) -> UpstreamResponse {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tracing::info!(url = %url, params = ?query, "Using mock external catalogue");

        let query: HashMap<&str, &str> = query
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        self.answer(&query).await
    }
}

/// Five development records, one per common content type.
pub fn fixture_items() -> Vec<Value> {
    vec![
        json!({
            "contentid": 1,
            "fullname": "Test Course",
            "summary": "This is a test course for development",
            "imageurl": "https://picsum.photos/id/1/800/600",
            "contenttype": "course",
            "url": "https://example.com/course/1",
            "cost": 0,
            "duration": "2 hours",
            "timecreated": "2023-01-01",
            "timemodified": "2023-01-02",
            "contentstatus": "active",
            "topics": ["Development", "Testing"],
            "competencies": ["Development Skills", "Testing Skills"],
        }),
        json!({
            "contentid": 2,
            "fullname": "Test Live Learning",
            "summary": "This is a test live learning session for development",
            "imageurl": "https://picsum.photos/id/2/800/600",
            "contenttype": "live learning",
            "url": "https://example.com/live/2",
            "cost": 100,
            "duration": "1 day",
            "timecreated": "2023-01-01",
            "timemodified": "2023-01-02",
            "contentstatus": "active",
            "start_time": "2023-05-01 09:00:00",
            "end_time": "2023-05-01 17:00:00",
            "location": "Sydney",
            "facilitator": "Jane Doe",
            "max_attendees": 20,
        }),
        json!({
            "contentid": 3,
            "fullname": "Test Resource",
            "summary": "This is a test resource for development",
            "imageurl": "https://picsum.photos/id/3/800/600",
            "contenttype": "resource",
            "url": "https://example.com/resource/3",
            "cost": 0,
            "duration": "30 minutes",
            "timecreated": "2023-01-01",
            "timemodified": "2023-01-02",
            "contentstatus": "active",
            "resource_type": "pdf",
            "file_url": "https://example.com/files/resource.pdf",
        }),
        json!({
            "contentid": 4,
            "fullname": "Test Video",
            "summary": "This is a test video for development",
            "imageurl": "https://picsum.photos/id/4/800/600",
            "contenttype": "video",
            "url": "https://example.com/video/4",
            "cost": 0,
            "duration": "45 minutes",
            "timecreated": "2023-01-01",
            "timemodified": "2023-01-02",
            "contentstatus": "active",
            "video_url": "https://example.com/videos/test.mp4",
            "video_duration": 2700,
            "video_provider": "YouTube",
        }),
        json!({
            "contentid": 5,
            "fullname": "Test Page",
            "summary": "This is a test page for development",
            "imageurl": "https://picsum.photos/id/5/800/600",
            "contenttype": "page",
            "url": "https://example.com/page/5",
            "cost": 0,
            "duration": "15 minutes",
            "timecreated": "2023-01-01",
            "timemodified": "2023-01-02",
            "contentstatus": "active",
            "content": "<p>This is a test page content with <strong>HTML</strong>.</p>",
        }),
    ]
}
