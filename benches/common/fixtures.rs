use acorn_catalogue_cache::{MockUpstreamClient, UpstreamClient, UpstreamResponse};
use async_trait::async_trait;
use rand::Rng;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const CONTENT_TYPES: [&str; 5] = ["course", "live learning", "resource", "video", "page"];

/// Generate `count` catalogue records cycling through the common content types.
pub fn catalogue_records(count: usize) -> Vec<Value> {
    (1..=count)
        .map(|id| {
            let content_type = CONTENT_TYPES[id % CONTENT_TYPES.len()];
            json!({
                "contentid": id,
                "fullname": format!("Content {}", id),
                "summary": format!("Summary for content {}", id),
                "imageurl": format!("https://picsum.photos/id/{}/800/600", id % 100),
                "contenttype": content_type,
                "url": format!("https://example.com/content/{}", id),
                "cost": (id % 7) * 10,
                "duration": "1 hour",
                "timecreated": "2023-01-01",
                "timemodified": "2023-01-02",
                "contentstatus": "active",
                "topics": ["Benchmarking"],
                "video_duration": 600,
            })
        })
        .collect()
}

/// Mock catalogue API with configurable latency
pub struct SlowUpstream {
    inner: MockUpstreamClient,
    latency_ms: u64,
    request_count: AtomicUsize,
}

impl SlowUpstream {
    pub fn new(catalogue_size: usize, latency_ms: u64) -> Self {
        Self {
            inner: MockUpstreamClient::with_items(catalogue_records(catalogue_size)),
            latency_ms,
            request_count: AtomicUsize::new(0),
        }
    }

    #[allow(dead_code)]
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl UpstreamClient for SlowUpstream {
    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        headers: &HashMap<String, String>,
    ) -> UpstreamResponse {
        self.request_count.fetch_add(1, Ordering::Relaxed);

        // Simulate network latency
        tokio::time::sleep(Duration::from_millis(self.latency_ms)).await;

        self.inner.get(url, query, headers).await
    }
}

/// Generate content ids for different workload patterns
pub struct IdGenerator {
    num_ids: u64,
}

impl IdGenerator {
    pub fn new(num_ids: usize) -> Self {
        Self {
            num_ids: num_ids as u64,
        }
    }

    /// Sequential ids (for cold cache tests)
    pub fn sequential(&self) -> Vec<u64> {
        (1..=self.num_ids).collect()
    }

    /// Ids for a mixed workload (some hits, some misses)
    pub fn mixed(&self, hit_ratio: f64) -> Vec<u64> {
        let mut rng = rand::thread_rng();
        let hot_ids = ((self.num_ids as f64 * hit_ratio) as u64).max(1);

        (0..1000)
            .map(|_| {
                if rng.gen_bool(hit_ratio) || hot_ids >= self.num_ids {
                    rng.gen_range(1..=hot_ids)
                } else {
                    rng.gen_range(hot_ids + 1..=self.num_ids)
                }
            })
            .collect()
    }
}
