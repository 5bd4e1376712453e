//! Walks through the catalogue cache against the in-process mock API.
//!
//! Reads `ACORN_*` settings from the environment (or a `.env` file) and swaps
//! the HTTP client for `MockUpstreamClient`, so no network access is needed.
//!
//! ```text
//! RUST_LOG=acorn_catalogue_cache=debug cargo run --example catalogue_proxy
//! ```

use std::sync::Arc;
use std::time::Duration;

use acorn_catalogue_cache::{
    CatalogueCacheBuilder, CatalogueConfig, CatalogueFilters, MetricsSink, MetricsStore,
    MockUpstreamClient, MokaStore, TracingSink,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Store timings show up with RUST_LOG=acorn_catalogue_cache::metrics=debug
    let sink = Arc::new(TracingSink);
    let store = Arc::new(MetricsStore::new(
        Arc::new(MokaStore::default()),
        sink.clone(),
    ));

    let upstream = Arc::new(MockUpstreamClient::new());
    let manager = CatalogueCacheBuilder::new(CatalogueConfig::from_env())
        .store(store)
        .upstream(upstream.clone())
        .build_with_worker()?;

    // Cold then warm: only the first call reaches the API
    let page = manager.get_catalogue(1, None, CatalogueFilters::new()).await?;
    let _ = manager.get_catalogue(1, None, CatalogueFilters::new()).await?;
    println!(
        "catalogue page 1: {} of {} items, upstream calls: {}",
        page.items.len(),
        page.metadata.total_items,
        upstream.calls()
    );
    for item in &page.items {
        println!("  #{} {} ({})", item.id, item.fullname, item.content_type);
    }

    let item = manager.get_content_item(1, false).await?;
    println!("item 1: {} -> {:?}", item.fullname, item.details);

    let videos = manager.get_content_by_type("video", 1, None, false).await?;
    println!("videos: {}", videos.items.len());

    match manager.get_content_item(999, false).await {
        Ok(item) => println!("unexpected item: {}", item.fullname),
        Err(e) => println!("item 999: {} (status {})", e, e.status_code()),
    }

    // Skip the cache for one request; the fresh result replaces the entry
    let bypassed = manager
        .get_catalogue(1, None, CatalogueFilters::new().no_cache(true))
        .await?;
    println!("bypassed page: {} items", bypassed.items.len());

    let refreshed = manager.refresh_cache(None, Some("course")).await;
    println!("refreshed course listings: {}", refreshed);

    // Give any queued background refresh a moment to finish before exiting
    tokio::time::sleep(Duration::from_millis(100)).await;
    println!("total upstream calls: {}", upstream.calls());

    sink.flush().await.map_err(|e| e as Box<dyn std::error::Error>)?;

    Ok(())
}
