//! Background refresh of stale cache entries.
//!
//! The manager hands a [`RefreshTask`] to a [`RefreshDispatcher`] and moves on.
//! With a [`ChannelDispatcher`] the task travels over an unbounded channel to a
//! [`RefreshWorker`], which re-runs the original lookup with the cache bypassed.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::catalogue::CatalogueFilters;
use crate::error::CatalogueError;
use crate::manager::CatalogueCacheManager;

/// A deferred re-fetch. Serializes as `{"operation": ..., "params": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "operation",
    content = "params",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum RefreshTask {
    GetCatalogue {
        page: u32,
        per_page: Option<u32>,
        #[serde(default)]
        filters: BTreeMap<String, Value>,
    },
    GetContentItem {
        id: u64,
    },
    GetContentByType {
        content_type: String,
        page: u32,
        per_page: Option<u32>,
    },
}

impl RefreshTask {
    pub fn operation_name(&self) -> &'static str {
        match self {
            RefreshTask::GetCatalogue { .. } => "getCatalogue",
            RefreshTask::GetContentItem { .. } => "getContentItem",
            RefreshTask::GetContentByType { .. } => "getContentByType",
        }
    }

    /// Identifies tasks that would refresh the same cache entry: the key of
    /// that entry, with `per_page` resolved the way `manager` resolves it.
    pub fn dedupe_key(&self, manager: &CatalogueCacheManager) -> String {
        let key = match self {
            RefreshTask::GetCatalogue {
                page,
                per_page,
                filters,
            } => {
                let filters = CatalogueFilters {
                    fields: filters.clone(),
                    no_cache: false,
                };
                manager.catalogue_key(*page, *per_page, &filters)
            }
            RefreshTask::GetContentItem { id } => manager.item_key(*id),
            RefreshTask::GetContentByType {
                content_type,
                page,
                per_page,
            } => {
                let filters = CatalogueFilters::new().with_content_type(content_type.as_str());
                manager.catalogue_key(*page, *per_page, &filters)
            }
        };
        key.as_str().to_string()
    }

    /// Run the lookup this task describes with the cache bypassed.
    pub async fn execute(&self, manager: &CatalogueCacheManager) -> Result<(), CatalogueError> {
        match self {
            RefreshTask::GetCatalogue {
                page,
                per_page,
                filters,
            } => {
                let filters = CatalogueFilters {
                    fields: filters.clone(),
                    no_cache: true,
                };
                manager.get_catalogue(*page, *per_page, filters).await?;
            }
            RefreshTask::GetContentItem { id } => {
                manager.get_content_item(*id, true).await?;
            }
            RefreshTask::GetContentByType {
                content_type,
                page,
                per_page,
            } => {
                manager
                    .get_content_by_type(content_type, *page, *per_page, true)
                    .await?;
            }
        }
        Ok(())
    }
}

/// Accepts refresh tasks without blocking the caller.
pub trait RefreshDispatcher: Send + Sync {
    fn enqueue(&self, task: RefreshTask);
}

/// Drops every task. Used when no worker is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDispatcher;

impl RefreshDispatcher for NoopDispatcher {
    fn enqueue(&self, task: RefreshTask) {
        tracing::debug!(
            operation = task.operation_name(),
            "No refresh worker attached, dropping task"
        );
    }
}

/// Sends tasks over an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelDispatcher {
    sender: mpsc::UnboundedSender<RefreshTask>,
}

impl ChannelDispatcher {
    pub fn new(sender: mpsc::UnboundedSender<RefreshTask>) -> Self {
        ChannelDispatcher { sender }
    }

    /// Create a dispatcher and the receiver a [`RefreshWorker`] consumes.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RefreshTask>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (ChannelDispatcher::new(sender), receiver)
    }
}

impl RefreshDispatcher for ChannelDispatcher {
    fn enqueue(&self, task: RefreshTask) {
        if let Err(mpsc::error::SendError(task)) = self.sender.send(task) {
            tracing::warn!(
                operation = task.operation_name(),
                "Refresh queue is closed, dropping task"
            );
        }
    }
}

/// Consumes refresh tasks and runs each one on its own tokio task.
///
/// A task whose [`RefreshTask::dedupe_key`] is already running is skipped. The
/// worker holds only a weak reference to the manager and stops once the
/// manager is dropped or the channel closes.
pub struct RefreshWorker;

impl RefreshWorker {
    pub fn spawn(
        mut receiver: mpsc::UnboundedReceiver<RefreshTask>,
        manager: Weak<CatalogueCacheManager>,
    ) -> JoinHandle<()> {
        let in_flight: Arc<Mutex<HashSet<String>>> = Arc::new(Mutex::new(HashSet::new()));

        tokio::spawn(async move {
            while let Some(task) = receiver.recv().await {
                let Some(manager) = manager.upgrade() else {
                    tracing::debug!("Cache manager dropped, stopping refresh worker");
                    break;
                };

                let dedupe_key = task.dedupe_key(&manager);
                if !in_flight.lock().await.insert(dedupe_key.clone()) {
                    tracing::debug!(
                        operation = task.operation_name(),
                        key = %dedupe_key,
                        "Refresh already in flight, skipping"
                    );
                    continue;
                }

                let in_flight = Arc::clone(&in_flight);
                tokio::spawn(async move {
                    tracing::info!(
                        operation = task.operation_name(),
                        task = ?task,
                        "Refreshing content cache in background"
                    );

                    match task.execute(&manager).await {
                        Ok(()) => tracing::info!(
                            operation = task.operation_name(),
                            "Cache refreshed in background"
                        ),
                        Err(e) => tracing::error!(
                            operation = task.operation_name(),
                            task = ?task,
                            error = %e,
                            "Failed to refresh cache in background"
                        ),
                    }

                    in_flight.lock().await.remove(&dedupe_key);
                });
            }
        })
    }
}
