//! Access to the ACORN catalogue API.
//!
//! [`UpstreamClient`] is the transport seam: it performs a GET and always answers
//! with a status/body pair. [`AcornApi`] builds catalogue requests on top of it
//! and turns non-success answers into [`CatalogueError::Upstream`].

pub mod http;
pub mod mock;

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::config::AcornApiConfig;
use crate::error::CatalogueError;

pub use http::HttpUpstreamClient;
pub use mock::MockUpstreamClient;

const DEFAULT_ERROR_MESSAGE: &str = "Failed to fetch external catalogue";

/// Status, parsed body and headers of an upstream answer.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Value,
    pub headers: HashMap<String, String>,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: Value) -> Self {
        UpstreamResponse {
            status,
            body,
            headers: HashMap::new(),
        }
    }

    /// Answer used when the request never produced an HTTP response.
    pub fn transport_error(message: impl Into<String>) -> Self {
        UpstreamResponse::new(500, json!({ "error": message.into() }))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// An HTTP GET transport.
///
/// Implementations handle their own retries. Failures are reported through the
/// returned status, never as a panic.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        headers: &HashMap<String, String>,
    ) -> UpstreamResponse;
}

/// Client for the `external_catalogue` endpoint.
#[derive(Clone)]
pub struct AcornApi {
    client: Arc<dyn UpstreamClient>,
    config: AcornApiConfig,
}

impl AcornApi {
    pub fn new(client: Arc<dyn UpstreamClient>, config: AcornApiConfig) -> Self {
        AcornApi { client, config }
    }

    pub fn config(&self) -> &AcornApiConfig {
        &self.config
    }

    /// Full URL of the catalogue endpoint.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/local/acorn_coursemanagement/index.php/api/{}/external_catalogue/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.version,
            self.config.tenancy_id
        )
    }

    /// Query the catalogue and return the response body.
    ///
    /// `page` defaults to 1 and `perPage` to the configured page size.
    pub async fn external_catalogue(
        &self,
        params: &BTreeMap<String, Value>,
    ) -> Result<Value, CatalogueError> {
        let mut params = params.clone();
        if params.get("page").is_none_or(Value::is_null) {
            params.insert("page".to_string(), json!(1));
        }
        if params.get("perPage").is_none_or(Value::is_null) {
            params.insert("perPage".to_string(), json!(self.config.per_page));
        }

        let endpoint = self.endpoint();
        let query = to_query(&params);
        let headers = self.headers();

        tracing::info!(endpoint = %endpoint, params = ?query, "Fetching external catalogue");
        let response = self.client.get(&endpoint, &query, &headers).await;

        if !response.is_success() {
            let message = response
                .body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_ERROR_MESSAGE)
                .to_string();
            tracing::error!(
                endpoint = %endpoint,
                status = response.status,
                error = %message,
                "Failed to fetch external catalogue"
            );
            return Err(CatalogueError::upstream(response.status, message));
        }

        tracing::debug!(status = response.status, "External catalogue response");
        Ok(response.body)
    }

    pub async fn content_by_id(&self, id: u64) -> Result<Value, CatalogueError> {
        let mut params = BTreeMap::new();
        params.insert("contentId".to_string(), json!(id));
        self.external_catalogue(&params).await
    }

    fn headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        if let Some(token) = self.config.token.as_deref().filter(|t| !t.is_empty()) {
            headers.insert("Authorization".to_string(), format!("Bearer {}", token));
        }
        headers
    }
}

/// Flatten JSON parameters into query pairs. Nulls are dropped and booleans
/// become `1`/`0`.
pub fn to_query(params: &BTreeMap<String, Value>) -> Vec<(String, String)> {
    params
        .iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::Null => return None,
                Value::Bool(true) => "1".to_string(),
                Value::Bool(false) => "0".to_string(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((key.clone(), value))
        })
        .collect()
}
