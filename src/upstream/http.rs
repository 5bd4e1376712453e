use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use super::{UpstreamClient, UpstreamResponse};
use crate::config::RetryConfig;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// `reqwest` transport with retry and exponential backoff.
///
/// Transport errors, `5xx` and `429` answers are retried up to `retry.times`
/// times, sleeping `sleep_ms * 2^(n - 1)` before the n-th retry.
#[derive(Clone)]
pub struct HttpUpstreamClient {
    client: reqwest::Client,
    retry: RetryConfig,
}

impl HttpUpstreamClient {
    pub fn new(retry: RetryConfig) -> Result<Self, reqwest::Error> {
        let mut default_headers = reqwest::header::HeaderMap::new();
        default_headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        default_headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .default_headers(default_headers)
            .build()?;

        Ok(HttpUpstreamClient { client, retry })
    }

    /// Wrap an already configured client.
    pub fn with_client(client: reqwest::Client, retry: RetryConfig) -> Self {
        HttpUpstreamClient { client, retry }
    }

    async fn send_once(
        &self,
        url: &str,
        query: &[(String, String)],
        headers: &HashMap<String, String>,
    ) -> Result<UpstreamResponse, reqwest::Error> {
        let mut request = self.client.get(url).query(query);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        tracing::debug!(method = "GET", url = %url, "API request");
        let response = request.send().await?;

        let status = response.status().as_u16();
        let response_headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let text = response.text().await?;
        tracing::debug!(status, bytes = text.len(), "API response");

        Ok(UpstreamResponse {
            status,
            body: parse_body(&text),
            headers: response_headers,
        })
    }

    fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u64 << retry.saturating_sub(1).min(16);
        Duration::from_millis(self.retry.sleep_ms.saturating_mul(factor))
    }
}

fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn is_retryable(status: u16) -> bool {
    status >= 500 || status == 429
}

#[async_trait]
impl UpstreamClient for HttpUpstreamClient {
    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        headers: &HashMap<String, String>,
    ) -> UpstreamResponse {
        let mut retries = 0;
        loop {
            let result = self.send_once(url, query, headers).await;

            let reason = match &result {
                Ok(response) if !is_retryable(response.status) => None,
                Ok(response) => Some(format!("status {}", response.status)),
                Err(e) => Some(e.to_string()),
            };
            let Some(reason) = reason else {
                return into_response(result);
            };

            if retries >= self.retry.times {
                tracing::error!(url = %url, retries, reason = %reason, "API request failed");
                return into_response(result);
            }

            retries += 1;
            let delay = self.backoff(retries);
            tracing::warn!(
                url = %url,
                retries,
                delay_ms = delay.as_millis() as u64,
                reason = %reason,
                "API request failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

fn into_response(result: Result<UpstreamResponse, reqwest::Error>) -> UpstreamResponse {
    result.unwrap_or_else(|e| UpstreamResponse::transport_error(e.to_string()))
}
