//! Configuration for the catalogue cache.
//!
//! Every section implements `Default` and `serde::Deserialize`, so it can be
//! embedded in a larger application config. [`CatalogueConfig::from_env`] reads
//! the `ACORN_*` environment variables and falls back to the defaults for
//! anything that is unset or does not parse.

use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::str::FromStr;

use crate::error::ConfigError;

/// Connection settings for the ACORN catalogue API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AcornApiConfig {
    pub base_url: String,
    pub tenancy_id: String,
    /// Bearer token. Requests are sent unauthenticated when absent.
    pub token: Option<String>,
    pub version: String,
    pub per_page: u32,
}

impl Default for AcornApiConfig {
    fn default() -> Self {
        AcornApiConfig {
            base_url: "https://staging.acornlms.com".to_string(),
            tenancy_id: "3".to_string(),
            token: None,
            version: "1.1".to_string(),
            per_page: 10,
        }
    }
}

/// Stale-while-revalidate settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackgroundRefreshConfig {
    pub enabled: bool,
    /// Fraction of the TTL after which a cache hit schedules a refresh. In (0, 1].
    pub threshold: f64,
}

impl Default for BackgroundRefreshConfig {
    fn default() -> Self {
        BackgroundRefreshConfig {
            enabled: true,
            threshold: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Default TTL in seconds.
    pub ttl: u64,
    /// Suffix of every cache key. Bump it to invalidate everything at once.
    pub version: String,
    /// TTL overrides keyed by content type.
    pub content_types: HashMap<String, u64>,
    pub background_refresh: BackgroundRefreshConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            enabled: true,
            ttl: 900,
            version: "v1".to_string(),
            content_types: HashMap::new(),
            background_refresh: BackgroundRefreshConfig::default(),
        }
    }
}

/// Retry settings for the HTTP upstream client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub times: u32,
    /// Base backoff in milliseconds, doubled after each failed attempt.
    pub sleep_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            times: 3,
            sleep_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CatalogueConfig {
    pub api: AcornApiConfig,
    pub cache: CacheConfig,
    pub retry: RetryConfig,
}

impl CatalogueConfig {
    /// Load configuration from `ACORN_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = CatalogueConfig::default();

        let api = AcornApiConfig {
            base_url: env_or("ACORN_API_BASE_URL", defaults.api.base_url),
            tenancy_id: env_or("ACORN_API_TENANCY_ID", defaults.api.tenancy_id),
            token: env::var("ACORN_API_TOKEN").ok().filter(|t| !t.is_empty()),
            version: env_or("ACORN_API_VERSION", defaults.api.version),
            per_page: env_or("ACORN_API_PER_PAGE", defaults.api.per_page),
        };

        let cache = CacheConfig {
            enabled: env_flag("ACORN_CACHE_ENABLED", defaults.cache.enabled),
            ttl: env_or("ACORN_CACHE_TTL", defaults.cache.ttl),
            version: env_or("ACORN_CACHE_VERSION", defaults.cache.version),
            content_types: env::var("ACORN_CACHE_CONTENT_TYPE_TTLS")
                .map(|raw| parse_ttl_overrides(&raw))
                .unwrap_or_default(),
            background_refresh: BackgroundRefreshConfig {
                enabled: env_flag(
                    "ACORN_BACKGROUND_REFRESH_ENABLED",
                    defaults.cache.background_refresh.enabled,
                ),
                threshold: env_or(
                    "ACORN_BACKGROUND_REFRESH_THRESHOLD",
                    defaults.cache.background_refresh.threshold,
                ),
            },
        };

        let retry = RetryConfig {
            times: env_or("ACORN_RETRY_TIMES", defaults.retry.times),
            sleep_ms: env_or("ACORN_RETRY_SLEEP", defaults.retry.sleep_ms),
        };

        CatalogueConfig { api, cache, retry }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.cache.background_refresh.threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigError::invalid(
                "cache.background_refresh.threshold",
                threshold,
                "must be in (0, 1]",
            ));
        }
        if self.cache.version.trim().is_empty() {
            return Err(ConfigError::invalid(
                "cache.version",
                &self.cache.version,
                "must not be empty",
            ));
        }
        if self.api.per_page == 0 {
            return Err(ConfigError::invalid("api.per_page", 0, "must be at least 1"));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::invalid(
                "api.base_url",
                &self.api.base_url,
                "must not be empty",
            ));
        }
        Ok(())
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|s| parse_flag(&s))
        .unwrap_or(default)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse `course=3600,video=1800`. Malformed pairs are skipped.
fn parse_ttl_overrides(raw: &str) -> HashMap<String, u64> {
    raw.split(',')
        .filter_map(|pair| {
            let (name, ttl) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), ttl.trim().parse().ok()?))
        })
        .collect()
}

/// TTL lookup by content type.
#[derive(Debug, Clone, PartialEq)]
pub struct TtlPolicy {
    default_ttl: u64,
    overrides: HashMap<String, u64>,
}

impl TtlPolicy {
    pub fn new(default_ttl: u64, overrides: HashMap<String, u64>) -> Self {
        let overrides = overrides
            .into_iter()
            .map(|(name, ttl)| (name.to_lowercase(), ttl))
            .collect();
        TtlPolicy {
            default_ttl,
            overrides,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        TtlPolicy::new(config.ttl, config.content_types.clone())
    }

    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    /// TTL in seconds for `content_type`, or the default when there is no override.
    pub fn resolve(&self, content_type: Option<&str>) -> u64 {
        content_type
            .and_then(|t| self.overrides.get(&t.to_lowercase()))
            .copied()
            .unwrap_or(self.default_ttl)
    }
}
