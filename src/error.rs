/// Error type for cache store operations.
///
/// Store errors never reach callers of the catalogue manager: a failing store is
/// logged and treated as a miss, so the request falls through to the upstream API.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// A cache operation failed.
    #[error("[{tier}] cache error for key '{key}': {message}")]
    Operation {
        tier: String,
        key: String,
        message: String,
    },
}

impl CacheError {
    /// Create a new operation error.
    pub fn operation(
        tier: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        CacheError::Operation {
            tier: tier.into(),
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Error returned by catalogue and content-item lookups.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogueError {
    /// The upstream API answered with a non-success status, or could not be reached.
    #[error("upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },
    /// The upstream body matched none of the recognized response shapes.
    #[error("unexpected upstream response format: {0}")]
    Format(String),
}

impl CatalogueError {
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        CatalogueError::Upstream {
            status,
            message: message.into(),
        }
    }

    /// HTTP-equivalent status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            CatalogueError::Upstream { status, .. } => *status,
            CatalogueError::Format(_) => 500,
        }
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {field}: {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
    /// The HTTP client for the catalogue API could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

impl ConfigError {
    pub(crate) fn invalid(
        field: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
