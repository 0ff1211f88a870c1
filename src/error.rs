//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Error returned by a configured loader, passed through to the caller untouched.
pub type LoaderError = Box<dyn std::error::Error + Send + Sync + 'static>;

// == Store Error Enum ==
/// Errors raised by the backing store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Error reported by the Redis client
    #[error(transparent)]
    Redis(#[from] redis::RedisError),

    /// The store did not answer within the configured timeout
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Convenience Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The cache (or the connection it shares) has been closed
    #[error("cache is closed")]
    Closed,

    /// Pop found nothing under the key
    #[error("key not found: {key}")]
    KeyNotFound { key: String },

    /// The value could not be encoded or decoded
    #[error("invalid cache value: {0}")]
    InvalidCacheValue(#[source] serde_json::Error),

    /// The loader produced a value that does not fit the cache type
    #[error("invalid value from loader: {value}")]
    InvalidLoaderValue {
        value: serde_json::Value,
        #[source]
        source: serde_json::Error,
    },

    /// The connection string could not be parsed
    #[error("invalid connection string: {0}")]
    InvalidConnectionString(String),

    /// The cache name is empty
    #[error("invalid cache name: {0:?}")]
    InvalidCacheName(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Backing store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Loader failure
    #[error(transparent)]
    Loader(LoaderError),
}

impl CacheError {
    /// Returns true when the error is a store timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            CacheError::Store(StoreError::Timeout(_)) => true,
            CacheError::Store(StoreError::Redis(err)) => err.is_timeout(),
            _ => false,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::KeyNotFound { .. } => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Closed => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Store(_) if self.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            CacheError::Store(_) | CacheError::Loader(_) => StatusCode::BAD_GATEWAY,
            CacheError::InvalidCacheValue(_)
            | CacheError::InvalidLoaderValue { .. }
            | CacheError::InvalidConnectionString(_)
            | CacheError::InvalidCacheName(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
