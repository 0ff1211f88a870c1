//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::cache::{Cache, CacheOptions};
use crate::error::{CacheError, Result};
use crate::models::{DeleteResponse, HealthResponse, SetRequest, SetResponse, ValueResponse};
use crate::store::{ConnectOptions, Connection};

/// Application state shared across all handlers.
///
/// The cache is cheap to clone and safe to use concurrently, so no extra
/// locking is needed here.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Cache holding arbitrary JSON values
    pub cache: Cache<Value>,
}

impl AppState {
    /// Creates a new AppState around the given cache.
    pub fn new(cache: Cache<Value>) -> Self {
        Self { cache }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Opens the store connection lazily; nothing is sent until the first request.
    pub fn from_config(config: &crate::config::Config) -> Result<Self> {
        let connect = ConnectOptions {
            password: Some(config.password.clone()),
            timeout: config.store_timeout(),
        };
        let connection = Connection::open_with(&config.url, &connect)?;

        let options = CacheOptions::new()
            .key_prefix(config.key_prefix.clone())
            .ttl(config.default_ttl());
        let cache = Cache::new(&config.cache_name, connection, options)?;

        Ok(Self::new(cache))
    }
}

/// Handler for PUT /set
///
/// Stores a JSON value in the cache with optional TTL.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state
        .cache
        .set_with(&req.key, &req.value, req.item_options())
        .await?;

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
///
/// Retrieves a value from the cache by key.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ValueResponse>> {
    match state.cache.get_opt(&key).await? {
        Some(value) => Ok(Json(ValueResponse::new(key, value))),
        None => Err(CacheError::KeyNotFound { key }),
    }
}

/// Handler for DELETE /del/:key
///
/// Deletes a key from the cache. Missing keys are not an error.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    state.cache.delete(&key).await?;

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for POST /pop/:key
///
/// Removes a key and returns the value it held.
pub async fn pop_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ValueResponse>> {
    let value = state.cache.pop(&key).await?;

    Ok(Json(ValueResponse::new(key, value)))
}

/// Handler for GET /health
///
/// Pings the store. A closed cache still reports healthy.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let backend = state.cache.connection().backend();

    match state.cache.ping().await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse::healthy(backend))),
        Err(err) => {
            tracing::warn!("Health check failed: {}", err);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse::unhealthy(backend, err.to_string())),
            )
        }
    }
}
