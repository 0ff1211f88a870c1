//! Cache Options
//!
//! Construction-time settings of a cache instance and per-call item options.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::LoaderError;

// == Loader ==
/// Computes the value of a missing key.
///
/// Loaders return an untyped JSON value so one set of [`CacheOptions`] can
/// serve caches of different value types. The cache checks the value
/// against its own type before storing it.
#[async_trait]
pub trait Loader: Send + Sync {
    async fn load(&self, key: &str) -> Result<Value, LoaderError>;
}

#[async_trait]
impl<F, Fut> Loader for F
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, LoaderError>> + Send,
{
    async fn load(&self, key: &str) -> Result<Value, LoaderError> {
        (self)(key.to_string()).await
    }
}

// == Cache Options ==
/// Settings shared by every operation of a cache instance.
#[derive(Clone, Default)]
pub struct CacheOptions {
    /// Namespace shared by caches on the same store, empty = none
    pub key_prefix: String,
    /// Default TTL, zero = no expiry
    pub ttl: Duration,
    /// Fills missing keys on `get`
    pub loader: Option<Arc<dyn Loader>>,
}

impl CacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the shared key prefix.
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Sets the default TTL.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Installs a loader.
    pub fn loader<L: Loader + 'static>(mut self, loader: L) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }
}

impl fmt::Debug for CacheOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheOptions")
            .field("key_prefix", &self.key_prefix)
            .field("ttl", &self.ttl)
            .field("loader", &self.loader.is_some())
            .finish()
    }
}

// == Item Options ==
/// Per-call overrides. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemOptions {
    /// TTL for this write, zero = use the cache default
    pub ttl: Duration,
}

impl ItemOptions {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl }
    }

    /// Effective TTL given the cache default.
    pub fn resolve_ttl(&self, default: Duration) -> Duration {
        if self.ttl.is_zero() {
            default
        } else {
            self.ttl
        }
    }
}
