//! Store Module
//!
//! Connection to the backing key-value store and the primitive byte-level
//! operations every cache instance is built on.

mod entry;
mod memory;
mod redis;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info};

pub use self::redis::{parse_connection_info, RedisStore};
pub use memory::MemoryStore;

use crate::error::{CacheError, Result, StoreError, StoreResult};

/// URL scheme selecting the in-process store.
pub const MEMORY_SCHEME: &str = "memory://";

// == Store Trait ==
/// Primitive operations of a key-value store holding byte values.
///
/// Absent keys read as `Ok(None)` and deleting an absent key succeeds.
#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name used in logs and health output.
    fn name(&self) -> &'static str;

    /// Reads the value under `key`.
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Writes `value` under `key`. A zero `ttl` stores without expiry.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> StoreResult<()>;

    /// Removes `key`.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Atomically reads and removes `key`.
    async fn get_del(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Checks that the store answers.
    async fn ping(&self) -> StoreResult<()>;
}

// == Connect Options ==
/// Settings applied when opening a [`Connection`].
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    /// Replaces the password embedded in the URL when non-empty
    pub password: Option<String>,
    /// Upper bound for every store round-trip, None = unbounded
    pub timeout: Option<Duration>,
}

// == Connection ==
/// Shared handle to an open store.
///
/// Clones refer to the same store. Closing any clone closes it for all of
/// them, including every cache built on top.
#[derive(Clone)]
pub struct Connection {
    shared: Arc<Shared>,
}

struct Shared {
    store: RwLock<Option<Arc<dyn Store>>>,
    backend: &'static str,
    timeout: Option<Duration>,
}

impl Connection {
    // == Constructors ==
    /// Opens a connection from a URL and an optional password override.
    ///
    /// Supports `redis://`, `redis+unix://`, `unix://` and `memory://`.
    /// Nothing is sent over the network until the first operation.
    pub fn open(url: &str, password: Option<&str>) -> Result<Self> {
        let options = ConnectOptions {
            password: password.map(str::to_string),
            timeout: None,
        };
        Self::open_with(url, &options)
    }

    /// Opens a connection with full [`ConnectOptions`].
    pub fn open_with(url: &str, options: &ConnectOptions) -> Result<Self> {
        let store: Arc<dyn Store> = if url.starts_with(MEMORY_SCHEME) {
            Arc::new(MemoryStore::new())
        } else {
            let info = parse_connection_info(url, options.password.as_deref())?;
            Arc::new(RedisStore::new(info)?)
        };

        info!("Opened {} store connection", store.name());
        Ok(Self::build(store, options.timeout))
    }

    /// Wraps an existing store.
    pub fn from_store<S: Store + 'static>(store: S) -> Self {
        Self::build(Arc::new(store), None)
    }

    /// Wraps an existing store, bounding every round-trip by `timeout`.
    pub fn from_store_with_timeout<S: Store + 'static>(store: S, timeout: Duration) -> Self {
        Self::build(Arc::new(store), Some(timeout))
    }

    fn build(store: Arc<dyn Store>, timeout: Option<Duration>) -> Self {
        Self {
            shared: Arc::new(Shared {
                backend: store.name(),
                store: RwLock::new(Some(store)),
                timeout,
            }),
        }
    }

    // == Accessors ==
    /// Name of the backend this connection was opened on.
    pub fn backend(&self) -> &'static str {
        self.shared.backend
    }

    /// Per-operation timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.shared.timeout
    }

    /// Returns true once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.shared.store.read().is_none()
    }

    /// The live store, or `CacheError::Closed`.
    pub(crate) fn store(&self) -> Result<Arc<dyn Store>> {
        self.shared.store.read().clone().ok_or(CacheError::Closed)
    }

    // == Round Trip ==
    /// Runs a store future under the configured timeout.
    pub(crate) async fn run<T, F>(&self, fut: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        match self.shared.timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| StoreError::Timeout(limit))?,
            None => fut.await,
        }
    }

    // == Ping ==
    /// Checks the store. A closed connection counts as healthy.
    pub async fn ping(&self) -> Result<()> {
        let Some(store) = self.shared.store.read().clone() else {
            return Ok(());
        };
        self.run(store.ping()).await?;
        Ok(())
    }

    // == Close ==
    /// Releases the store. Calling it again is a no-op.
    pub fn close(&self) {
        if self.shared.store.write().take().is_some() {
            debug!("Closed {} store connection", self.shared.backend);
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("backend", &self.shared.backend)
            .field("timeout", &self.shared.timeout)
            .field("closed", &self.is_closed())
            .finish()
    }
}
