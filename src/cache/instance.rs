//! Cache Instance Module
//!
//! Typed cache over a shared store connection.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};

use crate::cache::key::{namespace, physical_key};
use crate::cache::{CacheOptions, ItemOptions, Loader};
use crate::error::{CacheError, Result};
use crate::store::Connection;

// == Cache ==
/// Typed read-through cache over a [`Connection`].
///
/// Values are stored as JSON under `[key_prefix:]name:key`. Clones share the
/// connection and the loader.
///
/// There is no coalescing of concurrent misses: every `get` that misses calls
/// the loader and writes its result on its own.
pub struct Cache<T> {
    connection: Connection,
    name: String,
    namespace: String,
    ttl: Duration,
    loader: Option<Arc<dyn Loader>>,
    _value: PhantomData<fn() -> T>,
}

impl<T> Cache<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    // == Constructor ==
    /// Creates a cache named `name` on `connection`.
    ///
    /// Fails with [`CacheError::InvalidCacheName`] when `name` is empty.
    pub fn new(name: &str, connection: Connection, options: CacheOptions) -> Result<Self> {
        Ok(Self {
            namespace: namespace(&options.key_prefix, name)?,
            name: name.to_string(),
            connection,
            ttl: options.ttl,
            loader: options.loader,
            _value: PhantomData,
        })
    }

    // == Get ==
    /// Returns the value under `key`.
    ///
    /// On a miss the loader fills the key; without a loader the default value
    /// of `T` is returned and no error is raised.
    pub async fn get(&self, key: &str) -> Result<T>
    where
        T: Default,
    {
        self.get_with(key, ItemOptions::default()).await
    }

    /// Like [`get`](Self::get), applying `options` to a loader fill.
    pub async fn get_with(&self, key: &str, options: ItemOptions) -> Result<T>
    where
        T: Default,
    {
        Ok(self.get_opt_with(key, options).await?.unwrap_or_default())
    }

    /// Like [`get`](Self::get) but reports a miss without loader as `None`.
    pub async fn get_opt(&self, key: &str) -> Result<Option<T>> {
        self.get_opt_with(key, ItemOptions::default()).await
    }

    /// Like [`get_opt`](Self::get_opt), applying `options` to a loader fill.
    pub async fn get_opt_with(&self, key: &str, options: ItemOptions) -> Result<Option<T>> {
        let store = self.connection.store()?;
        let physical = self.physical_key(key);

        match self.connection.run(store.get(&physical)).await? {
            Some(bytes) => decode(&bytes).map(Some),
            None => match &self.loader {
                Some(loader) => self.fill(loader.as_ref(), key, options).await.map(Some),
                None => Ok(None),
            },
        }
    }

    async fn fill(&self, loader: &dyn Loader, key: &str, options: ItemOptions) -> Result<T> {
        let loaded = loader.load(key).await.map_err(CacheError::Loader)?;

        let value = match serde_json::from_value::<T>(loaded.clone()) {
            Ok(value) => value,
            Err(source) => {
                return Err(CacheError::InvalidLoaderValue {
                    value: loaded,
                    source,
                })
            }
        };

        self.set_with(key, &value, options).await?;
        Ok(value)
    }

    // == Pop ==
    /// Removes the value under `key` and returns it.
    ///
    /// A missing key is [`CacheError::KeyNotFound`]; the loader is never used.
    pub async fn pop(&self, key: &str) -> Result<T> {
        let store = self.connection.store()?;
        let physical = self.physical_key(key);

        match self.connection.run(store.get_del(&physical)).await? {
            Some(bytes) => decode(&bytes),
            None => Err(CacheError::KeyNotFound {
                key: key.to_string(),
            }),
        }
    }

    // == Set ==
    /// Stores `value` under `key` with the default TTL.
    pub async fn set(&self, key: &str, value: &T) -> Result<()> {
        self.set_with(key, value, ItemOptions::default()).await
    }

    /// Stores `value` under `key`; a non-zero `options.ttl` replaces the default.
    pub async fn set_with(&self, key: &str, value: &T, options: ItemOptions) -> Result<()> {
        let store = self.connection.store()?;
        let bytes = serde_json::to_vec(value).map_err(CacheError::InvalidCacheValue)?;
        let ttl = options.resolve_ttl(self.ttl);
        let physical = self.physical_key(key);

        self.connection.run(store.set(&physical, bytes, ttl)).await?;
        Ok(())
    }

    // == Delete ==
    /// Removes `key`. Removing a missing key succeeds.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let store = self.connection.store()?;
        let physical = self.physical_key(key);

        self.connection.run(store.delete(&physical)).await?;
        Ok(())
    }
}

impl<T> Cache<T> {
    // == Ping ==
    /// Checks the store. A closed cache reports healthy.
    pub async fn ping(&self) -> Result<()> {
        self.connection.ping().await
    }

    // == Close ==
    /// Closes the underlying connection.
    ///
    /// Every cache sharing the connection is closed with it.
    pub fn close(&self) {
        self.connection.close();
    }

    pub fn is_closed(&self) -> bool {
        self.connection.is_closed()
    }

    // == Accessors ==
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace prepended to every key, always ending with `:`.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Default TTL of this cache.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Store key used for the logical `key`.
    pub fn physical_key(&self, key: &str) -> String {
        physical_key(&self.namespace, key)
    }
}

impl<T> Clone for Cache<T> {
    fn clone(&self) -> Self {
        Self {
            connection: self.connection.clone(),
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            ttl: self.ttl,
            loader: self.loader.clone(),
            _value: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Cache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("namespace", &self.namespace)
            .field("ttl", &self.ttl)
            .field("loader", &self.loader.is_some())
            .field("connection", &self.connection)
            .finish()
    }
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(CacheError::InvalidCacheValue)
}
