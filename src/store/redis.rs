//! Redis Store Module
//!
//! Store backed by a Redis server through a lazily established
//! `ConnectionManager`.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, ConnectionInfo, IntoConnectionInfo};
use tokio::sync::OnceCell;
use tracing::debug;

use super::{entry::ttl_millis, Store};
use crate::error::{CacheError, Result, StoreResult};

// == Connection Info ==
/// Parses a Redis URL, letting a non-empty `password` replace the one in the URL.
pub fn parse_connection_info(url: &str, password: Option<&str>) -> Result<ConnectionInfo> {
    let mut info = url
        .into_connection_info()
        .map_err(|err| CacheError::InvalidConnectionString(err.to_string()))?;

    if let Some(password) = password.filter(|p| !p.is_empty()) {
        info.redis.password = Some(password.to_string());
    }

    Ok(info)
}

// == Redis Store ==
/// Store talking to a Redis server.
///
/// Creating the store does no network I/O; the multiplexed connection is
/// opened on the first command and shared by all callers afterwards.
pub struct RedisStore {
    client: Client,
    manager: OnceCell<ConnectionManager>,
}

impl RedisStore {
    // == Constructor ==
    /// Creates a store from parsed connection info.
    pub fn new(info: ConnectionInfo) -> Result<Self> {
        let client =
            Client::open(info).map_err(|err| CacheError::InvalidConnectionString(err.to_string()))?;

        Ok(Self {
            client,
            manager: OnceCell::new(),
        })
    }

    /// Address and database this store points at.
    pub fn connection_info(&self) -> &ConnectionInfo {
        self.client.get_connection_info()
    }

    async fn connection(&self) -> StoreResult<ConnectionManager> {
        let manager = self
            .manager
            .get_or_try_init(|| async {
                let manager = self.client.get_connection_manager().await?;
                debug!("Redis connection established to {}", self.connection_info().addr);
                Ok::<_, redis::RedisError>(manager)
            })
            .await?;

        Ok(manager.clone())
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("addr", &self.connection_info().addr)
            .field("db", &self.connection_info().redis.db)
            .field("connected", &self.manager.initialized())
            .finish()
    }
}

#[async_trait]
impl Store for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let mut con = self.connection().await?;
        Ok(con.get(key).await?)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> StoreResult<()> {
        let mut con = self.connection().await?;
        if ttl.is_zero() {
            con.set::<_, _, ()>(key, value).await?;
        } else {
            con.pset_ex::<_, _, ()>(key, value, ttl_millis(ttl)).await?;
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut con = self.connection().await?;
        con.del::<_, ()>(key).await?;
        Ok(())
    }

    async fn get_del(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let mut con = self.connection().await?;
        Ok(con.get_del(key).await?)
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut con = self.connection().await?;
        redis::cmd("PING").query_async::<_, String>(&mut con).await?;
        Ok(())
    }
}
