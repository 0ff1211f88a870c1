//! Typed Cache - A typed read-through cache backed by Redis
//!
//! Stores serde values as JSON under namespaced keys with default or
//! per-item TTLs, and can fill missing keys through a loader.
//!
//! ```ignore
//! use std::time::Duration;
//! use typed_cache::{Cache, CacheOptions, Connection};
//!
//! let connection = Connection::open("redis://127.0.0.1:6379", None)?;
//! let users: Cache<User> = Cache::new(
//!     "users",
//!     connection,
//!     CacheOptions::new().key_prefix("app").ttl(Duration::from_secs(60)),
//! )?;
//!
//! users.set("42", &user).await?;
//! let user = users.get("42").await?;
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod store;

pub use api::AppState;
pub use cache::{Cache, CacheOptions, ItemOptions, Loader};
pub use config::Config;
pub use error::{CacheError, LoaderError, Result, StoreError};
pub use store::{ConnectOptions, Connection, MemoryStore, RedisStore, Store};
