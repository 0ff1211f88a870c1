//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::time::Duration;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Store connection string (`redis://...` or `memory://`)
    pub url: String,
    /// Password overriding the one in `url`, empty = keep the URL's
    pub password: String,
    /// Namespace shared by caches on the same store
    pub key_prefix: String,
    /// Name of the served cache
    pub cache_name: String,
    /// Default TTL in seconds, 0 = no expiry
    pub default_ttl: u64,
    /// Store round-trip timeout in milliseconds, 0 = none
    pub store_timeout_ms: u64,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_URL` - Store connection string (default: redis://127.0.0.1:6379)
    /// - `CACHE_PASSWORD` - Password override (default: empty)
    /// - `CACHE_KEY_PREFIX` - Shared key prefix (default: empty)
    /// - `CACHE_NAME` - Cache name (default: kv)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `STORE_TIMEOUT_MS` - Store timeout in milliseconds (default: 0)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: env::var("CACHE_URL").unwrap_or(defaults.url),
            password: env::var("CACHE_PASSWORD").unwrap_or(defaults.password),
            key_prefix: env::var("CACHE_KEY_PREFIX").unwrap_or(defaults.key_prefix),
            cache_name: env::var("CACHE_NAME").unwrap_or(defaults.cache_name),
            default_ttl: env::var("DEFAULT_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_ttl),
            store_timeout_ms: env::var("STORE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.store_timeout_ms),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
        }
    }

    /// Default TTL as a Duration.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }

    /// Store timeout, None when disabled.
    pub fn store_timeout(&self) -> Option<Duration> {
        (self.store_timeout_ms > 0).then(|| Duration::from_millis(self.store_timeout_ms))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            password: String::new(),
            key_prefix: String::new(),
            cache_name: "kv".to_string(),
            default_ttl: 300,
            store_timeout_ms: 0,
            server_port: 3000,
        }
    }
}
