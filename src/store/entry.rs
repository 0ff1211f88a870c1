//! Stored Entry Module
//!
//! Bytes held by the in-memory store together with their expiry.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

// == Stored Entry ==
/// A single serialized value kept by [`MemoryStore`](super::MemoryStore).
#[derive(Debug, Clone)]
pub struct StoredEntry {
    /// The encoded value
    pub value: Vec<u8>,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl StoredEntry {
    // == Constructor ==
    /// Creates a new entry. A zero `ttl` means the entry never expires.
    pub fn new(value: Vec<u8>, ttl: Duration) -> Self {
        let expires_at = if ttl.is_zero() {
            None
        } else {
            Some(current_timestamp_ms().saturating_add(ttl_millis(ttl)))
        };

        Self { value, expires_at }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches its expiration time.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => current_timestamp_ms() >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, or None if no expiration is set.
    ///
    /// - `Some(Duration::ZERO)` once the entry has expired
    /// - `None` if the entry never expires
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at.map(|expires| {
            let now = current_timestamp_ms();
            Duration::from_millis(expires.saturating_sub(now))
        })
    }
}

// == Utility Functions ==
/// Converts a non-zero TTL to whole milliseconds, never rounding below 1ms.
pub fn ttl_millis(ttl: Duration) -> u64 {
    let ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
    ms.max(1)
}

/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
