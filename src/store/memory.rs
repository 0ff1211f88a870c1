//! Memory Store Module
//!
//! In-process store backed by a HashMap with TTL expiration.
//!
//! Expired entries read as absent straight away. They are dropped from the
//! map when read, and in bulk by a sweep that runs inside `set` at most once
//! per sweep interval, so keys that are written and never read again do not
//! pile up.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::entry::{current_timestamp_ms, StoredEntry};
use super::Store;
use crate::error::StoreResult;

/// Minimum time between two expiry sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

// == Memory Store ==
/// Store keeping entries in process memory.
///
/// Clones share the same map, so a test can keep one handle to inspect what
/// a cache wrote through another.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, StoredEntry>>>,
    /// Unix milliseconds of the last sweep
    last_sweep: Arc<AtomicU64>,
    sweep_interval: Duration,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_sweep_interval(DEFAULT_SWEEP_INTERVAL)
    }
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store sweeping expired entries at most once per
    /// `sweep_interval`.
    pub fn with_sweep_interval(sweep_interval: Duration) -> Self {
        Self {
            entries: Arc::default(),
            last_sweep: Arc::new(AtomicU64::new(current_timestamp_ms())),
            sweep_interval,
        }
    }

    // == Time To Live ==
    /// Remaining lifetime of a live key.
    ///
    /// Returns `None` when the key is absent or expired and
    /// `Some(None)` when the key never expires.
    pub async fn ttl(&self, key: &str) -> Option<Option<Duration>> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(StoredEntry::ttl_remaining)
    }

    // == Contains ==
    /// Checks whether a live entry exists under the key.
    pub async fn contains_key(&self, key: &str) -> bool {
        let entries = self.entries.read().await;
        entries.get(key).is_some_and(|entry| !entry.is_expired())
    }

    // == Raw Access ==
    /// Returns the stored bytes of a live key.
    pub async fn raw(&self, key: &str) -> Option<Vec<u8>> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone())
    }

    // == Cleanup Expired ==
    /// Removes all expired entries, returning how many were dropped.
    pub async fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        self.last_sweep.store(current_timestamp_ms(), Ordering::Relaxed);
        remove_expired(&mut entries)
    }

    // Claims the next sweep if the interval has elapsed. Called under the write lock.
    fn sweep_due(&self) -> bool {
        let now = current_timestamp_ms();
        let last = self.last_sweep.load(Ordering::Relaxed);
        let interval = u64::try_from(self.sweep_interval.as_millis()).unwrap_or(u64::MAX);

        if now.saturating_sub(last) < interval {
            return false;
        }
        self.last_sweep.store(now, Ordering::Relaxed);
        true
    }

    // == Length ==
    /// Returns the number of live entries.
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.values().filter(|entry| !entry.is_expired()).count()
    }

    // == Is Empty ==
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        // Expired: drop it so it reads as absent from now on
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(StoredEntry::is_expired) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> StoreResult<()> {
        let mut entries = self.entries.write().await;
        if self.sweep_due() {
            let removed = remove_expired(&mut entries);
            if removed > 0 {
                debug!("Memory store sweep removed {} expired entries", removed);
            }
        }
        entries.insert(key.to_string(), StoredEntry::new(value, ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }

    async fn get_del(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let mut entries = self.entries.write().await;
        Ok(entries
            .remove(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

fn remove_expired(entries: &mut HashMap<String, StoredEntry>) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| !entry.is_expired());
    before - entries.len()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_set_and_get() {
        let store = MemoryStore::new();

        store.set("key1", b"value1".to_vec(), Duration::ZERO).await.unwrap();
        let value = store.get("key1").await.unwrap();

        assert_eq!(value.as_deref(), Some(&b"value1"[..]));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_store_get_nonexistent() {
        let store = MemoryStore::new();

        assert!(store.get("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_delete_is_idempotent() {
        let store = MemoryStore::new();

        store.set("key1", b"value1".to_vec(), Duration::ZERO).await.unwrap();
        store.delete("key1").await.unwrap();
        store.delete("key1").await.unwrap();

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_store_overwrite_resets_ttl() {
        let store = MemoryStore::new();

        store.set("key1", b"v1".to_vec(), Duration::from_secs(5)).await.unwrap();
        store.set("key1", b"v2".to_vec(), Duration::ZERO).await.unwrap();

        assert_eq!(store.raw("key1").await, Some(b"v2".to_vec()));
        assert_eq!(store.ttl("key1").await, Some(None));
    }

    #[tokio::test]
    async fn test_store_ttl_expiration() {
        let store = MemoryStore::new();

        store.set("key1", b"value1".to_vec(), Duration::from_millis(50)).await.unwrap();
        assert!(store.contains_key("key1").await);

        tokio::time::sleep(Duration::from_millis(80)).await;

        assert!(store.get("key1").await.unwrap().is_none());
        assert!(store.ttl("key1").await.is_none());
    }

    #[tokio::test]
    async fn test_store_get_del() {
        let store = MemoryStore::new();

        store.set("key1", b"value1".to_vec(), Duration::ZERO).await.unwrap();

        assert_eq!(store.get_del("key1").await.unwrap(), Some(b"value1".to_vec()));
        assert!(store.get_del("key1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_get_del_expired() {
        let store = MemoryStore::new();

        store.set("key1", b"value1".to_vec(), Duration::from_millis(20)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(store.get_del("key1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_cleanup_expired() {
        let store = MemoryStore::new();

        store.set("key1", b"v".to_vec(), Duration::from_millis(20)).await.unwrap();
        store.set("key2", b"v".to_vec(), Duration::from_secs(10)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(store.cleanup_expired().await, 1);
        assert_eq!(store.len().await, 1);
        assert!(store.contains_key("key2").await);
    }

    #[tokio::test]
    async fn test_set_sweeps_entries_never_read() {
        let store = MemoryStore::with_sweep_interval(Duration::from_millis(10));

        for i in 0..1000 {
            let key = format!("short{}", i);
            store.set(&key, b"v".to_vec(), Duration::from_millis(1)).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(30)).await;

        store.set("fresh", b"v".to_vec(), Duration::ZERO).await.unwrap();

        assert_eq!(store.entries.read().await.len(), 1);
        assert!(store.contains_key("fresh").await);
    }

    #[tokio::test]
    async fn test_set_skips_sweep_within_interval() {
        let store = MemoryStore::with_sweep_interval(Duration::from_secs(3600));

        store.set("short", b"v".to_vec(), Duration::from_millis(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        store.set("other", b"v".to_vec(), Duration::ZERO).await.unwrap();

        // Expired but not yet swept; still reads as absent
        assert_eq!(store.entries.read().await.len(), 2);
        assert_eq!(store.len().await, 1);
        assert!(store.get("short").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let store = MemoryStore::new();
        let handle = store.clone();

        store.set("shared", b"1".to_vec(), Duration::ZERO).await.unwrap();

        assert!(handle.contains_key("shared").await);
    }
}
