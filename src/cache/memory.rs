//! In-memory cache engine.
//!
//! An LRU cache with byte-size bounded eviction and lazy per-entry expiry.
//! Expired entries are dropped on the first `get` that touches them; the
//! engine never spawns a background sweeper.
//!
//! This is the default engine. It holds nothing across restarts.

use std::num::NonZeroUsize;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::error::CacheError;

use super::{CacheEngine, CacheKey};

/// Default capacity: 100MB of artifact bytes.
pub const DEFAULT_MEMORY_CACHE_BYTES: usize = 100 * 1024 * 1024;

/// Default maximum number of entries (bounds LRU bookkeeping).
pub const DEFAULT_MEMORY_CACHE_ENTRIES: usize = 10_000;

struct StoredEntry {
    data: Bytes,
    expires_at: Instant,
}

/// LRU + TTL in-memory engine.
///
/// Thread-safe; share it across tasks via `Arc`.
pub struct MemoryEngine {
    entries: RwLock<LruCache<CacheKey, StoredEntry>>,

    /// Maximum total payload size in bytes
    max_bytes: usize,

    /// Current total payload size in bytes
    current_bytes: RwLock<usize>,
}

impl MemoryEngine {
    /// Create an engine with default capacities.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MEMORY_CACHE_BYTES, DEFAULT_MEMORY_CACHE_ENTRIES)
    }

    /// Create an engine bounded by `max_bytes` of payload across at most
    /// `max_entries` entries.
    pub fn with_capacity(max_bytes: usize, max_entries: usize) -> Self {
        let max_entries = NonZeroUsize::new(max_entries.max(1)).unwrap();
        Self {
            entries: RwLock::new(LruCache::new(max_entries)),
            max_bytes,
            current_bytes: RwLock::new(0),
        }
    }

    /// Current number of live entries, counting expired-but-unswept ones.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the engine holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Current total payload size in bytes.
    pub async fn size(&self) -> usize {
        *self.current_bytes.read().await
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheEngine for MemoryEngine {
    async fn start(&self) -> Result<(), CacheError> {
        // Nothing to initialize for the in-memory engine.
        Ok(())
    }

    async fn get(&self, key: &CacheKey) -> Result<Option<Bytes>, CacheError> {
        let mut entries = self.entries.write().await;

        let expired = match entries.get(key) {
            None => return Ok(None),
            Some(entry) if entry.expires_at <= Instant::now() => true,
            Some(entry) => return Ok(Some(entry.data.clone())),
        };

        if expired {
            if let Some(entry) = entries.pop(key) {
                let mut current = self.current_bytes.write().await;
                *current = current.saturating_sub(entry.data.len());
            }
        }
        Ok(None)
    }

    async fn set(&self, key: CacheKey, data: Bytes, ttl: Duration) -> Result<(), CacheError> {
        let data_len = data.len();
        let entry = StoredEntry {
            data,
            expires_at: Instant::now() + ttl,
        };

        let mut entries = self.entries.write().await;
        let mut current = self.current_bytes.write().await;

        // push returns the overwritten entry, or the LRU entry it displaced
        // when the entry bound is hit; either way those bytes are gone.
        if let Some((_, displaced)) = entries.push(key, entry) {
            *current = current.saturating_sub(displaced.data.len());
        }
        *current += data_len;

        // Evict until we are back under the byte bound.
        while *current > self.max_bytes {
            match entries.pop_lru() {
                Some((_, evicted)) => {
                    *current = current.saturating_sub(evicted.data.len());
                }
                None => break,
            }
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn make_key(path: &str) -> CacheKey {
        CacheKey::new(path)
    }

    fn make_payload(size: usize) -> Bytes {
        Bytes::from(vec![0u8; size])
    }

    const TTL: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn test_start_is_infallible() {
        let engine = MemoryEngine::new();
        assert!(engine.start().await.is_ok());
    }

    #[tokio::test]
    async fn test_get_set_round_trip() {
        let engine = MemoryEngine::new();
        let key = make_key("/a.jpg");

        assert_eq!(engine.get(&key).await.unwrap(), None);

        let data = make_payload(100);
        engine.set(key.clone(), data.clone(), TTL).await.unwrap();
        assert_eq!(engine.get(&key).await.unwrap(), Some(data));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let engine = MemoryEngine::new();
        let key = make_key("/a.jpg");

        engine
            .set(key.clone(), make_payload(100), Duration::from_secs(60))
            .await
            .unwrap();
        assert!(engine.get(&key).await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(engine.get(&key).await.unwrap(), None);
        // The expired entry's bytes were released.
        assert_eq!(engine.size().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unexpired_entry_survives() {
        let engine = MemoryEngine::new();
        let key = make_key("/a.jpg");

        engine
            .set(key.clone(), make_payload(100), Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(engine.get(&key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_size_tracking() {
        let engine = MemoryEngine::with_capacity(10_000, 100);
        assert_eq!(engine.size().await, 0);

        engine
            .set(make_key("/a.jpg"), make_payload(1000), TTL)
            .await
            .unwrap();
        assert_eq!(engine.size().await, 1000);

        engine
            .set(make_key("/b.jpg"), make_payload(2000), TTL)
            .await
            .unwrap();
        assert_eq!(engine.size().await, 3000);
    }

    #[tokio::test]
    async fn test_overwrite_adjusts_size() {
        let engine = MemoryEngine::with_capacity(10_000, 100);
        let key = make_key("/a.jpg");

        engine.set(key.clone(), make_payload(1000), TTL).await.unwrap();
        engine.set(key.clone(), make_payload(500), TTL).await.unwrap();

        assert_eq!(engine.size().await, 500);
        assert_eq!(engine.len().await, 1);
    }

    #[tokio::test]
    async fn test_byte_bound_evicts_lru() {
        let engine = MemoryEngine::with_capacity(1000, 100);

        engine
            .set(make_key("/a.jpg"), make_payload(400), TTL)
            .await
            .unwrap();
        engine
            .set(make_key("/b.jpg"), make_payload(400), TTL)
            .await
            .unwrap();
        engine
            .set(make_key("/c.jpg"), make_payload(400), TTL)
            .await
            .unwrap();

        assert!(engine.size().await <= 1000);
        assert_eq!(engine.get(&make_key("/a.jpg")).await.unwrap(), None);
        assert!(engine.get(&make_key("/b.jpg")).await.unwrap().is_some());
        assert!(engine.get(&make_key("/c.jpg")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_entry_bound_evicts_lru() {
        let engine = MemoryEngine::with_capacity(usize::MAX, 2);

        engine
            .set(make_key("/a.jpg"), make_payload(10), TTL)
            .await
            .unwrap();
        engine
            .set(make_key("/b.jpg"), make_payload(10), TTL)
            .await
            .unwrap();
        engine
            .set(make_key("/c.jpg"), make_payload(10), TTL)
            .await
            .unwrap();

        assert_eq!(engine.len().await, 2);
        assert_eq!(engine.get(&make_key("/a.jpg")).await.unwrap(), None);
        assert_eq!(engine.size().await, 20);
    }
}
