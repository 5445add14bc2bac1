//! Cache-aside storage for finished artifacts.
//!
//! The orchestrator checks the cache before doing any work and populates it
//! after computing a result itself. The storage engine behind the store is
//! pluggable via the [`CacheEngine`] trait; the default engine keeps
//! entries in memory (see [`MemoryEngine`]) with no durability across
//! restarts.
//!
//! # Key shape
//!
//! Artifacts are keyed by the raw request path plus a fixed namespace
//! segment. The raw path acts as a content-addressing proxy for the full
//! transform request: two requests with identical paths are assumed to
//! produce identical artifacts. Directive order is *not* canonicalized, so
//! differently-spelled but semantically identical paths occupy distinct
//! entries.
//!
//! # Failure policy
//!
//! Engine failures never fail a request. A read failure degrades to a miss
//! (logged by the orchestrator), a write failure is dropped after logging
//! and the freshly computed bytes are still served.

mod memory;

pub use memory::{MemoryEngine, DEFAULT_MEMORY_CACHE_BYTES, DEFAULT_MEMORY_CACHE_ENTRIES};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::CacheError;

/// Default entry TTL: one hour.
pub const DEFAULT_TTL_MS: u64 = 60 * 60 * 1000;

/// Namespace segment included in every cache key.
pub const CACHE_SEGMENT: &str = env!("CARGO_PKG_NAME");

// =============================================================================
// Cache Key
// =============================================================================

/// Composite key for cached artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// The raw request path, including the leading slash and any directives
    pub id: Arc<str>,

    /// Fixed namespace segment separating this proxy's entries from other
    /// users of a shared engine
    pub segment: &'static str,
}

impl CacheKey {
    /// Create a key for a raw request path.
    pub fn new(path: impl Into<Arc<str>>) -> Self {
        Self {
            id: path.into(),
            segment: CACHE_SEGMENT,
        }
    }
}

// =============================================================================
// Engine Trait
// =============================================================================

/// A pluggable key/value storage engine with TTL.
///
/// Engines are shared across requests and must be internally synchronized.
/// `get` returns `Ok(None)` for a miss; errors are reserved for
/// transport/engine failures.
#[async_trait]
pub trait CacheEngine: Send + Sync {
    /// Initialize the engine. Called once at process start; a failure here
    /// is fatal.
    async fn start(&self) -> Result<(), CacheError>;

    /// Look up a payload. `Ok(None)` on miss, never an error.
    async fn get(&self, key: &CacheKey) -> Result<Option<Bytes>, CacheError>;

    /// Store a payload under the given TTL, resolving once the engine has
    /// durably accepted it.
    async fn set(&self, key: CacheKey, data: Bytes, ttl: Duration) -> Result<(), CacheError>;
}

// =============================================================================
// Cache Store
// =============================================================================

/// Cache-aside facade over a [`CacheEngine`], carrying the configured TTL.
///
/// Entries are immutable once stored; they are overwritten only by a fresh
/// `set` for the same key after expiry or a miss-then-recompute.
#[derive(Clone)]
pub struct CacheStore {
    engine: Arc<dyn CacheEngine>,
    ttl: Duration,
}

impl CacheStore {
    /// Create a store over the given engine with an explicit TTL.
    pub fn new(engine: Arc<dyn CacheEngine>, ttl: Duration) -> Self {
        Self { engine, ttl }
    }

    /// Create a store with the default one hour TTL.
    pub fn with_default_ttl(engine: Arc<dyn CacheEngine>) -> Self {
        Self::new(engine, Duration::from_millis(DEFAULT_TTL_MS))
    }

    /// The TTL applied to every `set`.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Initialize the underlying engine.
    pub async fn start(&self) -> Result<(), CacheError> {
        self.engine.start().await
    }

    /// Look up a cached artifact. `Ok(None)` on miss.
    pub async fn get(&self, key: &CacheKey) -> Result<Option<Bytes>, CacheError> {
        self.engine.get(key).await
    }

    /// Store an artifact under the configured TTL.
    pub async fn set(&self, key: CacheKey, data: Bytes) -> Result<(), CacheError> {
        self.engine.set(key, data, self.ttl).await
    }
}

// =============================================================================
// Tests
// =============================================================================
