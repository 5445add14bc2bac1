//! Request orchestration.
//!
//! [`ProxyService`] composes the parser, cache, source, and pipeline per
//! inbound request:
//!
//! ```text
//! parse ──no match──▶ NotFound
//!   │
//!   ▼
//! cache get ──hit──▶ respond (cached)
//!   │ miss / read failure (degraded to miss, logged)
//!   ▼
//! source fetch ──not found──▶ NotFound
//!   │                └─other─▶ InternalError
//!   ▼
//! transform ──decode failure──▶ NotFound
//!   │           └─stage failure─▶ InternalError
//!   ▼
//! cache set (failure logged and swallowed)
//!   │
//!   ▼
//! respond (fresh)
//! ```
//!
//! Caching is a performance layer, not a correctness dependency: engine
//! failures on either side never fail the request, though both are logged
//! at error level.
//!
//! There is no request coalescing. Concurrent identical requests that miss
//! the cache each run the full fetch-transform pipeline and each issue
//! their own `set`; the last one wins, and a deterministic pipeline makes
//! the competing artifacts byte-identical.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, error};

use crate::cache::{CacheKey, CacheStore};
use crate::error::ProxyError;
use crate::format::ImageFormat;
use crate::path::parse_path;
use crate::source::ImageSource;
use crate::transform::TransformPipeline;

// =============================================================================
// Proxy Response
// =============================================================================

/// The artifact produced for one request.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    /// The artifact bytes
    pub data: Bytes,

    /// The output format, determining the response `Content-Type`
    pub format: ImageFormat,

    /// Whether this artifact was served from cache
    pub cache_hit: bool,
}

// =============================================================================
// Proxy Service
// =============================================================================

/// Orchestrates the request-to-artifact pipeline.
///
/// All collaborators are injected at construction; the service holds no
/// per-request state and is shared across requests via `Arc`.
///
/// # Type Parameters
///
/// * `S` - The source backend (filesystem or remote HTTP)
pub struct ProxyService<S: ImageSource> {
    cache: CacheStore,
    source: Arc<S>,
    pipeline: TransformPipeline,
}

impl<S: ImageSource> ProxyService<S> {
    /// Create a service from its collaborators.
    pub fn new(cache: CacheStore, source: S, pipeline: TransformPipeline) -> Self {
        Self {
            cache,
            source: Arc::new(source),
            pipeline,
        }
    }

    /// Serve one request path.
    ///
    /// `raw_path` is the request path as received, leading slash included;
    /// it doubles as the cache identity, so spelling differences (directive
    /// order included) address distinct cache entries.
    pub async fn handle(&self, raw_path: &str) -> Result<ProxyResponse, ProxyError> {
        let request = parse_path(raw_path).ok_or(ProxyError::ParseMismatch)?;
        let key = CacheKey::new(raw_path);

        match self.cache.get(&key).await {
            Ok(Some(data)) => {
                debug!(path = raw_path, "cache hit");
                return Ok(ProxyResponse {
                    data,
                    format: request.target_format(),
                    cache_hit: true,
                });
            }
            Ok(None) => debug!(path = raw_path, "cache miss"),
            Err(e) => error!(path = raw_path, error = %e, "cache read failed, treating as miss"),
        }

        let source_bytes = self.source.fetch(&request.filename).await?;
        let data = self.pipeline.apply(source_bytes, &request).await?;

        if let Err(e) = self.cache.set(key, data.clone()).await {
            error!(path = raw_path, error = %e, "cache write failed, serving uncached artifact");
        }

        Ok(ProxyResponse {
            data,
            format: request.target_format(),
            cache_hit: false,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
