use thiserror::Error;

/// Errors that can occur while resolving and fetching a source image.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// The source image does not exist (local ENOENT)
    #[error("source not found: {0}")]
    NotFound(String),

    /// The remote origin answered with a non-200 status
    #[error("upstream returned {status} for {url}")]
    Upstream { url: String, status: u16 },

    /// Network or connection error while fetching from the remote origin
    #[error("transport error fetching {url}: {message}")]
    Transport { url: String, message: String },

    /// Unexpected local I/O error (anything other than not-found)
    #[error("I/O error reading {path}: {message}")]
    Io { path: String, message: String },
}

impl SourceError {
    /// Whether this error means the source simply does not exist.
    ///
    /// Not-found maps to HTTP 404; every other source failure is a 500.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Errors produced by the transform pipeline.
#[derive(Debug, Clone, Error)]
pub enum TransformError {
    /// The source bytes could not be decoded as an image.
    ///
    /// An unreadable source is treated like a missing source (HTTP 404).
    #[error("failed to decode source image: {0}")]
    Decode(String),

    /// A pipeline stage produced no or invalid output (HTTP 500).
    ///
    /// Covers encode failures, unsupported vector transforms, and optimizer
    /// subprocesses that crashed, hung, or returned empty output.
    #[error("{stage} stage failed: {message}")]
    Stage {
        stage: &'static str,
        message: String,
    },
}

impl TransformError {
    /// Shorthand constructor for a stage failure.
    pub fn stage(stage: &'static str, message: impl Into<String>) -> Self {
        Self::Stage {
            stage,
            message: message.into(),
        }
    }
}

/// A failure inside the cache storage engine.
///
/// Only returned for transport/engine failures; a cache miss is not an
/// error. Cache failures never fail a request: reads degrade to a miss and
/// writes are dropped, both after logging.
#[derive(Debug, Clone, Error)]
#[error("cache engine error: {0}")]
pub struct CacheError(pub String);

/// Per-request error at the orchestrator boundary.
///
/// Every internal failure that should surface to the caller is mapped to
/// exactly one of these variants; the HTTP layer turns them into 404 or 500
/// without leaking the underlying error text.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The request path does not match the image request grammar
    #[error("request path does not match the image grammar")]
    ParseMismatch,

    /// Resolving or fetching the source image failed
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The transform pipeline failed
    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl ProxyError {
    /// Whether this error maps to HTTP 404 rather than 500.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::ParseMismatch => true,
            Self::Source(e) => e.is_not_found(),
            Self::Transform(e) => matches!(e, TransformError::Decode(_)),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
