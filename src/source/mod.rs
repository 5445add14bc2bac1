//! Source image resolution and fetching.
//!
//! A deployment configures a single source base: either a directory on the
//! local filesystem or a base URL on a remote origin. Classification is by
//! prefix — a base beginning with `http://` or `https://` is remote,
//! everything else is local.
//!
//! Both backends implement [`ImageSource`], the seam the orchestrator works
//! against. Joining the base with a requested filename never produces
//! double slashes or missing separators, and remote joins preserve
//! credentials embedded in the base URL.

mod fs;
mod http;

pub use fs::FileSystemSource;
pub use http::HttpSource;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::SourceError;

/// Whether a configured source base names a remote origin.
pub fn is_remote(base: &str) -> bool {
    base.starts_with("http://") || base.starts_with("https://")
}

/// A backend that can produce the raw bytes of a source image.
///
/// Implementations are shared across requests and must be internally
/// synchronized (both provided backends are immutable after construction).
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Fetch the raw bytes of `filename`, resolved against the source base.
    async fn fetch(&self, filename: &str) -> Result<Bytes, SourceError>;
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_classification() {
        assert!(is_remote("http://host/imgs"));
        assert!(is_remote("https://host/imgs"));
        assert!(!is_remote("/var/images"));
        assert!(!is_remote("images"));
        assert!(!is_remote("ftp://host/imgs"));
        assert!(!is_remote(""));
    }
}
