//! Local filesystem source.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::SourceError;

use super::ImageSource;

/// Serves source images from a base directory.
#[derive(Debug, Clone)]
pub struct FileSystemSource {
    root: PathBuf,
}

impl FileSystemSource {
    /// Create a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The base directory this source reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join the base directory with a requested filename.
    pub fn full_path(&self, filename: &str) -> PathBuf {
        self.root.join(filename.trim_start_matches('/'))
    }
}

#[async_trait]
impl ImageSource for FileSystemSource {
    async fn fetch(&self, filename: &str) -> Result<Bytes, SourceError> {
        let path = self.full_path(filename);
        debug!(path = %path.display(), "reading source image");

        match tokio::fs::read(&path).await {
            Ok(payload) => Ok(Bytes::from(payload)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(SourceError::NotFound(filename.to_string()))
            }
            Err(e) => Err(SourceError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            }),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_path_joins_without_doubling() {
        let source = FileSystemSource::new("/var/images");
        assert_eq!(
            source.full_path("photo.jpg"),
            PathBuf::from("/var/images/photo.jpg")
        );
        assert_eq!(
            source.full_path("/photo.jpg"),
            PathBuf::from("/var/images/photo.jpg")
        );
        assert_eq!(
            source.full_path("albums/photo.jpg"),
            PathBuf::from("/var/images/albums/photo.jpg")
        );
    }

    #[tokio::test]
    async fn test_fetch_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("photo.jpg"), b"jpeg bytes").unwrap();

        let source = FileSystemSource::new(dir.path());
        let bytes = source.fetch("photo.jpg").await.unwrap();
        assert_eq!(&bytes[..], b"jpeg bytes");
    }

    #[tokio::test]
    async fn test_fetch_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSystemSource::new(dir.path());

        let err = source.fetch("missing.jpg").await.unwrap_err();
        assert!(matches!(err, SourceError::NotFound(ref f) if f == "missing.jpg"));
    }

    #[tokio::test]
    async fn test_fetch_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub.jpg")).unwrap();

        let source = FileSystemSource::new(dir.path());
        let err = source.fetch("sub.jpg").await.unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }
}
