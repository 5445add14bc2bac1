//! Configuration management.
//!
//! All options are available as command-line arguments and as environment
//! variables with the `IMGPROXY_` prefix (the port additionally honors the
//! conventional `PORT` variable). Every optional setting has a documented
//! default; validation happens once at startup, never per request.
//!
//! # Environment Variables
//!
//! - `IMGPROXY_SOURCE` - Base directory or base URL for source images (required)
//! - `IMGPROXY_HOST` - Server bind address (default: 0.0.0.0)
//! - `PORT` - Server port (default: 5678)
//! - `IMGPROXY_CACHE_ENGINE` - Cache storage engine (default: memory)
//! - `IMGPROXY_CACHE_TTL_MS` - Cache entry TTL in milliseconds (default: 3600000)
//! - `IMGPROXY_CACHE_BYTES` - Memory engine byte capacity (default: 100MB)
//! - `IMGPROXY_CACHE_ENTRIES` - Memory engine entry capacity (default: 10000)
//! - `IMGPROXY_FETCH_TIMEOUT` - Remote fetch timeout in seconds (default: 30)
//! - `IMGPROXY_JPEG_QUALITY` - JPEG recompression quality (default: 75)
//! - `IMGPROXY_JPG_OPTIMIZER` / `..._PNG_...` / `..._GIF_...` / `..._SVG_...`
//!   - External optimizer commands per output format (default: none)
//! - `IMGPROXY_OPTIMIZER_TIMEOUT` - Optimizer subprocess timeout in seconds
//!   (default: 10)

use std::time::Duration;

use clap::Parser;

use crate::cache::{DEFAULT_MEMORY_CACHE_BYTES, DEFAULT_MEMORY_CACHE_ENTRIES, DEFAULT_TTL_MS};
use crate::transform::{OptimizerCommand, PipelineConfig, DEFAULT_JPEG_QUALITY};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 5678;

/// Default cache engine selector.
pub const DEFAULT_CACHE_ENGINE: &str = "memory";

/// Default remote fetch timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Default optimizer subprocess timeout in seconds.
pub const DEFAULT_OPTIMIZER_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// CLI Arguments
// =============================================================================

/// image-proxy - A caching image delivery proxy.
///
/// Serves resized and optimized images from a local directory or a remote
/// origin, producing each artifact on first request and caching it.
#[derive(Parser, Debug, Clone)]
#[command(name = "image-proxy")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "IMGPROXY_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PORT")]
    pub port: u16,

    // =========================================================================
    // Source Configuration
    // =========================================================================
    /// Base directory or base URL for source images.
    ///
    /// A base beginning with http:// or https:// is treated as a remote
    /// origin; anything else as a local directory.
    #[arg(long, env = "IMGPROXY_SOURCE")]
    pub source: String,

    /// Timeout in seconds for remote source fetches.
    #[arg(long, default_value_t = DEFAULT_FETCH_TIMEOUT_SECS, env = "IMGPROXY_FETCH_TIMEOUT")]
    pub fetch_timeout: u64,

    // =========================================================================
    // Cache Configuration
    // =========================================================================
    /// Cache storage engine.
    #[arg(long, default_value = DEFAULT_CACHE_ENGINE, env = "IMGPROXY_CACHE_ENGINE")]
    pub cache_engine: String,

    /// Cache entry TTL in milliseconds.
    #[arg(long, default_value_t = DEFAULT_TTL_MS, env = "IMGPROXY_CACHE_TTL_MS")]
    pub cache_ttl_ms: u64,

    /// Maximum artifact bytes held by the memory cache engine.
    #[arg(long, default_value_t = DEFAULT_MEMORY_CACHE_BYTES, env = "IMGPROXY_CACHE_BYTES")]
    pub cache_bytes: usize,

    /// Maximum number of cached artifacts.
    #[arg(long, default_value_t = DEFAULT_MEMORY_CACHE_ENTRIES, env = "IMGPROXY_CACHE_ENTRIES")]
    pub cache_entries: usize,

    // =========================================================================
    // Transform Configuration
    // =========================================================================
    /// JPEG recompression quality (1-100).
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, env = "IMGPROXY_JPEG_QUALITY")]
    pub jpeg_quality: u8,

    /// External optimizer command for jpg artifacts (stdin → stdout filter).
    #[arg(long, env = "IMGPROXY_JPG_OPTIMIZER")]
    pub jpg_optimizer: Option<String>,

    /// External optimizer command for png artifacts (stdin → stdout filter).
    #[arg(long, env = "IMGPROXY_PNG_OPTIMIZER")]
    pub png_optimizer: Option<String>,

    /// External optimizer command for gif artifacts (stdin → stdout filter).
    #[arg(long, env = "IMGPROXY_GIF_OPTIMIZER")]
    pub gif_optimizer: Option<String>,

    /// External optimizer command for svg artifacts (stdin → stdout filter).
    #[arg(long, env = "IMGPROXY_SVG_OPTIMIZER")]
    pub svg_optimizer: Option<String>,

    /// Timeout in seconds for one optimizer subprocess run.
    #[arg(long, default_value_t = DEFAULT_OPTIMIZER_TIMEOUT_SECS, env = "IMGPROXY_OPTIMIZER_TIMEOUT")]
    pub optimizer_timeout: u64,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.source.is_empty() {
            return Err("Source is required. Set --source or IMGPROXY_SOURCE".to_string());
        }

        if self.cache_engine != DEFAULT_CACHE_ENGINE {
            return Err(format!(
                "Unknown cache engine '{}' (supported: memory)",
                self.cache_engine
            ));
        }

        if self.cache_ttl_ms == 0 {
            return Err("cache_ttl_ms must be greater than 0".to_string());
        }
        if self.cache_bytes == 0 {
            return Err("cache_bytes must be greater than 0".to_string());
        }
        if self.cache_entries == 0 {
            return Err("cache_entries must be greater than 0".to_string());
        }

        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err("jpeg_quality must be between 1 and 100".to_string());
        }

        if self.fetch_timeout == 0 {
            return Err("fetch_timeout must be greater than 0".to_string());
        }
        if self.optimizer_timeout == 0 {
            return Err("optimizer_timeout must be greater than 0".to_string());
        }

        for (name, spec) in [
            ("jpg_optimizer", &self.jpg_optimizer),
            ("png_optimizer", &self.png_optimizer),
            ("gif_optimizer", &self.gif_optimizer),
            ("svg_optimizer", &self.svg_optimizer),
        ] {
            if let Some(spec) = spec {
                if spec.split_whitespace().next().is_none() {
                    return Err(format!("{name} must name a program to run"));
                }
            }
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The cache TTL as a duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    /// The remote fetch timeout as a duration.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout)
    }

    /// Build the transform pipeline options (call validate() first).
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            jpeg_quality: self.jpeg_quality,
            jpg_optimizer: self.optimizer(&self.jpg_optimizer),
            png_optimizer: self.optimizer(&self.png_optimizer),
            gif_optimizer: self.optimizer(&self.gif_optimizer),
            svg_optimizer: self.optimizer(&self.svg_optimizer),
        }
    }

    fn optimizer(&self, spec: &Option<String>) -> Option<OptimizerCommand> {
        spec.as_deref()
            .and_then(OptimizerCommand::parse)
            .map(|cmd| cmd.with_timeout(Duration::from_secs(self.optimizer_timeout)))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            source: "/var/images".to_string(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT_SECS,
            cache_engine: "memory".to_string(),
            cache_ttl_ms: DEFAULT_TTL_MS,
            cache_bytes: DEFAULT_MEMORY_CACHE_BYTES,
            cache_entries: DEFAULT_MEMORY_CACHE_ENTRIES,
            jpeg_quality: 75,
            jpg_optimizer: None,
            png_optimizer: None,
            gif_optimizer: None,
            svg_optimizer: None,
            optimizer_timeout: DEFAULT_OPTIMIZER_TIMEOUT_SECS,
            verbose: false,
            no_tracing: false,
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_missing_source() {
        let mut config = test_config();
        config.source = String::new();

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Source"));
    }

    #[test]
    fn test_unknown_cache_engine() {
        let mut config = test_config();
        config.cache_engine = "redis".to_string();

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("cache engine"));
    }

    #[test]
    fn test_invalid_cache_sizes() {
        let mut config = test_config();
        config.cache_ttl_ms = 0;
        assert!(config.validate().is_err());

        let mut config = test_config();
        config.cache_bytes = 0;
        assert!(config.validate().is_err());

        let mut config = test_config();
        config.cache_entries = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_jpeg_quality() {
        let mut config = test_config();
        config.jpeg_quality = 0;
        assert!(config.validate().is_err());

        let mut config = test_config();
        config.jpeg_quality = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_optimizer_rejected() {
        let mut config = test_config();
        config.svg_optimizer = Some("   ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(test_config().bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_default_ttl_is_one_hour() {
        assert_eq!(test_config().cache_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn test_pipeline_config_carries_optimizers() {
        let mut config = test_config();
        config.svg_optimizer = Some("svgo -i - -o -".to_string());

        let pipeline = config.pipeline_config();
        assert_eq!(pipeline.jpeg_quality, 75);
        assert!(pipeline.jpg_optimizer.is_none());
        assert_eq!(pipeline.svg_optimizer.unwrap().program(), "svgo");
    }
}
