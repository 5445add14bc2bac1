//! # image-proxy
//!
//! A caching image delivery proxy. Requests name a source image plus
//! optional transform directives in the final path segment; the server
//! produces the artifact on first request, caches it, and serves every
//! later identical request from the cache.
//!
//! ## Request grammar
//!
//! ```text
//! /<filename>[,w<width>][,h<height>][,<format>]
//!
//! /logo.png              original bytes, passed through untouched
//! /logo.png,w100         resized to width 100, height derived
//! /logo.png,w100,h50     resized to 100x50, center-cropped
//! /logo.png,w100,jpg     resized and converted to JPEG
//! ```
//!
//! ## Architecture
//!
//! - [`path`]: request grammar parsing into a [`path::TransformRequest`]
//! - [`format`]: the supported image format vocabulary
//! - [`source`]: local filesystem and remote HTTP origins behind
//!   [`source::ImageSource`]
//! - [`cache`]: cache-aside artifact store behind [`cache::CacheEngine`]
//! - [`transform`]: convert/resize/optimize pipeline and the supervised
//!   external optimizer subprocess
//! - [`proxy`]: the orchestrator tying parse → cache → fetch → transform
//!   together
//! - [`server`]: Axum routes and handlers
//! - [`config`]: CLI and environment configuration
//! - [`error`]: error taxonomy shared across layers
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use image_proxy::cache::{CacheStore, MemoryEngine};
//! use image_proxy::proxy::ProxyService;
//! use image_proxy::server::{create_router, RouterConfig};
//! use image_proxy::source::FileSystemSource;
//! use image_proxy::transform::{PipelineConfig, TransformPipeline};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = CacheStore::new(Arc::new(MemoryEngine::new()), Duration::from_secs(3600));
//! cache.start().await?;
//!
//! let source = FileSystemSource::new("/var/images");
//! let pipeline = TransformPipeline::new(PipelineConfig::default());
//! let service = ProxyService::new(cache, source, pipeline);
//!
//! let app = create_router(service, RouterConfig::new());
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:5678").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod format;
pub mod path;
pub mod proxy;
pub mod server;
pub mod source;
pub mod transform;

pub use config::Config;
pub use error::ProxyError;
pub use format::ImageFormat;
pub use path::{parse_path, TransformRequest};
pub use proxy::{ProxyResponse, ProxyService};
