//! Request orchestration layer.
//!
//! Sits between the HTTP handlers and the cache/source/transform
//! components:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              ProxyService               │
//! │  parse → cache → fetch → transform →    │
//! │  store → respond                        │
//! └──────┬──────────────┬──────────────┬────┘
//!        ▼              ▼              ▼
//!  ┌──────────┐  ┌─────────────┐  ┌──────────────────┐
//!  │CacheStore│  │ ImageSource │  │TransformPipeline │
//!  └──────────┘  └─────────────┘  └──────────────────┘
//! ```

mod service;

pub use service::{ProxyResponse, ProxyService};
