//! HTTP request handlers.
//!
//! # Endpoints
//!
//! - `GET /{path}` - Serve an image artifact (any path matching the grammar)
//! - `GET /health` - Health check endpoint
//! - `GET /favicon.ico` - Always 404, bypasses the pipeline
//!
//! # Error policy
//!
//! Internal failures never cross the HTTP boundary: every error collapses
//! to 404 or 500 with a generic body. 404s from normal traffic shape are
//! not logged; source/transform not-found conditions log at debug; server
//! errors log at error.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error};

use crate::error::ProxyError;
use crate::proxy::ProxyService;
use crate::source::ImageSource;

/// Body text for every 500 response.
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal server error occurred";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state, passed to handlers via Axum's State extractor.
pub struct AppState<S: ImageSource> {
    /// The orchestrator serving image requests
    pub service: Arc<ProxyService<S>>,
}

impl<S: ImageSource> AppState<S> {
    /// Create application state around the given service.
    pub fn new(service: ProxyService<S>) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

impl<S: ImageSource> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
///
/// Messages are generic by design; the underlying error text never leaves
/// the process.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g. "not_found")
    pub error: String,

    /// Generic human-readable message
    pub message: String,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Explicit carve-out: browsers ask for this on every visit and it is never
/// an image we serve.
pub async fn favicon_handler() -> Response {
    not_found_response()
}

/// Serve an image artifact for any path matching the request grammar.
pub async fn image_handler<S: ImageSource>(
    State(state): State<AppState<S>>,
    uri: Uri,
) -> Response {
    match state.service.handle(uri.path()).await {
        Ok(artifact) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, artifact.format.mime())],
            artifact.data,
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert ProxyError to an HTTP response per the error taxonomy:
/// parse mismatch and not-found conditions are 404, everything else 500.
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        if self.is_not_found() {
            // Parse mismatches are normal traffic shape and not worth a log
            // line; real not-found conditions are common enough for debug.
            if !matches!(self, ProxyError::ParseMismatch) {
                debug!(error = %self, "image not found");
            }
            return not_found_response();
        }

        error!(error = %self, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("internal_error", INTERNAL_ERROR_MESSAGE)),
        )
            .into_response()
    }
}

fn not_found_response() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("not_found", "Not Found")),
    )
        .into_response()
}

// =============================================================================
// Tests
// =============================================================================
