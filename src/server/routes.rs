//! Router configuration.
//!
//! # Route Structure
//!
//! ```text
//! /health         - Health check
//! /favicon.ico    - Always 404 (explicit carve-out)
//! /{path}         - Image artifact (fallback, grammar-matched paths)
//! ```
//!
//! Image paths carry directives in the final segment (`/a.jpg,w100,png`),
//! so they are matched by the orchestrator's parser rather than the
//! router; everything that is not a named route falls through to the image
//! handler.

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{favicon_handler, health_handler, image_handler, AppState};
use crate::proxy::ProxyService;
use crate::source::ImageSource;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a configuration with tracing enabled.
    pub fn new() -> Self {
        Self {
            enable_tracing: true,
        }
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the application router around a [`ProxyService`].
pub fn create_router<S>(service: ProxyService<S>, config: RouterConfig) -> Router
where
    S: ImageSource + 'static,
{
    let state = AppState::new(service);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/favicon.ico", get(favicon_handler))
        .fallback(get(image_handler::<S>))
        .with_state(state);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_config_defaults() {
        let config = RouterConfig::new();
        assert!(config.enable_tracing);
    }

    #[test]
    fn test_router_config_builder() {
        let config = RouterConfig::new().with_tracing(false);
        assert!(!config.enable_tracing);
    }
}
