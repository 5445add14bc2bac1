//! HTTP server layer.
//!
//! The thin Axum shell over the orchestrator: a health route, the favicon
//! carve-out, and a fallback handler that feeds every other GET path into
//! the image pipeline. All error mapping to HTTP status codes lives here.

pub mod handlers;
pub mod routes;

pub use handlers::{
    favicon_handler, health_handler, image_handler, AppState, ErrorResponse, HealthResponse,
    INTERNAL_ERROR_MESSAGE,
};
pub use routes::{create_router, RouterConfig};
