// crates/server/src/lib.rs
//! Pipeline server library.
//!
//! Axum HTTP server that accepts CSV uploads, runs one background job per
//! file and lets clients pause, resume, terminate and inspect those jobs.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod storage;

pub use config::Config;
pub use error::*;
pub use routes::api_routes;
pub use state::AppState;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes and middleware.
///
/// This sets up:
/// - API routes (health, upload, job control)
/// - Request body limit from `AppState::max_upload_bytes`
/// - CORS (allows any origin)
/// - Request tracing
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .merge(api_routes(state))
        .layer(body_limit)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// Integration Tests
// ============================================================================
