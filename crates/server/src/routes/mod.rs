//! API route handlers for the pipeline server.

pub mod health;
pub mod jobs;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router.
///
/// Routes:
/// - GET  /health      - Health check
/// - POST /upload      - Upload a CSV file and start its job
/// - POST /status      - Status and progress of a job
/// - POST /pause       - Pause a running job
/// - POST /resume      - Resume a paused job
/// - POST /terminate   - Terminate a running or paused job
/// - GET  /jobs        - All job snapshots
/// - GET  /jobs/stream - SSE stream of job snapshots
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::router())
        .merge(jobs::router())
        .with_state(state)
}
