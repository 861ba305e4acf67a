//! API Routes
//!
//! Configures the Axum router with the resize endpoint and its middleware.

use std::time::Duration;

use axum::{routing::get, Router};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use super::handlers::{health_handler, resize_handler, stats_handler, AppState};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /?url=&width=&height=` - Resized JPEG
/// - `GET /stats` - Get cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - Tracing: Logs all requests
/// - Timeout: Requests running longer than `request_timeout` get 408
/// - Concurrency: At most `max_concurrent` requests are processed at once;
///   the rest wait for a slot, and the wait counts against the timeout
pub fn create_router(state: AppState, request_timeout: Duration, max_concurrent: usize) -> Router {
    Router::new()
        .route("/", get(resize_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(GlobalConcurrencyLimitLayer::new(max_concurrent))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
