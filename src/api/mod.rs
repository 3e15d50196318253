//! HTTP API module
//!
//! This module contains the HTTP entry points that forward actions to the
//! session controller, and their response structures.

pub mod app_state;
pub mod handlers;
pub mod responses;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use app_state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/start", post(start_handler))
        .route("/stop", post(stop_handler))
        .route("/toggle", post(toggle_handler))
        .route("/next", post(next_handler))
        .route("/advance", post(advance_handler))
        .route("/restart", post(restart_handler))
        .route("/action/:name", post(action_handler))
        .route("/status", get(status_handler))
        .route("/timeouts", get(timeouts_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
