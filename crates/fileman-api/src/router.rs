//! Route definitions for the Files Manager HTTP API.
//!
//! The router receives `AppState` and passes it to all handlers via Axum's
//! `State` extractor.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = middleware::cors::build_cors_layer(&state.config.server.cors);

    Router::new()
        .merge(app_routes())
        .merge(user_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Liveness and counters
fn app_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(handlers::app::get_status))
        .route("/stats", get(handlers::app::get_stats))
}

/// User registration
fn user_routes() -> Router<AppState> {
    Router::new().route("/users", post(handlers::user::post_new))
}
