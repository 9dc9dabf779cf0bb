//! Status and stats handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::dto::response::{StatsResponse, StatusResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// GET /status
///
/// 200 when both the store and the broker answer, 500 otherwise. The body
/// has the same shape either way.
pub async fn get_status(State(state): State<AppState>) -> (StatusCode, Json<StatusResponse>) {
    let status = state.system_service.status().await;
    let code = if status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (code, Json(status.into()))
}

/// GET /stats
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.system_service.stats().await?;
    Ok(Json(stats.into()))
}
