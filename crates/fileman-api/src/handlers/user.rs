//! User registration handler.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;

use crate::dto::request::CreateUserRequest;
use crate::dto::response::UserCreatedResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// POST /users
///
/// A body that is not a JSON object is treated as an empty one, so the
/// client gets `Missing email` rather than a parser error.
pub async fn post_new(
    State(state): State<AppState>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserCreatedResponse>), ApiError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let user = state.user_service.register(req.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(UserCreatedResponse {
            id: user.id,
            email: user.email,
        }),
    ))
}
