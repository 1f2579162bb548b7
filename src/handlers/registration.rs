//! Registration HTTP handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::error::ApiError;
use crate::models::{ConfirmRequest, RegisterRequest, UserIdResponse};
use crate::state::AppState;

/// POST /auth/register - Create an unconfirmed account and issue its confirmation link
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserIdResponse>), ApiError> {
    let user_id = state
        .registration
        .register_new_user(&req.email, &req.password)
        .await?;

    Ok((StatusCode::CREATED, Json(UserIdResponse { user_id })))
}

/// GET /auth/confirm?token= - Target of the emailed confirmation link
pub async fn confirm_link(
    State(state): State<AppState>,
    Query(req): Query<ConfirmRequest>,
) -> Result<Json<UserIdResponse>, ApiError> {
    confirm(&state, &req.token).await
}

/// POST /auth/confirm - Confirm an account with a token in the body
pub async fn confirm_body(
    State(state): State<AppState>,
    Json(req): Json<ConfirmRequest>,
) -> Result<Json<UserIdResponse>, ApiError> {
    confirm(&state, &req.token).await
}

async fn confirm(state: &AppState, token: &str) -> Result<Json<UserIdResponse>, ApiError> {
    let user_id = state.registration.confirm_new_user(token).await?;

    Ok(Json(UserIdResponse { user_id }))
}
