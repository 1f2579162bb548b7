//! Authentication HTTP handlers
//!
//! Endpoints for password login.

use axum::{extract::State, Json};

use super::AuthenticatedUser;
use crate::error::ApiError;
use crate::models::{LoginRequest, LoginResponse, UserResponse};
use crate::state::AppState;

/// POST /auth/login - Verify credentials and open a session
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let tokens = state
        .session_manager
        .login_user(&req.username, &req.password)
        .await?;

    Ok(Json(tokens))
}

/// GET /auth/me - Get current authenticated user
pub async fn get_current_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.session_manager.get_user_by_id(user.user_id).await?;

    Ok(Json(user.into()))
}
