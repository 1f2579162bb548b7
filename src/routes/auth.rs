//! Authentication and registration routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{auth, registration};
use crate::state::AppState;

/// Create authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::get_current_user))
        .route("/auth/register", post(registration::register))
        .route(
            "/auth/confirm",
            get(registration::confirm_link).post(registration::confirm_body),
        )
}
