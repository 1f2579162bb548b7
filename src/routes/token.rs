//! Token authority routes

use axum::{routing::post, Router};

use crate::handlers::token;
use crate::state::AppState;

/// Create token authority routes
pub fn token_routes() -> Router<AppState> {
    Router::new()
        .route("/token/generate", post(token::generate_token))
        .route("/token/validate", post(token::validate_token))
        .route("/token/link", post(token::generate_link))
}
