//! Route definitions for the identity API

mod auth;
mod token;

pub use auth::auth_routes;
pub use token::token_routes;

use axum::Router;

use crate::state::AppState;

/// Every RPC route, without middleware or health checks
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(auth_routes()).merge(token_routes())
}
