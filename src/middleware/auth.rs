//! Authentication extractor
//!
//! Bearer access token verification and user extraction.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::SessionManager;
use crate::error::ApiError;

/// Authenticated user extracted from an access token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

/// Extractor for authenticated users
///
/// Verifies the Bearer token from the Authorization header and accepts it
/// only if it was minted for the `access` operation. Refresh and
/// confirmation tokens are rejected even when their signature is valid.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(user: AuthenticatedUser) -> impl IntoResponse {
///     format!("Hello, user {}", user.user_id)
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<SessionManager>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    ApiError::Unauthorized(
                        "Authorization header with Bearer token required".to_string(),
                    )
                    .into_response()
                })?;

        let session_manager = Arc::<SessionManager>::from_ref(state);

        let user_id = session_manager
            .authenticate(bearer.token())
            .await
            .map_err(|e| ApiError::from(e).into_response())?;

        Ok(AuthenticatedUser { user_id })
    }
}
