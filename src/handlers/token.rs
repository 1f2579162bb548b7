//! Token authority HTTP handlers
//!
//! RPC endpoints other services use to mint and check tokens.

use axum::{extract::State, Json};

use crate::error::ApiError;
use crate::models::{
    GenerateLinkRequest, GenerateTokenRequest, LinkResponse, TokenResponse, ValidateTokenRequest,
};
use crate::state::AppState;
use crate::token::{Operation, VerifiedToken};

/// POST /token/generate - Mint a token for a subject and operation
pub async fn generate_token(
    State(state): State<AppState>,
    Json(req): Json<GenerateTokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let operation = Operation::parse(&req.operation)?;
    let token = state.token_authority.issue(req.subject, operation)?;

    Ok(Json(TokenResponse { token }))
}

/// POST /token/validate - Return the subject and operation of a valid token
///
/// The operation is reported, not enforced; callers check it themselves.
pub async fn validate_token(
    State(state): State<AppState>,
    Json(req): Json<ValidateTokenRequest>,
) -> Result<Json<VerifiedToken>, ApiError> {
    let verified = state.token_authority.validate(&req.token)?;

    Ok(Json(verified))
}

/// POST /token/link - Mint a token and append it to a link base
pub async fn generate_link(
    State(state): State<AppState>,
    Json(req): Json<GenerateLinkRequest>,
) -> Result<Json<LinkResponse>, ApiError> {
    if req.base.is_empty() {
        return Err(ApiError::InvalidRequest("link base must not be empty".to_string()));
    }

    let operation = Operation::parse(&req.operation)?;
    let link = state
        .token_authority
        .issue_link(&req.base, req.subject, operation)?;

    Ok(Json(LinkResponse { link }))
}
