//! Token authority RPC bodies

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to mint a token; `operation` is parsed by the authority
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateTokenRequest {
    pub subject: Uuid,
    pub operation: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateTokenRequest {
    pub token: String,
}

/// Request to mint a token and append it to `base`
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateLinkRequest {
    pub base: String,
    pub subject: Uuid,
    pub operation: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LinkResponse {
    pub link: String,
}
