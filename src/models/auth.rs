//! Authentication and registration models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// bcrypt only hashes this many bytes of a password
pub const MAX_PASSWORD_BYTES: usize = 72;

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Login credentials
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Tokens issued on a successful login
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
}

/// New account request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(
        length(min = 8, message = "password must be at least 8 characters"),
        custom = "validate_password"
    )]
    pub password: String,
}

/// Passwords may not contain whitespace or exceed what bcrypt can hash
fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().any(char::is_whitespace) {
        let mut err = ValidationError::new("whitespace");
        err.message = Some("password must not contain whitespace".into());
        return Err(err);
    }
    if password.len() > MAX_PASSWORD_BYTES {
        let mut err = ValidationError::new("too_long");
        err.message = Some("password must be at most 72 bytes".into());
        return Err(err);
    }
    Ok(())
}

/// Registered or confirmed account
#[derive(Debug, Serialize, Deserialize)]
pub struct UserIdResponse {
    pub user_id: Uuid,
}

/// Confirmation token, from the link's query string or a JSON body
#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub token: String,
}

/// User response (sanitized for API)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub is_confirmed: bool,
    pub created_at: DateTime<Utc>,
}
