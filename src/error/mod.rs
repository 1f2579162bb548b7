//! Centralized API error handling for the identity service
//!
//! This module provides a unified error type for API responses with stable
//! machine-readable codes, HTTP status code mapping and JSON error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::AuthError;
use crate::registration::RegistrationError;
use crate::storage::StorageError;
use crate::token::TokenError;

/// API error type with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid operation type: {0}")]
    InvalidOperation(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("User not confirmed")]
    UserNotConfirmed,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Session already exists")]
    SessionAlreadyExists,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// JSON error response body
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

/// Error details in the response
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl ApiError {
    /// Get the error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest(_) => "INVALID_REQUEST",
            ApiError::InvalidOperation(_) => "INVALID_OPERATION",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::UserNotFound => "USER_NOT_FOUND",
            ApiError::UserNotConfirmed => "USER_NOT_CONFIRMED",
            ApiError::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            ApiError::SessionAlreadyExists => "SESSION_ALREADY_EXISTS",
            ApiError::InvalidToken(_) => "INVALID_TOKEN",
            ApiError::TokenExpired => "TOKEN_EXPIRED",
            ApiError::InvalidSignature => "INVALID_SIGNATURE",
            ApiError::MalformedToken(_) => "MALFORMED_TOKEN",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidOperation(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::UserNotFound => StatusCode::NOT_FOUND,
            ApiError::UserNotConfirmed => StatusCode::FORBIDDEN,
            ApiError::EmailAlreadyExists => StatusCode::CONFLICT,
            ApiError::SessionAlreadyExists => StatusCode::CONFLICT,
            ApiError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            ApiError::TokenExpired => StatusCode::UNAUTHORIZED,
            ApiError::InvalidSignature => StatusCode::UNAUTHORIZED,
            ApiError::MalformedToken(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Message safe to return to the caller
    fn public_message(&self) -> String {
        match self {
            ApiError::InternalError(_) | ApiError::DatabaseError(_) => {
                "Internal server error".to_string()
            }
            ApiError::ServiceUnavailable(_) => "Service temporarily unavailable".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Log server errors
        match &self {
            ApiError::InternalError(_)
            | ApiError::DatabaseError(_)
            | ApiError::ServiceUnavailable(_) => {
                tracing::error!(error = %self, code = %error_code, "Server error occurred");
            }
            _ => {
                tracing::debug!(error = %self, code = %error_code, "Client error occurred");
            }
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code: error_code.to_string(),
                message: self.public_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

// Conversions from the service error types

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidOperation(op) => ApiError::InvalidOperation(op),
            TokenError::InvalidSignature => ApiError::InvalidSignature,
            TokenError::Expired => ApiError::TokenExpired,
            TokenError::Malformed(msg) => ApiError::MalformedToken(msg),
            e @ TokenError::WrongOperation { .. } => ApiError::InvalidToken(e.to_string()),
            TokenError::EncodingFailed(msg) | TokenError::Internal(msg) => {
                ApiError::InternalError(msg)
            }
            TokenError::Unavailable(msg) => ApiError::ServiceUnavailable(msg),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::DatabaseError(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::UserNotFound => ApiError::UserNotFound,
            AuthError::UserNotConfirmed => ApiError::UserNotConfirmed,
            AuthError::InvalidCredentials => ApiError::InvalidCredentials,
            AuthError::SessionAlreadyExists => ApiError::SessionAlreadyExists,
            AuthError::Token(e) => e.into(),
            AuthError::PasswordHash(msg) => ApiError::InternalError(msg),
            AuthError::Storage(e) => e.into(),
        }
    }
}

impl From<RegistrationError> for ApiError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::InvalidRequest(msg) => ApiError::InvalidRequest(msg),
            RegistrationError::PasswordHash(msg) => ApiError::InternalError(msg),
            RegistrationError::EmailAlreadyExists => ApiError::EmailAlreadyExists,
            RegistrationError::UserNotFound => ApiError::UserNotFound,
            RegistrationError::Token(e) => e.into(),
            RegistrationError::Storage(e) => e.into(),
        }
    }
}
