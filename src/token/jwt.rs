//! JWT token generation and validation
//!
//! Handles creation and verification of operation-scoped tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Only symmetric HMAC-SHA256 tokens are minted or accepted
const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Token-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid operation type: {0}")]
    InvalidOperation(String),

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token was issued for '{actual}', expected '{expected}'")]
    WrongOperation {
        expected: Operation,
        actual: Operation,
    },

    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Token authority unavailable: {0}")]
    Unavailable(String),

    #[error("Token authority internal error: {0}")]
    Internal(String),
}

impl TokenError {
    /// Errors caused by the presented token rather than by infrastructure
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TokenError::InvalidOperation(_)
                | TokenError::InvalidSignature
                | TokenError::Expired
                | TokenError::Malformed(_)
                | TokenError::WrongOperation { .. }
        )
    }
}

/// Purpose a token was minted for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Access,
    Refresh,
    Confirmation,
}

impl Operation {
    /// Parse a wire operation name, rejecting anything outside the closed set
    pub fn parse(name: &str) -> Result<Self, TokenError> {
        match name {
            "access" => Ok(Operation::Access),
            "refresh" => Ok(Operation::Refresh),
            "confirmation" => Ok(Operation::Confirmation),
            other => Err(TokenError::InvalidOperation(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Access => "access",
            Operation::Refresh => "refresh",
            Operation::Confirmation => "confirmation",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifetime of each operation's tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTtls {
    pub access: Duration,
    pub refresh: Duration,
    pub confirmation: Duration,
}

impl TokenTtls {
    pub fn ttl(&self, operation: Operation) -> Duration {
        match operation {
            Operation::Access => self.access,
            Operation::Refresh => self.refresh,
            Operation::Confirmation => self.confirmation,
        }
    }
}

impl Default for TokenTtls {
    fn default() -> Self {
        Self {
            access: Duration::minutes(30),
            refresh: Duration::days(30),
            confirmation: Duration::hours(1),
        }
    }
}

/// JWT claims carried by every token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// Operation the token was minted for
    pub operation: Operation,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Subject and operation recovered from a verified token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedToken {
    pub subject: Uuid,
    pub operation: Operation,
}

impl VerifiedToken {
    /// Return the subject only if the token was minted for `expected`.
    ///
    /// Signature validity says nothing about intent; every caller must pass
    /// through here before trusting the subject.
    pub fn require(self, expected: Operation) -> Result<Uuid, TokenError> {
        match (expected, self.operation) {
            (Operation::Access, Operation::Access)
            | (Operation::Refresh, Operation::Refresh)
            | (Operation::Confirmation, Operation::Confirmation) => Ok(self.subject),
            (expected, actual) => Err(TokenError::WrongOperation { expected, actual }),
        }
    }
}

/// Sign a token for `subject`, valid for `operation` only
///
/// # Arguments
/// * `subject` - User the token is about
/// * `operation` - Purpose the token may be used for
/// * `secret` - Shared signing secret
/// * `ttls` - Lifetime table
pub fn issue(
    subject: Uuid,
    operation: Operation,
    secret: &str,
    ttls: &TokenTtls,
) -> Result<String, TokenError> {
    let now = Utc::now();
    let exp = now + ttls.ttl(operation);

    let claims = Claims {
        sub: subject,
        operation,
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };

    sign(&claims, secret)
}

/// Compose `base` with a freshly issued token
pub fn issue_link(
    base: &str,
    subject: Uuid,
    operation: Operation,
    secret: &str,
    ttls: &TokenTtls,
) -> Result<String, TokenError> {
    let token = issue(subject, operation, secret, ttls)?;
    Ok(format!("{}{}", base, token))
}

pub(crate) fn sign(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    encode(
        &Header::new(SIGNING_ALGORITHM),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| TokenError::EncodingFailed(e.to_string()))
}

/// Verify and decode a token
///
/// # Returns
/// * `Ok(VerifiedToken)` with the claims verbatim; the operation is not checked
/// * `Err(TokenError)` if the signature, algorithm, structure or expiry is wrong
pub fn validate(token: &str, secret: &str) -> Result<VerifiedToken, TokenError> {
    let mut validation = Validation::new(SIGNING_ALGORITHM);
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::InvalidSignature,
        _ => TokenError::Malformed(e.to_string()),
    })?;

    Ok(VerifiedToken {
        subject: token_data.claims.sub,
        operation: token_data.claims.operation,
    })
}
