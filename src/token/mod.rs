//! Token authority
//!
//! Stateless signer and verifier of operation-scoped, time-bounded tokens.
//! - HS256 JWTs carrying subject, operation, issue and expiry times
//! - Per-operation lifetimes (access, refresh, confirmation)
//! - Local and remote clients behind a single `TokenClient` seam

mod client;
mod jwt;

pub use client::{with_timeout, HttpTokenClient, LocalTokenClient, TokenClient};
pub use jwt::{
    issue, issue_link, validate, Claims, Operation, TokenError, TokenTtls, VerifiedToken,
};

use uuid::Uuid;

/// Token authority bound to one signing secret and lifetime table
#[derive(Clone)]
pub struct TokenAuthority {
    secret: String,
    ttls: TokenTtls,
}

impl TokenAuthority {
    /// Create a new TokenAuthority
    pub fn new(secret: String, ttls: TokenTtls) -> Self {
        Self { secret, ttls }
    }

    pub fn issue(&self, subject: Uuid, operation: Operation) -> Result<String, TokenError> {
        let token = issue(subject, operation, &self.secret, &self.ttls)?;
        tracing::debug!(user_id = %subject, operation = %operation, "Token issued");
        Ok(token)
    }

    pub fn validate(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        validate(token, &self.secret).map_err(|e| {
            if e.is_client_error() {
                tracing::debug!(error = %e, "Token rejected");
            } else {
                tracing::error!(error = %e, "Token verification failed");
            }
            e
        })
    }

    pub fn issue_link(
        &self,
        base: &str,
        subject: Uuid,
        operation: Operation,
    ) -> Result<String, TokenError> {
        issue_link(base, subject, operation, &self.secret, &self.ttls)
    }
}

impl std::fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("ttls", &self.ttls)
            .finish_non_exhaustive()
    }
}
