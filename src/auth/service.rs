//! Credential and session service
//!
//! Core business logic for password login with a single active session per user.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{LoginResponse, User, MAX_PASSWORD_BYTES};
use crate::storage::{SessionStore, StorageError, UserStore};
use crate::token::{with_timeout, Operation, TokenClient, TokenError};

/// Auth service errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("User not found")]
    UserNotFound,

    #[error("User not confirmed")]
    UserNotConfirmed,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Session already exists")]
    SessionAlreadyExists,

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Credential and session manager
#[derive(Clone)]
pub struct SessionManager {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    tokens: Arc<dyn TokenClient>,
    token_timeout: Duration,
}

impl SessionManager {
    /// Create a new SessionManager
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        tokens: Arc<dyn TokenClient>,
        token_timeout: Duration,
    ) -> Self {
        Self {
            users,
            sessions,
            tokens,
            token_timeout,
        }
    }

    /// Authenticate by email and password, then open the user's only session
    pub async fn login_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginResponse, AuthError> {
        let user = self
            .users
            .find_by_email(username)
            .await
            .map_err(|e| match e {
                StorageError::NotFound => AuthError::UserNotFound,
                other => AuthError::Storage(other),
            })?;

        // Unconfirmed accounts never authenticate, whatever the password
        if !user.is_confirmed {
            tracing::warn!(user_id = %user.id, "Login attempt for unconfirmed user");
            return Err(AuthError::UserNotConfirmed);
        }

        if !verify_password(password, &user.password_hash).await? {
            tracing::warn!(user_id = %user.id, "Invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = with_timeout(
            self.token_timeout,
            self.tokens.generate_token(user.id, Operation::Access),
        )
        .await?;

        let refresh_token = with_timeout(
            self.token_timeout,
            self.tokens.generate_token(user.id, Operation::Refresh),
        )
        .await?;

        self.sessions
            .insert_session(user.id, &refresh_token)
            .await
            .map_err(|e| match e {
                StorageError::UniqueViolation => {
                    tracing::warn!(user_id = %user.id, "Session already exists");
                    AuthError::SessionAlreadyExists
                }
                other => AuthError::Storage(other),
            })?;

        tracing::info!(user_id = %user.id, "Session created");

        Ok(LoginResponse {
            user_id: user.id,
            access_token,
            refresh_token,
        })
    }

    /// Resolve an access token to the user it was issued for
    pub async fn authenticate(&self, access_token: &str) -> Result<Uuid, AuthError> {
        let verified = with_timeout(self.token_timeout, self.tokens.validate_token(access_token))
            .await?;

        Ok(verified.require(Operation::Access)?)
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, user_id: Uuid) -> Result<User, AuthError> {
        self.users.find_by_id(user_id).await.map_err(|e| match e {
            StorageError::NotFound => AuthError::UserNotFound,
            other => AuthError::Storage(other),
        })
    }
}

/// Constant-time bcrypt comparison, off the async executor
///
/// Candidates longer than bcrypt's input limit never match, since bcrypt
/// would only compare their prefix.
async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AuthError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Ok(false);
    }

    let password = password.to_string();
    let password_hash = password_hash.to_string();

    tokio::task::spawn_blocking(move || bcrypt::verify(password, &password_hash))
        .await
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}
