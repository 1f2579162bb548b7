//! Registration service
//!
//! Two-step saga: insert the user, then obtain a confirmation link from the
//! token authority. If the second step fails the user row is deleted again.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::models::RegisterRequest;
use crate::notify::Notifier;
use crate::storage::{StorageError, UserStore};
use crate::token::{with_timeout, Operation, TokenClient, TokenError};

/// Registration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("User not found")]
    UserNotFound,

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Registration saga
#[derive(Clone)]
pub struct RegistrationSaga {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn TokenClient>,
    notifier: Option<Arc<dyn Notifier>>,
    confirmation_link_base: String,
    token_timeout: Duration,
    bcrypt_cost: u32,
}

impl RegistrationSaga {
    /// Create a new RegistrationSaga
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn TokenClient>,
        confirmation_link_base: String,
        token_timeout: Duration,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            users,
            tokens,
            notifier: None,
            confirmation_link_base,
            token_timeout,
            bcrypt_cost,
        }
    }

    /// Deliver confirmation links through `notifier`
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Register a new, unconfirmed account and return its ID
    pub async fn register_new_user(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Uuid, RegistrationError> {
        let request = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        request
            .validate()
            .map_err(|e| RegistrationError::InvalidRequest(e.to_string()))?;

        let password_hash = self.hash_password(password).await?;

        let user_id = self
            .users
            .insert_user(email, &password_hash)
            .await
            .map_err(|e| match e {
                StorageError::UniqueViolation => {
                    tracing::warn!(email = %email, "Email already exists");
                    RegistrationError::EmailAlreadyExists
                }
                other => RegistrationError::Storage(other),
            })?;

        tracing::info!(user_id = %user_id, "User saved");

        let link = match with_timeout(
            self.token_timeout,
            self.tokens.generate_link(
                &self.confirmation_link_base,
                user_id,
                Operation::Confirmation,
            ),
        )
        .await
        {
            Ok(link) => link,
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Confirmation link generation failed");
                self.rollback_user(user_id).await;
                return Err(e.into());
            }
        };

        tracing::info!(user_id = %user_id, "Confirmation link generated");

        // The minted link is enough forward progress; delivery failures do not roll back
        if let Some(notifier) = &self.notifier {
            if let Err(e) = notifier.send(email, &link).await {
                tracing::error!(user_id = %user_id, error = %e, "Failed to send confirmation link");
            }
        }

        Ok(user_id)
    }

    /// Confirm the account a confirmation token was issued for
    pub async fn confirm_new_user(&self, token: &str) -> Result<Uuid, RegistrationError> {
        let verified = with_timeout(self.token_timeout, self.tokens.validate_token(token)).await?;

        let user_id = verified.require(Operation::Confirmation).map_err(|e| {
            tracing::warn!(error = %e, "Rejected token issued for another operation");
            e
        })?;

        self.users
            .confirm_user(user_id)
            .await
            .map_err(|e| match e {
                StorageError::NotFound => RegistrationError::UserNotFound,
                other => RegistrationError::Storage(other),
            })?;

        tracing::info!(user_id = %user_id, "Account confirmed");

        Ok(user_id)
    }

    /// Compensating delete; its own failure is logged, never returned
    async fn rollback_user(&self, user_id: Uuid) {
        match self.users.delete_user(user_id).await {
            Ok(()) => tracing::warn!(user_id = %user_id, "Compensating delete, user removed"),
            Err(e) => tracing::error!(
                user_id = %user_id,
                error = %e,
                "Compensating delete failed, unconfirmable user row left behind"
            ),
        }
    }

    async fn hash_password(&self, password: &str) -> Result<String, RegistrationError> {
        let password = password.to_string();
        let cost = self.bcrypt_cost;

        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| RegistrationError::PasswordHash(e.to_string()))?
            .map_err(|e| RegistrationError::PasswordHash(e.to_string()))
    }
}
