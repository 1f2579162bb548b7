//! Persistence for users and sessions
//!
//! The services depend on these traits only; uniqueness of emails and of
//! sessions per user is enforced by the store, never by a read-then-write.

mod postgres;

pub use postgres::{PgSessionStore, PgUserStore};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Session, User};

/// Structured storage failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Unique constraint violated")]
    UniqueViolation,

    #[error("Row not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),
}

/// SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => StorageError::NotFound,
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                StorageError::UniqueViolation
            }
            _ => StorageError::Database(e.to_string()),
        }
    }
}

/// Account rows
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new unconfirmed user; `UniqueViolation` if the email is taken
    async fn insert_user(&self, email: &str, password_hash: &str) -> Result<Uuid, StorageError>;

    async fn find_by_email(&self, email: &str) -> Result<User, StorageError>;

    async fn find_by_id(&self, user_id: Uuid) -> Result<User, StorageError>;

    /// Mark the user confirmed; `NotFound` if the row does not exist
    async fn confirm_user(&self, user_id: Uuid) -> Result<(), StorageError>;

    async fn delete_user(&self, user_id: Uuid) -> Result<(), StorageError>;
}

/// Session rows
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Record a session; `UniqueViolation` if the user already has one
    async fn insert_session(
        &self,
        user_id: Uuid,
        refresh_token: &str,
    ) -> Result<Session, StorageError>;

    async fn find_session(&self, user_id: Uuid) -> Result<Option<Session>, StorageError>;
}
