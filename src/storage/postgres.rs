//! PostgreSQL stores

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{SessionStore, StorageError, UserStore};
use crate::models::{Session, User};

/// `users` table access
#[derive(Clone)]
pub struct PgUserStore {
    db_pool: PgPool,
}

impl PgUserStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert_user(&self, email: &str, password_hash: &str) -> Result<Uuid, StorageError> {
        let user_id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, is_confirmed, created_at)
            VALUES ($1, $2, $3, FALSE, $4)
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(password_hash)
        .bind(Utc::now())
        .execute(&self.db_pool)
        .await?;

        Ok(user_id)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, StorageError> {
        sqlx::query_as(
            r#"
            SELECT id, email, password_hash, is_confirmed, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<User, StorageError> {
        sqlx::query_as(
            r#"
            SELECT id, email, password_hash, is_confirmed, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    async fn confirm_user(&self, user_id: Uuid) -> Result<(), StorageError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE users
            SET is_confirmed = TRUE
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.db_pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            DELETE FROM users WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.db_pool)
        .await?;

        Ok(())
    }
}

/// `sessions` table access
#[derive(Clone)]
pub struct PgSessionStore {
    db_pool: PgPool,
}

impl PgSessionStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn insert_session(
        &self,
        user_id: Uuid,
        refresh_token: &str,
    ) -> Result<Session, StorageError> {
        // sessions.user_id is the primary key, so a concurrent second login
        // fails here with 23505 instead of creating a second row
        let session: Session = sqlx::query_as(
            r#"
            INSERT INTO sessions (user_id, refresh_token, created_at)
            VALUES ($1, $2, $3)
            RETURNING user_id, refresh_token, created_at
            "#,
        )
        .bind(user_id)
        .bind(refresh_token)
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await?;

        Ok(session)
    }

    async fn find_session(&self, user_id: Uuid) -> Result<Option<Session>, StorageError> {
        let session = sqlx::query_as(
            r#"
            SELECT user_id, refresh_token, created_at
            FROM sessions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(session)
    }
}
