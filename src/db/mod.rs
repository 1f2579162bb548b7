//! Postgres pool, embedded migrations and schema health
//!
//! Uniqueness of emails and of sessions per user lives in the schema created
//! here, so a pool is only handed out after the migrations have run.

use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::config::Config;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Cannot reach identity database: {0}")]
    Connect(String),

    #[error("Identity schema migration failed: {0}")]
    Migrate(String),

    #[error("Identity database unhealthy: {0}")]
    Unhealthy(String),
}

/// Open the pool backing the user and session stores
pub async fn connect(config: &Config) -> Result<PgPool, DbError> {
    tracing::info!(
        url = %config.database_url_masked(),
        max_connections = config.db_max_connections,
        "Connecting to identity database"
    );

    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .idle_timeout(IDLE_TIMEOUT)
        .connect(&config.database_url)
        .await
        .map_err(|e| DbError::Connect(e.to_string()))
}

/// Create or upgrade the `users` and `sessions` tables
pub async fn migrate(pool: &PgPool) -> Result<(), DbError> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| DbError::Migrate(e.to_string()))?;

    tracing::info!(migrations = MIGRATOR.migrations.len(), "Identity schema up to date");
    Ok(())
}

/// The database answers and both identity tables exist
pub async fn check_health(pool: &PgPool) -> Result<(), DbError> {
    let schema_present: bool = sqlx::query_scalar(
        r#"
        SELECT to_regclass('users') IS NOT NULL
           AND to_regclass('sessions') IS NOT NULL
        "#,
    )
    .fetch_one(pool)
    .await
    .map_err(|e| DbError::Unhealthy(e.to_string()))?;

    if !schema_present {
        return Err(DbError::Unhealthy(
            "users or sessions table is missing".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_migrations_create_identity_tables() {
        let sql: String = MIGRATOR
            .migrations
            .iter()
            .map(|m| m.sql.to_string())
            .collect();

        assert!(sql.contains("CREATE TABLE IF NOT EXISTS users"));
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS sessions"));
        assert!(sql.contains("email         TEXT NOT NULL UNIQUE"));
    }
}
