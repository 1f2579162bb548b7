//! Configuration management for the identity service
//!
//! This module handles loading and validating configuration from environment variables,
//! with support for different environments (development, staging, production).

use std::env;
use std::time::Duration;
use thiserror::Error;

use crate::token::TokenTtls;

/// Signing secret used when `JWT_SECRET` is unset outside production
const DEVELOPMENT_JWT_SECRET: &str = "development-secret-change-in-production";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),
}

/// Application environment
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse environment from string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "dev" | "development" | "local" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid environment: '{}'. Expected: dev, staging, or prod",
                s
            ))),
        }
    }

    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Get the environment name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Current environment
    pub environment: Environment,

    /// Bind address
    pub host: [u8; 4],

    /// Server port
    pub port: u16,

    /// Maximum database connections
    pub db_max_connections: u32,

    /// CORS allowed origins
    pub cors_allowed_origins: Option<String>,

    /// Log level (RUST_LOG)
    pub log_level: String,

    /// Shared secret for token signing and verification
    pub jwt_secret: String,

    /// Lifetime of each token operation
    pub token_ttls: TokenTtls,

    /// Remote token authority; `None` runs the authority in-process
    pub token_authority_url: Option<String>,

    /// Upper bound on a single call into the token authority
    pub token_authority_timeout: Duration,

    /// Prefix the confirmation token is appended to
    pub confirmation_link_base: String,

    /// Sending service endpoint; `None` only logs outgoing notifications
    pub notifier_url: Option<String>,

    /// bcrypt work factor for new password hashes
    pub bcrypt_cost: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .map(|s| Environment::parse(&s))
            .unwrap_or(Ok(Environment::Development))?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;

        let host = parse_host(&env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()))?;

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort("PORT must be a valid number".to_string()))?;

        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", 5u32);

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS").ok();

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if environment.is_production() => {
                return Err(ConfigError::MissingEnvVar("JWT_SECRET".to_string()))
            }
            _ => DEVELOPMENT_JWT_SECRET.to_string(),
        };

        let defaults = TokenTtls::default();
        let token_ttls = TokenTtls {
            access: parse_ttl(
                "ACCESS_TOKEN_TTL_SECONDS",
                env::var("ACCESS_TOKEN_TTL_SECONDS").ok().as_deref(),
                defaults.access,
                chrono::Duration::try_seconds,
            )?,
            refresh: parse_ttl(
                "REFRESH_TOKEN_TTL_DAYS",
                env::var("REFRESH_TOKEN_TTL_DAYS").ok().as_deref(),
                defaults.refresh,
                chrono::Duration::try_days,
            )?,
            confirmation: parse_ttl(
                "CONFIRMATION_TOKEN_TTL_SECONDS",
                env::var("CONFIRMATION_TOKEN_TTL_SECONDS").ok().as_deref(),
                defaults.confirmation,
                chrono::Duration::try_seconds,
            )?,
        };

        let token_authority_url = env::var("TOKEN_AUTHORITY_URL")
            .ok()
            .filter(|url| !url.is_empty());

        let token_authority_timeout =
            Duration::from_secs(parse_or("TOKEN_AUTHORITY_TIMEOUT_SECONDS", 5u64));

        let confirmation_link_base = env::var("CONFIRMATION_LINK_BASE")
            .unwrap_or_else(|_| format!("http://localhost:{}/auth/confirm?token=", port));

        let notifier_url = env::var("NOTIFIER_URL").ok().filter(|url| !url.is_empty());

        let bcrypt_cost = parse_or("BCRYPT_COST", bcrypt::DEFAULT_COST);

        Ok(Config {
            database_url,
            environment,
            host,
            port,
            db_max_connections,
            cors_allowed_origins,
            log_level,
            jwt_secret,
            token_ttls,
            token_authority_url,
            token_authority_timeout,
            confirmation_link_base,
            notifier_url,
            bcrypt_cost,
        })
    }

    /// Get database URL (useful for logging masked version)
    pub fn database_url_masked(&self) -> String {
        // Mask password in database URL for logging
        if let Some(at_pos) = self.database_url.find('@') {
            if let Some(colon_pos) = self.database_url[..at_pos].rfind(':') {
                let prefix = &self.database_url[..colon_pos + 1];
                let suffix = &self.database_url[at_pos..];
                return format!("{}****{}", prefix, suffix);
            }
        }
        self.database_url.clone()
    }
}

/// Read a numeric variable, falling back to `default` when unset or unparsable
fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Parse a token lifetime; it must be a positive count that `unit` can represent
fn parse_ttl(
    key: &str,
    value: Option<&str>,
    default: chrono::Duration,
    unit: fn(i64) -> Option<chrono::Duration>,
) -> Result<chrono::Duration, ConfigError> {
    let Some(raw) = value else {
        return Ok(default);
    };

    let amount = raw.trim().parse::<i64>().map_err(|_| {
        ConfigError::InvalidValue(format!("{} must be an integer, got '{}'", key, raw))
    })?;

    if amount <= 0 {
        return Err(ConfigError::InvalidValue(format!(
            "{} must be positive, got {}",
            key, amount
        )));
    }

    unit(amount).ok_or_else(|| {
        ConfigError::InvalidValue(format!("{} is out of range: {}", key, amount))
    })
}

fn parse_host(value: &str) -> Result<[u8; 4], ConfigError> {
    value
        .parse::<std::net::Ipv4Addr>()
        .map(|ip| ip.octets())
        .map_err(|_| ConfigError::InvalidValue(format!("Invalid HOST: '{}'", value)))
}
