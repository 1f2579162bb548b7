//! Identity server
//!
//! Serves the token authority, login and registration RPCs over HTTP.

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};

use shapeup_identity::auth::SessionManager;
use shapeup_identity::config::Config;
use shapeup_identity::db;
use shapeup_identity::middleware;
use shapeup_identity::notify::{HttpNotifier, LogNotifier, Notifier};
use shapeup_identity::registration::RegistrationSaga;
use shapeup_identity::routes;
use shapeup_identity::state::AppState;
use shapeup_identity::storage::{PgSessionStore, PgUserStore};
use shapeup_identity::token::{HttpTokenClient, LocalTokenClient, TokenAuthority, TokenClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(environment = config.environment.as_str(), "Starting identity server");

    let db_pool = db::connect(&config).await?;
    db::migrate(&db_pool).await?;

    let token_authority = Arc::new(TokenAuthority::new(
        config.jwt_secret.clone(),
        config.token_ttls,
    ));

    // Without a remote authority the services sign tokens in-process
    let token_client: Arc<dyn TokenClient> = match &config.token_authority_url {
        Some(url) => {
            tracing::info!(url = %url, "Using remote token authority");
            Arc::new(HttpTokenClient::new(url, config.token_authority_timeout)?)
        }
        None => {
            tracing::info!("Using in-process token authority");
            Arc::new(LocalTokenClient::new(token_authority.as_ref().clone()))
        }
    };

    let notifier: Arc<dyn Notifier> = match &config.notifier_url {
        Some(url) => Arc::new(HttpNotifier::new(url, config.token_authority_timeout)?),
        None => {
            tracing::warn!("NOTIFIER_URL not set, confirmation links will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let users = Arc::new(PgUserStore::new(db_pool.clone()));
    let sessions = Arc::new(PgSessionStore::new(db_pool.clone()));

    let session_manager = Arc::new(SessionManager::new(
        users.clone(),
        sessions,
        token_client.clone(),
        config.token_authority_timeout,
    ));

    let registration = Arc::new(
        RegistrationSaga::new(
            users,
            token_client,
            config.confirmation_link_base.clone(),
            config.token_authority_timeout,
            config.bcrypt_cost,
        )
        .with_notifier(notifier),
    );

    let app_state = AppState::new(token_authority, session_manager, registration);

    // Clone db_pool for health check
    let health_db_pool = db_pool.clone();

    let mut app = Router::new()
        .route("/", get(root))
        .route("/health", get(move || health_check(health_db_pool.clone())))
        .merge(routes::api_routes())
        .with_state(app_state)
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::request_tracing))
        .layer(configure_cors(config.cors_allowed_origins.as_deref()));

    if config.environment.is_production() {
        app = app.layer(axum::middleware::from_fn(middleware::hsts_header));
    }

    let addr = SocketAddr::from((config.host, config.port));

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn root() -> &'static str {
    "Identity API Server"
}

/// Health check response
#[derive(serde::Serialize)]
struct HealthResponse {
    status: String,
    database: String,
    version: String,
}

/// Health check endpoint
async fn health_check(pool: sqlx::PgPool) -> axum::Json<HealthResponse> {
    let (status, database) = match db::check_health(&pool).await {
        Ok(()) => ("healthy", "connected".to_string()),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            ("unhealthy", "unreachable".to_string())
        }
    };

    axum::Json(HealthResponse {
        status: status.to_string(),
        database,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn configure_cors(allowed_origins: Option<&str>) -> CorsLayer {
    let allowed_origins = allowed_origins.unwrap_or_default();

    if allowed_origins.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
