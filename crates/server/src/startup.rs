use std::{net::SocketAddr, sync::Arc};

use axum::{http::HeaderValue, Router};
use dotenvy::dotenv;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tracing::{info, warn};

use common::utils::logging::init_logging_from_env;
use configs::{AppConfig, CorsConfig};
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::repository::AuthRepository;
use service::auth::{service::AuthConfig, AuthService};
use service::media::MediaUrls;
use service::storage::UploadStore;

use crate::errors::StartupError;
use crate::routes::{self, auth::ServerState};

/// Empty origin list means development mode: anything goes.
pub fn build_cors(cfg: &CorsConfig) -> CorsLayer {
    if cfg.allowed_origins.is_empty() {
        return CorsLayer::very_permissive();
    }
    let origins: Vec<HeaderValue> = cfg
        .allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o.trim()) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Assemble handler state from an open connection.
pub fn build_state(db: DatabaseConnection, cfg: &AppConfig) -> ServerState {
    let repo: Arc<dyn AuthRepository> = Arc::new(SeaOrmAuthRepository { db: db.clone() });
    let auth = AuthService::new(repo, AuthConfig::new(cfg.auth.jwt_secret.clone(), cfg.auth.token_ttl_hours));
    ServerState {
        db,
        auth: Arc::new(auth),
        media: MediaUrls::new(&cfg.uploads.public_base_url),
        uploads: Arc::new(UploadStore::from_config(&cfg.uploads)),
        cookie_secure: cfg.auth.cookie_secure,
    }
}

pub fn build_app(state: ServerState, cfg: &AppConfig) -> Router {
    routes::build_router(state, build_cors(&cfg.cors))
}

/// Create the configured bootstrap admin when the account table is empty.
async fn bootstrap_admin(state: &ServerState, cfg: &AppConfig) -> Result<(), StartupError> {
    let (Some(email), Some(password)) = (cfg.auth.bootstrap_email.as_deref(), cfg.auth.bootstrap_password.as_deref()) else {
        return Ok(());
    };
    let name = cfg.auth.bootstrap_name.as_deref().unwrap_or("Administrator");
    match state.auth.ensure_bootstrap_admin(email, password, name).await {
        Ok(Some(user)) => info!(email = %user.email, "bootstrap admin created"),
        Ok(None) => info!("admin accounts present, bootstrap skipped"),
        Err(e) => return Err(StartupError::Bootstrap(e.to_string())),
    }
    Ok(())
}

pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(err = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

/// Public entry: load config, prepare storage and database, serve until Ctrl+C
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging_from_env();

    let cfg = AppConfig::load_or_env().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    common::env::ensure_upload_dir(&cfg.uploads.dir).await?;

    let db = models::db::connect_with_config(&cfg.database)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;
    migration::Migrator::up(&db, None)
        .await
        .map_err(|e| StartupError::Database(format!("migrations failed: {e}")))?;
    info!("migrations applied");

    let state = build_state(db, &cfg);
    bootstrap_admin(&state, &cfg).await?;

    let app = build_app(state, &cfg);
    let addr: SocketAddr = cfg.server.bind_addr().parse()?;
    info!(%addr, uploads = %cfg.uploads.dir, "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}
