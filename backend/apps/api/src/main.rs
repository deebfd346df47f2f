//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use axum::Router;
use clientdevices::application::DescribeCertificateAuthorityUseCase;
use clientdevices::domain::repository::CertificateStore;
use clientdevices::{
    ComponentTokens, InMemoryCertificateStore, PgCertificateStore, PolicyAuthorizationHandler,
    apply_configuration, ipc_router, load_certificates_dir, spawn_configuration_reloader,
};
use kernel::di::UseCaseRegistry;
use kernel::use_case::UseCase;
use platform::config::Topics;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:31113";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=info,clientdevices=info,kernel=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Configuration tree
    let config_path = env::var("CDA_CONFIG_PATH").ok();
    let topics = match &config_path {
        Some(path) => {
            let topics = Topics::from_json_file(path).await?;
            tracing::info!(path = %path, "Loaded configuration");
            topics
        }
        None => {
            tracing::warn!("CDA_CONFIG_PATH not set, starting with empty configuration");
            Topics::new()
        }
    };

    let registry = Arc::new(UseCaseRegistry::default());
    apply_configuration(&topics, registry.container())?;
    let reloader = spawn_configuration_reloader(topics.clone(), Arc::clone(registry.container()));

    let describe_ca = registry
        .get::<DescribeCertificateAuthorityUseCase>()
        .map_err(AppError::from)?;
    let Ok(ca) = describe_ca.apply(()).await;
    tracing::info!(
        certificate_uri = ca.certificate_uri.as_deref().unwrap_or("<managed>"),
        ca_type = %ca.ca_type,
        "Certificate authority"
    );

    // IPC tokens
    let tokens = match env::var("IPC_COMPONENT_TOKENS") {
        Ok(value) => ComponentTokens::parse(&value)?,
        Err(_) => {
            tracing::warn!("IPC_COMPONENT_TOKENS not set, every IPC request will be rejected");
            ComponentTokens::default()
        }
    };
    tracing::info!(components = ?tokens, "IPC components");

    // Certificate store
    let certs_dir = env::var("CDA_DEVICE_CERTS_DIR").ok();
    let ipc = match env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&database_url)
                .await?;

            tracing::info!("Connected to database");

            // Run migrations
            sqlx::migrate!("../../../database/migrations")
                .run(&pool)
                .await?;

            tracing::info!("Migrations completed");

            let store = PgCertificateStore::new(pool);
            seed_store(&store, certs_dir.as_deref()).await?;

            registry.provide(Arc::new(store));
            ipc_router::<PolicyAuthorizationHandler, PgCertificateStore>(
                Arc::clone(&registry),
                tokens,
            )
        }
        Err(_) => {
            let store = InMemoryCertificateStore::new();
            if certs_dir.is_none() {
                tracing::warn!("No certificate store configured, using an empty in-memory store");
            }
            seed_store(&store, certs_dir.as_deref()).await?;

            registry.provide(Arc::new(store));
            ipc_router::<PolicyAuthorizationHandler, InMemoryCertificateStore>(
                Arc::clone(&registry),
                tokens,
            )
        }
    };

    if let Some(path) = config_path {
        spawn_reload_on_hangup(topics.clone(), path)?;
    }

    // Build router
    let app = Router::new()
        .nest("/ipc", ipc)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = env::var("LISTEN_ADDR")
        .unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string())
        .parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    reloader.abort();
    tracing::info!("Server stopped");

    Ok(())
}

/// Register the certificates of `dir`, if one is configured
async fn seed_store<S>(store: &S, dir: Option<&str>) -> anyhow::Result<()>
where
    S: CertificateStore + Sync,
{
    if let Some(dir) = dir {
        load_certificates_dir(store, dir).await?;
    }
    Ok(())
}

/// Re-read the configuration file on SIGHUP
///
/// The reloader picks the change up from the tree's notification.
#[cfg(unix)]
fn spawn_reload_on_hangup(topics: Topics, path: String) -> anyhow::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangups = signal(SignalKind::hangup())?;
    tokio::spawn(async move {
        while hangups.recv().await.is_some() {
            match topics.reload_json_file(&path).await {
                Ok(()) => tracing::info!(path = %path, "Configuration file re-read"),
                Err(e) => tracing::error!(
                    path = %path,
                    error = %e,
                    "Failed to re-read configuration file, keeping previous configuration"
                ),
            }
        }
    });

    Ok(())
}

#[cfg(not(unix))]
fn spawn_reload_on_hangup(_topics: Topics, _path: String) -> anyhow::Result<()> {
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
