//! Cove server entry point.
//!
//! Bootstraps the storage backend and vault engine, then starts the axum
//! HTTP server with graceful shutdown on SIGINT/SIGTERM.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use cove_core::engine::VaultEngine;
use cove_server::config::{ServerConfig, StorageBackendType};
use cove_server::routes;
use cove_server::state::AppState;
use cove_storage::MemoryBackend;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env();

    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    // The storage variant is logged per-branch below; the Postgres URL may
    // carry credentials and must not be logged.
    info!("cove starting");

    let store: Arc<dyn cove_storage::VaultStore> = match &config.storage_backend {
        StorageBackendType::Memory => {
            info!("using in-memory storage (data will not persist)");
            Arc::new(MemoryBackend::new())
        }
        #[cfg(feature = "postgres-backend")]
        StorageBackendType::Postgres { url } => {
            info!("using PostgreSQL storage");
            Arc::new(
                cove_storage::PostgresBackend::connect(url)
                    .await
                    .context("failed to connect to PostgreSQL")?,
            )
        }
        #[cfg(not(feature = "postgres-backend"))]
        StorageBackendType::Postgres { .. } => {
            anyhow::bail!(
                "postgres backend requested but feature 'postgres-backend' is not enabled"
            );
        }
    };

    if config.admin_api_key.is_none() {
        warn!("COVE_API_KEY is not set — vault creation will be refused");
    }

    let engine =
        Arc::new(VaultEngine::new(store).with_kdf_iterations(config.kdf_iterations));

    let state = Arc::new(AppState {
        engine,
        admin_api_key: config.admin_api_key.clone(),
    });

    let app = routes::router(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "cove server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("cove server stopped");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping server");
}
