//! # Kasir Server
//!
//! JSON API over the Kasir SQLite database.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Kasir Server                                  │
//! │                                                                         │
//! │  Browser ───► HTTP (8080) ───► axum Router ───► Repositories ───► SQLite│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Environment
//! `KASIR_CONFIG`, `KASIR_BIND_ADDR`, `KASIR_DATABASE_PATH`,
//! `KASIR_MAX_CONNECTIONS`, `KASIR_PAGE_SIZE`, `RUST_LOG`.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use kasir_db::{Database, DbConfig};
use kasir_server::{build_router, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kasir=debug,sqlx=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("Starting Kasir server...");

    let config = ServerConfig::load().context("Failed to load configuration")?;
    info!(
        addr = %config.bind_addr,
        database = %config.database_path.display(),
        "Configuration loaded"
    );

    let db = Database::new(
        DbConfig::new(config.database_path.clone()).max_connections(config.max_connections),
    )
    .await
    .context("Failed to open database")?;
    info!("Database ready");

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "Listening");

    let app = build_router(AppState::new(db.clone(), config));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(?e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(?e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
