use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use health_tracker_api::api::{create_application, AppState};
use health_tracker_domain::config::ImportConfig;
use health_tracker_domain::database::{initialize_database_pool, DatabaseConfig};

/// The main entry point for the HealthTracker API server
///
/// This function:
/// 1. Initializes environment variables from .env file
/// 2. Sets up tracing for logging
/// 3. Opens the SQLite pool, falling back to in-memory storage
/// 4. Creates and starts the Axum web application
/// 5. Handles graceful shutdown
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    if dotenv().is_err() {
        eprintln!("Warning: .env file not found or couldn't be read. Using environment variables.");
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_span_events(FmtSpan::CLOSE)
                .with_target(false)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stdout),
        )
        .with(env_filter)
        .init();

    info!("Starting HealthTracker API server");

    // DB_SQLITE_PATH wins; otherwise the database lives in DATA_DIR
    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string());
    let mut db_config = DatabaseConfig::from_env().context("Invalid database configuration")?;
    if std::env::var("DB_SQLITE_PATH").is_err() {
        db_config.sqlite_path = PathBuf::from(&data_dir)
            .join("health_tracker.db")
            .to_string_lossy()
            .to_string();
    }

    let import_config = ImportConfig::from_env().context("Invalid import configuration")?;

    let state = match initialize_database_pool(&db_config) {
        Ok(pool) => {
            info!("Database pool initialized successfully");
            AppState::sqlite(pool, import_config)
        }
        Err(e) => {
            error!("Failed to initialize database pool: {}", e);
            warn!("Falling back to in-memory storage; readings will not survive a restart");
            AppState::in_memory(import_config)
        }
    };

    let app = create_application(state);

    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .context("PORT must be a number")?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Cannot bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for CTRL+C or, on Unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
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

    info!("Shutting down server...");
}
