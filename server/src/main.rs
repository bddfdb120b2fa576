//! Yunie Server - Main entry point.
//!
//! This binary starts the Yunie chat relay with:
//! - `.env` loading for local development
//! - Structured JSON logging for production
//! - The task board restored from the data directory
//! - Graceful shutdown handling (SIGTERM/SIGINT)
//!
//! # Configuration
//!
//! See [`yunie_server::config`] for environment variable configuration.
//!
//! # Example
//!
//! ```bash
//! OPENAI_API_KEY=sk-... PORT=3000 cargo run --bin yunie-server
//! ```

use std::process::ExitCode;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use yunie_server::config::Config;
use yunie_server::routes::{create_router, AppState};

#[tokio::main]
async fn main() -> ExitCode {
    // .env is optional.
    let dotenv = dotenvy::dotenv();

    init_logging();

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "Failed to load configuration");
            eprintln!("Error: {err}");
            eprintln!();
            eprintln!("Optional environment variables:");
            eprintln!("  PORT               - HTTP server port (default: 3000)");
            eprintln!("  OPENAI_API_KEY     - API key for companion replies");
            eprintln!("  YUNIE_OPENAI_URL   - Chat API base URL (default: https://api.openai.com/v1)");
            eprintln!("  YUNIE_MODEL        - Chat model (default: gpt-4o-mini)");
            eprintln!("  YUNIE_TEMPERATURE  - Sampling temperature, 0.0 to 2.0 (default: 0.8)");
            eprintln!("  YUNIE_DATA_DIR     - Task storage directory (default: ~/.yunie)");
            eprintln!("  RUST_LOG           - Log level filter (default: info)");
            return ExitCode::from(1);
        }
    };

    match serve(config).await {
        Ok(()) => {
            info!("Server shutdown complete");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %format!("{err:#}"), "Server error");
            eprintln!("Error: {err:#}");
            ExitCode::from(1)
        }
    }
}

/// Restores the board, binds the listener and serves until shutdown.
async fn serve(config: Config) -> Result<()> {
    info!(
        port = config.port,
        model = %config.model,
        chat_enabled = config.openai_api_key.is_some(),
        data_dir = %config.tasks.data_dir.display(),
        "Yunie server starting"
    );

    let board = yunie_tasks::open_board(&config.tasks).with_context(|| {
        format!(
            "Failed to open task store at {}",
            config.tasks.data_dir.display()
        )
    })?;

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let state = AppState::new(config, board).context("Failed to create chat client")?;
    let app = create_router(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {bind_addr}"))?;
    info!(address = %bind_addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down gracefully");
    Ok(())
}

/// Initialize structured logging with tracing.
///
/// JSON output, filtered by `RUST_LOG` (default `info` with request traces
/// from `tower_http`).
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let json_layer = fmt::layer()
        .json()
        .with_target(true)
        .with_level(true)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .init();
}

/// Creates a future that resolves when a shutdown signal is received.
///
/// Listens for:
/// - SIGTERM (container orchestrator shutdown)
/// - SIGINT (Ctrl+C)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
