//! lod2 server: accounts, sessions, roles and invites over HTTP.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use lod2_api::AppState;
use lod2_auth::KeyPair;
use lod2_auth::bootstrap::ensure_admin;
use lod2_core::config::AppConfig;
use lod2_core::error::{AppError, ErrorKind};
use lod2_database::DatabasePool;

/// Command line flags. Everything else comes from configuration.
#[derive(Debug, Parser)]
#[command(name = "lod2-server", version, about)]
struct Cli {
    /// Configuration environment; loads `config/{env}.toml` over the defaults
    #[arg(long, default_value = "development")]
    env: String,

    /// Override `server.host`
    #[arg(long)]
    host: Option<String>,

    /// Override `server.port`
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_configuration(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load configuration from files and environment, then apply CLI overrides
fn load_configuration(cli: &Cli) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load(&cli.env)?;

    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    Ok(config)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting lod2 v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    let db = DatabasePool::connect(&config.database).await?;

    lod2_database::migration::run_migrations(db.pool()).await?;

    // ── Step 2: Signing key ──────────────────────────────────────
    let keys = Arc::new(KeyPair::load_or_generate(&config.auth.private_key_path).await?);

    // ── Step 3: Auth core ────────────────────────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, db.clone(), keys)?;

    // ── Step 4: Bootstrap administrator ──────────────────────────
    let admin = ensure_admin(
        &state.credentials,
        &state.roles,
        &state.invites,
        &state.config.bootstrap,
        state.config.auth.starting_invites,
    )
    .await
    .map_err(|e| AppError::internal(format!("Admin bootstrap failed: {e}")))?;
    tracing::info!(user_id = %admin.user_id, "Bootstrap admin ready");

    // ── Step 5: Build and start HTTP server ──────────────────────
    let app = lod2_api::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Io, format!("Failed to bind {addr}"), e))?;

    tracing::info!("lod2 server listening on {}", addr);

    // ── Step 6: Graceful shutdown ────────────────────────────────
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
        })
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Io, "Server error", e))?;

    db.close().await;
    tracing::info!("lod2 server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
}
