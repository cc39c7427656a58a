//! bmcat-catalog: beatmap catalog service
//!
//! Startup order: CLI args, config file, logging, root folder, database,
//! osu! client, HTTP server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bmcat_catalog::config::{resolve_admin_token, resolve_osu_credentials, DEFAULT_PORT};
use bmcat_catalog::db::StorePartition;
use bmcat_catalog::services::{OsuClient, ReconcileSettings};
use bmcat_catalog::AppState;
use bmcat_common::config::{load_config, prepare_root_folder, resolve_root_folder, ROOT_FOLDER_ENV};

#[derive(Parser, Debug)]
#[command(name = "bmcat-catalog")]
#[command(about = "Beatmap catalog service with osu! reconciliation")]
#[command(version)]
struct Args {
    /// HTTP port (overrides config file)
    #[arg(short, long, env = "BMCAT_PORT")]
    port: Option<u16>,

    /// Data folder holding the database
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Explicit config file path
    #[arg(short, long, env = "BMCAT_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = load_config(args.config.as_deref()).context("Failed to load configuration")?;

    let default_filter = format!(
        "bmcat_catalog={level},tower_http={level}",
        level = toml_config.logging.level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting bmcat-catalog v{}", env!("CARGO_PKG_VERSION"));

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), ROOT_FOLDER_ENV, &toml_config);
    let db_path = prepare_root_folder(&root_folder)
        .with_context(|| format!("Failed to initialize root folder {}", root_folder.display()))?;
    info!("Database: {}", db_path.display());

    let pool = bmcat_common::db::init_database(&db_path)
        .await
        .context("Failed to open database")?;
    let store = StorePartition::from_settings(pool)
        .await
        .context("Failed to read database settings")?;

    let credentials = resolve_osu_credentials(&toml_config)?;
    let provider = Arc::new(
        OsuClient::new(credentials, toml_config.osu.base_url.clone())
            .context("Failed to create osu! client")?,
    );

    let settings = ReconcileSettings::from(&toml_config.reconcile);
    info!(
        delay_ms = settings.inter_call_delay.as_millis() as u64,
        max_run_seconds = ?toml_config.reconcile.max_run_seconds,
        max_items = ?settings.max_items,
        "Reconciliation settings"
    );

    let state = AppState::new(store, provider, settings, resolve_admin_token(&toml_config));
    let app = bmcat_catalog::build_router(state);

    let port = args.port.or(toml_config.port).unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
