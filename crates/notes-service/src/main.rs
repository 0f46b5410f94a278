//! HTTP notes service
//!
//! Serves note CRUD endpoints behind HTTP Basic authentication, persisting
//! notes as a JSON document in the data directory.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notes_service::config::Config;
use notes_service::store::{DocumentStore, NoteStore};
use notes_service::{router, AppState};

#[derive(Parser, Debug)]
#[command(name = "notes-service")]
#[command(about = "Basic-auth protected HTTP CRUD service for notes")]
struct Cli {
    /// Port to listen on
    #[arg(long, default_value_t = 3000, env = "PORT")]
    port: u16,

    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0", env = "NOTES_BIND")]
    bind: String,

    /// Directory holding notes.json and config.json
    #[arg(long, default_value = "./data", env = "NOTES_DATA_PATH")]
    data_path: PathBuf,

    /// Keep notes in memory only
    #[arg(long, env = "NOTES_EPHEMERAL")]
    ephemeral: bool,

    /// Override the configured Basic auth username
    #[arg(long, env = "NOTES_USERNAME")]
    username: Option<String>,

    /// Override the configured Basic auth password
    #[arg(long, env = "NOTES_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notes_service=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = Config::load(&cli.data_path)?.with_overrides(cli.username, cli.password);
    config.validate()?;

    let store: Arc<dyn NoteStore> = if cli.ephemeral {
        tracing::info!("Using in-memory note store");
        Arc::new(DocumentStore::in_memory())
    } else {
        let store = DocumentStore::open(&cli.data_path)
            .await
            .with_context(|| format!("Failed to open note store at {:?}", cli.data_path))?;
        Arc::new(store)
    };

    let state = Arc::new(AppState::new(store, config.auth));
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", cli.bind, cli.port).parse()?;

    tracing::info!("Starting notes-service on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Notes service shut down");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix, so in-flight requests can finish
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable ({}), Ctrl-C only", e);
                wait_for_ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = wait_for_ctrl_c() => {}
            _ = sigterm.recv() => tracing::info!("Received SIGTERM, stopping notes-service"),
        }
    }

    #[cfg(not(unix))]
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl-C, stopping notes-service"),
        Err(e) => {
            tracing::warn!("Ctrl-C handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
