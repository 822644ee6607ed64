//! Agent-402 server binary.

use std::path::PathBuf;

use agent402_server::{AppState, ServerConfig, router};
use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[derive(Debug, Parser)]
#[command(name = "agent402-server")]
#[command(version, about = "Agent-402 embedding vector store API", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the config file
    #[arg(long)]
    listen: Option<String>,

    /// Log filter used when RUST_LOG is unset, overriding the config file
    #[arg(long)]
    log_level: Option<String>,
}

fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(listen) = cli.listen {
        config = config.with_listen_addr(listen);
    }
    if let Some(level) = cli.log_level {
        config.logging.filter = level;
    }

    init_logging(&config.logging.filter);

    let provider = config
        .embedding
        .build_provider()
        .context("building embedding provider")?;
    info!("Using {} embedding provider", provider.name());

    let listen_addr = config.server.listen_addr.clone();
    let app = router(AppState::new(config, provider));

    let listener = TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("binding {listen_addr}"))?;
    info!("Agent-402 API listening on {listen_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(err) => {
            warn!("Failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    }
}
