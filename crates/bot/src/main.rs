//! dibs webhook server.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bot::{build_router, AppState, Config};
use tracker::GitHubApi;

/// Task-assignment bot for priced issues.
#[derive(Parser)]
#[command(name = "dibs-server")]
#[command(about = "GitHub webhook service deciding who may start which task")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Override the configured HTTP port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let mut config = Config::default();
    if let Some(port) = cli.port {
        config.port = port;
    }
    anyhow::ensure!(
        !config.github_token.is_empty(),
        "GITHUB_TOKEN must be set"
    );
    if config.webhook_secret.is_none() {
        tracing::warn!("WEBHOOK_SECRET is not set; webhook signatures will not be verified");
    }

    let api = GitHubApi::new(&config.github_token).context("Failed to build GitHub client")?;
    let port = config.port;
    let state = AppState {
        config: Arc::new(config),
        api,
    };

    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;
    info!(port, "dibs server listening");
    axum::serve(listener, build_router(state))
        .await
        .context("Server error")?;

    Ok(())
}
