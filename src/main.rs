use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use feedscout::config::Config;
use feedscout::discovery::Discovery;
use feedscout::fetch::FetchClient;
use feedscout::server::{self, AppState};

/// Discovers RSS/Atom feeds on a target site over HTTP.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Path to the TOML config file
    #[arg(long, default_value = "feedscout.toml")]
    config: PathBuf,

    /// Listen address, overriding the config file
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = Config::load(&args.config).context("Failed to load configuration")?;
    let listen_addr = args.listen.unwrap_or_else(|| config.listen_addr.clone());

    let client = FetchClient::new(Duration::from_millis(config.request_timeout_ms));
    let state = AppState::new(Discovery::new(client));
    let app = server::create_router(state, &config);

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("Failed to bind {listen_addr}"))?;
    tracing::info!(addr = %listen_addr, "feedscout listening");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
