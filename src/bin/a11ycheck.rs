//! Server binary for a11ycheck.
//!
//! A thin shim over the library crate that maps CLI flags and environment
//! variables to `AppConfig` and runs the axum server.

use a11ycheck::{AnthropicClient, AppConfig, AppState};
use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// PDF accessibility & formatting compliance checker.
#[derive(Debug, Parser)]
#[command(name = "a11ycheck", version, about)]
struct Cli {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8000)]
    port: u16,

    /// Agent model identifier.
    #[arg(long, env = "A11YCHECK_MODEL", default_value = "claude-sonnet-4-20250514")]
    model: String,

    /// Base URL of the agent API.
    #[arg(long, env = "A11YCHECK_API_BASE", default_value = "https://api.anthropic.com")]
    api_base: String,

    /// Agent API key.
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Maximum tokens per generated report.
    #[arg(long, default_value_t = 8192)]
    max_tokens: usize,

    /// Concurrent extraction limit.
    #[arg(long, default_value_t = 2)]
    extract_concurrency: usize,

    /// Allowed CORS origin (repeatable).
    #[arg(long = "cors-origin")]
    cors_origins: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut builder = AppConfig::builder()
        .model(cli.model.clone())
        .api_base(cli.api_base.clone())
        .api_key(cli.api_key.clone())
        .max_tokens(cli.max_tokens)
        .extract_concurrency(cli.extract_concurrency);
    if !cli.cors_origins.is_empty() {
        builder = builder.cors_origins(cli.cors_origins.clone());
    }
    let config = builder
        .build()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    let agent = Arc::new(AnthropicClient::new(&config).context("agent client setup failed")?);
    let app = a11ycheck::server::router(AppState::new(config, agent));

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    tracing::info!("a11ycheck listening on http://{addr}");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
