mod client;
mod config;
mod constants;
mod error;
mod formatters;
mod models;
mod results;
mod series;
mod service;
mod stations;
mod trends;

use anyhow::{Context, Result};
use clap::Parser;
use rmcp::ServiceExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Args, Config};
use crate::service::Snotel;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_args(&args)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("snotel_mcp_server={}", config.log_level.as_str().to_lowercase()).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!(
        api_base = %config.api_base,
        timeout_secs = config.timeout.as_secs(),
        "Starting SNOTEL MCP server"
    );

    let snotel = Snotel::new(&config).context("Failed to build AWDB client")?;
    let server = snotel.serve(rmcp::transport::stdio()).await?;
    server.waiting().await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}
