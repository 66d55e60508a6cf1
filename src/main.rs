//! Site proxy
//!
//! Serves arbitrary sites through one origin, rewriting their HTML and CSS
//! so navigation and sub-resources keep flowing through the proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                      SITE PROXY                       │
//!                      │                                                       │
//!   Client Request     │  ┌─────────┐    ┌──────────┐    ┌──────────────┐      │
//!   ───────────────────┼─▶│  http   │───▶│ routing  │───▶│   upstream   │──────┼──▶ Target
//!                      │  │ server  │    │ resolver │    │  forwarder   │      │    Site
//!                      │  └─────────┘    └──────────┘    └──────┬───────┘      │
//!                      │                                        │              │
//!                      │                                        ▼              │
//!   Client Response    │  ┌─────────┐    ┌──────────┐    ┌──────────────┐      │
//!   ◀──────────────────┼──│ stream  │◀───│ rewrite  │◀───│   security   │      │
//!                      │  │ or html │    │ html/css │    │   headers    │      │
//!                      │  └─────────┘    └──────────┘    └──────────────┘      │
//!                      │                                                       │
//!                      │  config · observability · lifecycle · in-flight limit │
//!                      └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use site_proxy::config::validation::validate_config;
use site_proxy::config::{load_config, ConfigError, ProxyConfig};
use site_proxy::lifecycle::start;
use site_proxy::observability::init_logging;

#[derive(Parser, Debug)]
#[command(name = "site-proxy", version, about = "Browse any site through a rewriting proxy")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    init_logging(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?cli.config,
        "site-proxy starting"
    );

    start(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
