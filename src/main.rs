//! Savings-account client backend.
//!
//! An HTTP service built with Tokio and Axum: two-factor login with
//! server-side sessions, per-class rate limiting, and a transactional
//! balance ledger.
//!
//! # Architecture Overview
//!
//! ```text
//!  Client Request
//!      │
//!      ▼
//!  ┌────────────┐   ┌────────────┐   ┌────────────┐   ┌──────────┐
//!  │ rate limit │──▶│ token +    │──▶│ role check │──▶│ handler  │
//!  │ (class)    │   │ session    │   │            │   │          │
//!  └────────────┘   └────────────┘   └────────────┘   └────┬─────┘
//!                                                           │
//!                  ┌────────────────────────────────────────┤
//!                  ▼                    ▼                    ▼
//!            ┌──────────┐        ┌──────────┐        ┌────────────┐
//!            │  auth    │        │ sessions │        │   ledger   │
//!            │ verifier │        │  store   │        │ (per-acct  │
//!            └──────────┘        └──────────┘        │  lock map) │
//!                                                    └────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use savings_backend::config::loader::load_config;
use savings_backend::config::AppConfig;
use savings_backend::http::HttpServer;
use savings_backend::lifecycle::Shutdown;

#[derive(Parser, Debug)]
#[command(name = "savings-backend", about = "Savings-account client backend")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured listen port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration before logging so the log level can come from it.
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    if let Some(port) = cli.port {
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.listener.bind_address = format!("{host}:{port}");
    }

    // Initialize tracing subscriber
    let default_filter = format!("savings_backend={},tower_http=warn", config.observability.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&default_filter)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("savings-backend v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        otp_policy = ?config.auth.otp_policy,
        dev_reset = config.dev.enable_rate_limit_reset,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.trigger();
        }
    });

    let server = HttpServer::new(config);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
