//! Admin gate (v1)
//!
//! Sits in front of the admin-panel frontend and decides, for every request,
//! whether it is rejected, redirected to login or forwarded upstream.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────────▶ trace / request ID / timeout layers
//!                          │
//!                          ▼
//!                     ┌──────────┐   session lookup   ┌──────────────┐
//!                     │   gate   │───────────────────▶│ auth service │
//!                     └────┬─────┘                    └──────────────┘
//!               404 / 307 / 429 / 400      forward
//!     ◀────────────────────┘                 │
//!                                            ▼
//!                                     ┌──────────────┐
//!     ◀───── response + gate headers ─│   upstream   │
//!                                     │   frontend   │
//!                                     └──────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use admin_gate::auth::BetterAuthResolver;
use admin_gate::config::{load_config, GateConfig};
use admin_gate::lifecycle::{wait_for_signal, Shutdown};
use admin_gate::observability::{logging, metrics};
use admin_gate::GateServer;

#[derive(Parser)]
#[command(name = "admin-gate")]
#[command(about = "Request gate for the admin panel", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured log level.
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GateConfig::default(),
    };

    let level = cli
        .log_level
        .as_deref()
        .unwrap_or(&config.observability.log_level);
    logging::init_logging(level);

    tracing::info!("admin-gate v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        auth = %config.auth.base_url,
        rate_limit_enabled = config.rate_limit.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let resolver = Arc::new(BetterAuthResolver::new(&config.auth));
    let server = GateServer::new(config, resolver)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
