//! framewire echo server.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client            ┌──────────────────────────────────────────────────┐
//!   ──────────────────┼─▶ net::TcpAcceptor ──▶ server::ConnectionServer   │
//!                     │                              │                   │
//!                     │                   serial inline / task per conn  │
//!                     │                              ▼                   │
//!                     │                      server::handler loop        │
//!                     │                              │                   │
//!                     │                              ▼                   │
//!   ◀─────────────────┼──────────────── EchoProcessor (framing::*)       │
//!                     │                                                  │
//!                     │  config · lifecycle · observability              │
//!                     └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use framewire::config::{load_config, validate_config, ServiceConfig};
use framewire::lifecycle::{self, shutdown_signal, Shutdown};
use framewire::observability::logging::init_logging;
use framewire::HandlingStrategy;

#[derive(Parser)]
#[command(name = "framewire")]
#[command(about = "Framed request/response echo server", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address
    #[arg(short, long)]
    bind: Option<String>,

    /// Override the handling strategy (serial or concurrent)
    #[arg(short, long)]
    strategy: Option<HandlingStrategy>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    if let Some(strategy) = args.strategy {
        config.server.strategy = strategy;
    }
    if let Err(errors) = validate_config(&config) {
        for e in &errors {
            eprintln!("config error: {}", e);
        }
        return Err("invalid configuration".into());
    }

    init_logging(&config.observability.log_level);

    tracing::info!("framewire v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        strategy = %config.server.strategy,
        max_frame_len = config.framing.max_frame_len,
        "Configuration loaded"
    );

    let mut server = lifecycle::start(&config).await?;
    let tracker = server.tracker();

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        trigger.trigger();
    });

    server.serve_until(shutdown.wait()).await?;

    let drain_timeout = Duration::from_secs(config.server.drain_timeout_secs);
    if !tracker.wait_for_idle(drain_timeout).await {
        tracing::warn!(
            active_connections = tracker.active_count(),
            "Drain timeout elapsed, abandoning open connections"
        );
    }

    tracing::info!(
        accepted = tracker.accepted(),
        exchanges = tracker.exchanges(),
        "Shutdown complete"
    );
    Ok(())
}
