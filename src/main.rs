//! Request-scoped tracing harness (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────┐
//!                     │                  TRACING HARNESS                     │
//!                     │                                                      │
//!   Client Request    │  ┌─────────┐    ┌──────────────┐                     │
//!   ──────────────────┼─▶│  http   │───▶│  call_tree   │ deadline + root span│
//!                     │  │ server  │    │ orchestrator │                     │
//!                     │  └─────────┘    └──────┬───────┘                     │
//!                     │                        │ in sequence                 │
//!                     │                        ▼                             │
//!                     │        ┌─────────────────────────────┐               │
//!                     │        │ operations                  │               │
//!                     │        │  auth ─▶ auth_inner         │               │
//!                     │        │  query                      │               │
//!                     │        └──────────────┬──────────────┘               │
//!                     │                       │ finished spans               │
//!                     │                       ▼                              │
//!   Client Response   │  ┌─────────┐    ┌──────────────┐                     │
//!   ◀─────────────────┼──│ "hello" │    │    sinks     │ collect/log/metrics │
//!                     │  └─────────┘    └──────────────┘                     │
//!                     │                                                      │
//!                     │  config · lifecycle · resilience · observability     │
//!                     └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use deadline_trace::config::{load_config, AppConfig};
use deadline_trace::lifecycle::{build_app, wait_for_signal, Shutdown};
use deadline_trace::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "deadline-trace")]
#[command(about = "Request-scoped tracing harness", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!("deadline-trace v0.1.0 starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        budget_ms = config.deadline.budget_ms,
        service = %config.tracer.service_name,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let bind_address = config.listener.bind_address.clone();
    let app = build_app(config)?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    let server = tokio::spawn(app.server.run(listener, server_shutdown));
    wait_for_signal().await;
    shutdown.trigger();
    server.await??;

    let stats = app.tracer.stats();
    tracing::info!(
        spans_started = stats.started,
        spans_finished = stats.finished,
        "Shutdown complete"
    );
    Ok(())
}
