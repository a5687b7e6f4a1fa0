//! Elastic load balancer (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────┐
//!                       │                  LOAD BALANCER                   │
//!                       │                                                  │
//!   POST /sendRequest   │  ┌────────┐    ┌──────────────┐    ┌──────────┐  │
//!   ────────────────────┼─▶│  http  │───▶│   routing    │───▶│  worker  │──┼──▶ Worker
//!                       │  │ server │    │   engine     │    │  client  │  │   (primary)
//!                       │  └────────┘    └──────┬───────┘    └──────────┘  │
//!                       │                       │                          │
//!                       │          ┌────────────┼────────────┐             │
//!                       │          ▼            ▼            ▼             │
//!                       │     ┌────────┐  ┌──────────┐  ┌──────────┐       │
//!                       │     │ health │  │   pool   │  │collector │       │
//!                       │     │monitor │  │ primary/ │  │ cpu/rps  │       │
//!                       │     └────────┘  │ standby  │  └────┬─────┘       │
//!                       │                 └────▲─────┘       │             │
//!                       │                      │             ▼             │
//!                       │                 ┌────┴──────────────────┐        │
//!                       │                 │ autoscale controller  │        │
//!                       │                 └───────────────────────┘        │
//!                       │                                                  │
//!                       │  config · observability · lifecycle              │
//!                       └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use elastic_lb::config::loader::load_or_default;
use elastic_lb::lifecycle::{signals, startup};
use elastic_lb::observability::{logging, metrics};
use elastic_lb::{HttpServer, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "elastic-lb", version, about = "Autoscaling HTTP load balancer")]
struct Args {
    /// Path to a TOML config file, or a flat config.json
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let (config, load_error) = load_or_default(args.config.as_deref());
    logging::init_logging(&config.observability.log_level);

    tracing::info!("elastic-lb v{} starting", env!("CARGO_PKG_VERSION"));
    match (&args.config, load_error) {
        (None, _) => tracing::info!("No config file given, using defaults"),
        (Some(path), None) => tracing::info!(path = %path.display(), "Configuration loaded"),
        (Some(path), Some(e)) => {
            tracing::error!(path = %path.display(), error = %e, "Error reading config file, using defaults")
        }
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        algorithm = %config.balancer.algorithm,
        primary = config.workers.primary.len(),
        standby = config.workers.standby.len(),
        "Effective configuration"
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

    let listener = startup::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;

    let shutdown = Arc::new(Shutdown::new());
    signals::spawn_signal_handler(shutdown.clone());
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
