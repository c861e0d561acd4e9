//! graph-pool
//!
//! Opens a connection pool against a graph server and keeps it healthy until
//! interrupted.
//!
//! # Architecture Overview
//!
//! ```text
//!     ┌──────────────────────────────────────────────────────────────┐
//!     │                         CONNECTION POOL                      │
//!     │                                                              │
//!     │   acquire()                                                  │
//!     │  ───────────▶ ┌─────────────┐    ┌───────────┐               │
//!     │               │ acquisition │───▶│ selection │──┐            │
//!     │               │  (backoff)  │    └───────────┘  │            │
//!     │               └─────────────┘                   ▼            │
//!     │                                          ┌─────────────┐     │
//!     │   PooledConnection ◀─────────────────────│ slot table  │     │
//!     │                                          │ [c0 c1 .. ] │     │
//!     │                                          └──────▲──────┘     │
//!     │                                                 │            │
//!     │                        ┌────────────────┐       │ swap       │
//!     │                        │ health monitor │───────┘            │
//!     │                        └───────┬────────┘                    │
//!     │                                │ connect                     │
//!     └────────────────────────────────┼─────────────────────────────┘
//!                                      ▼
//!                                 Graph Server
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use graph_pool::config::{self, PoolConfig};
use graph_pool::observability::{logging, metrics};
use graph_pool::ConnectionPool;

#[derive(Parser)]
#[command(name = "graph-pool")]
#[command(about = "Connection pool for a graph database server", long_about = None)]
struct Cli {
    /// Configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the pool and report its state until Ctrl-C
    Run {
        /// Seconds between stats reports
        #[arg(long, default_value_t = 10)]
        report_secs: u64,
    },
    /// Validate the configuration and print the resolved pool settings
    Check,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => PoolConfig::default(),
    };

    match cli.command {
        Commands::Check => {
            let settings = config.pool_settings()?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        Commands::Run { report_secs } => run(config, Duration::from_secs(report_secs.max(1))).await?,
    }

    Ok(())
}

async fn run(config: PoolConfig, report_every: Duration) -> Result<(), Box<dyn std::error::Error>> {
    logging::init(&config.observability);
    tracing::info!("graph-pool v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let pool = ConnectionPool::from_config(&config).await?;

    let mut report = tokio::time::interval(report_every);
    loop {
        tokio::select! {
            _ = report.tick() => {
                let stats = pool.stats();
                tracing::info!(
                    open = stats.open_connections,
                    reconnecting = stats.reconnecting_slots,
                    in_flight = stats.in_flight,
                    acquired = stats.acquired_total,
                    busy = stats.busy_total,
                    unavailable = stats.unavailable_total,
                    "Pool stats"
                );
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                tracing::info!("Received Ctrl-C, initiating shutdown");
                break;
            }
        }
    }

    let report = pool.shutdown(config.drain_timeout()).await;
    tracing::info!(
        drained = report.drained,
        closed_connections = report.closed_connections,
        "Shutdown complete"
    );
    Ok(())
}
