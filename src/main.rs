//! Backend probe exporter.
//!
//! Periodically probes a backend and republishes what it saw as
//! Prometheus metrics.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                  TRANSC EXPORTER                      │
//!                 │                                                       │
//!                 │  ┌───────────┐   ┌────────────┐   ┌───────────────┐  │
//!                 │  │ scheduler │──▶│   cycle    │──▶│ health probe  │──┼──▶ GET /health
//!                 │  │ (ticker)  │   │ sequential │   ├───────────────┤  │
//!                 │  └───────────┘   │            │──▶│ census probe  │──┼──▶ GET /users
//!                 │                  │            │   ├───────────────┤  │
//!                 │                  │            │──▶│ ws ping probe │──┼──▶ ws ping/pong
//!                 │                  └─────┬──────┘   └───────────────┘  │
//!                 │                        ▼                              │
//!                 │                 ┌─────────────┐   ┌───────────────┐  │
//!   Prometheus ◀──┼─────────────────│ metrics     │◀──│ MetricsSink   │  │
//!   scrape        │                 │ server      │   │ (recorder)    │  │
//!                 │                 └─────────────┘   └───────────────┘  │
//!                 └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use transc_exporter::config::load_config;
use transc_exporter::lifecycle::startup;
use transc_exporter::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "transc-exporter", version)]
#[command(about = "Prometheus exporter for backend health, user census and WebSocket latency", long_about = None)]
struct Cli {
    /// TOML configuration file; environment variables override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single scrape cycle, print the observed values as JSON and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging();

    tracing::info!("transc-exporter v{} starting", env!("CARGO_PKG_VERSION"));

    let config = load_config(cli.config.as_deref())?;

    tracing::info!(
        backend_base = %config.probe.backend_base,
        ws_url = %config.probe.ws_url,
        interval_ms = config.scrape.interval.as_millis() as u64,
        http_timeout_ms = config.probe.timeouts.http.as_millis() as u64,
        ws_timeout_ms = config.probe.timeouts.websocket_handshake.as_millis() as u64,
        "Configuration loaded"
    );

    if cli.once {
        let (outcome, snapshot) = startup::run_once(config).await?;
        let report = serde_json::json!({
            "ok": outcome.is_ok(),
            "error": outcome.error.as_ref().map(ToString::to_string),
            "metrics": snapshot,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);

        return Ok(if outcome.is_ok() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    startup::run(config).await?;
    Ok(ExitCode::SUCCESS)
}
