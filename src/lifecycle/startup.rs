//! Startup orchestration.
//!
//! # Responsibilities
//! - Install the metrics recorder and bind the metrics listener
//! - Start background tasks (metrics server, upkeep, scheduler)
//! - Wait for a signal, then shut everything down in order
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, probe failures never are
//! - The listener is bound before the first scrape

use metrics_exporter_prometheus::BuildError;
use std::net::{AddrParseError, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ExporterConfig;
use crate::http::MetricsServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::wait_for_signal;
use crate::observability::metrics::{exposition, init_metrics, run_upkeep};
use crate::observability::{PrometheusSink, Snapshot, SnapshotSink};
use crate::probe::BackendProber;
use crate::scrape::{CycleOutcome, Scheduler};

const UPKEEP_PERIOD: Duration = Duration::from_secs(5);

/// Errors that stop the exporter before it starts scraping.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to install metrics recorder: {0}")]
    Recorder(#[from] BuildError),

    #[error("invalid metrics address: {0}")]
    Address(#[from] AddrParseError),

    #[error("failed to bind metrics endpoint on {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Run the exporter until SIGINT or SIGTERM.
pub async fn run(config: ExporterConfig) -> Result<(), StartupError> {
    let shutdown = Shutdown::new();

    let handle = init_metrics()?;
    let address: SocketAddr = config.observability.metrics_address.parse()?;
    let listener = TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    let prober = BackendProber::new(Arc::new(config.probe.clone()))?;

    let server = MetricsServer::new(
        Arc::new(exposition(handle.clone())),
        &config.observability.metrics_path,
    );
    let server_shutdown = shutdown.subscribe();
    let server_task = tokio::spawn(async move {
        if let Err(e) = server.run(listener, server_shutdown).await {
            tracing::error!(error = %e, "Metrics server failed");
        }
    });

    let upkeep_task = tokio::spawn(run_upkeep(handle, UPKEEP_PERIOD, shutdown.subscribe()));

    tracing::info!(
        backend_base = %config.probe.backend_base,
        ws_url = %config.probe.ws_url,
        token = config.probe.bearer().is_some(),
        metrics = %format!("{}{}", address, config.observability.metrics_path),
        "Exporter started"
    );

    let scheduler = Scheduler::new(prober, PrometheusSink, config.scrape.clone());
    let scheduler_task = tokio::spawn(scheduler.run(shutdown.subscribe()));

    wait_for_signal().await;
    shutdown.trigger();

    let _ = scheduler_task.await;
    let _ = server_task.await;
    let _ = upkeep_task.await;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Run one scrape cycle against an in-memory sink.
pub async fn run_once(config: ExporterConfig) -> Result<(CycleOutcome, Snapshot), StartupError> {
    let prober = BackendProber::new(Arc::new(config.probe.clone()))?;
    let scheduler = Scheduler::new(prober, SnapshotSink::new(), config.scrape.clone());

    let outcome = scheduler.scrape_once().await;
    let snapshot = scheduler.sink().snapshot();
    Ok((outcome, snapshot))
}
