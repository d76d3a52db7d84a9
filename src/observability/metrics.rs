//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define the exporter's metric identities (names, help, buckets)
//! - Provide the `MetricsSink` seam the scrape engine publishes through
//! - Install the Prometheus recorder behind the `metrics` facade
//!
//! # Metrics
//! - `transc_scrape_duration_seconds` (histogram): scrape cycle duration
//! - `transc_scrape_errors_total` (counter): cycles that reported an error
//! - `backend_health_up` (gauge): 1=healthy, 0=unhealthy
//! - `backend_health_latency_seconds` (histogram): /health latency
//! - `users_online`, `users_in_game` (gauges): census totals
//! - `websocket_up` (gauge): 1=ping answered, 0=failed
//! - `websocket_ping_rtt_seconds` (histogram): ping round-trip time
//! - `process_*`: CPU, memory, file descriptors and threads of the exporter
//!
//! # Design Decisions
//! - The engine only sees `MetricsSink`; tests and `--once` use `SnapshotSink`
//! - Histogram buckets are set per metric when the recorder is installed
//! - Process metrics are sampled on render, so they are fresh per scrape

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;

const LATENCY_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
const RTT_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gauge {
    BackendHealthUp,
    UsersOnline,
    UsersInGame,
    WebsocketUp,
}

impl Gauge {
    pub const ALL: [Gauge; 4] = [
        Gauge::BackendHealthUp,
        Gauge::UsersOnline,
        Gauge::UsersInGame,
        Gauge::WebsocketUp,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Gauge::BackendHealthUp => "backend_health_up",
            Gauge::UsersOnline => "users_online",
            Gauge::UsersInGame => "users_in_game",
            Gauge::WebsocketUp => "websocket_up",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            Gauge::BackendHealthUp => "Backend health status (1 = up, 0 = down)",
            Gauge::UsersOnline => "Number of users currently online",
            Gauge::UsersInGame => "Number of users currently in-game",
            Gauge::WebsocketUp => "WebSocket connection status (1 = up, 0 = down)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Histogram {
    ScrapeDuration,
    BackendHealthLatency,
    WebsocketPingRtt,
}

impl Histogram {
    pub const ALL: [Histogram; 3] = [
        Histogram::ScrapeDuration,
        Histogram::BackendHealthLatency,
        Histogram::WebsocketPingRtt,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Histogram::ScrapeDuration => "transc_scrape_duration_seconds",
            Histogram::BackendHealthLatency => "backend_health_latency_seconds",
            Histogram::WebsocketPingRtt => "websocket_ping_rtt_seconds",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            Histogram::ScrapeDuration => "Scrape time in seconds",
            Histogram::BackendHealthLatency => "Backend health check latency in seconds",
            Histogram::WebsocketPingRtt => "WebSocket ping round-trip time in seconds",
        }
    }

    pub fn buckets(self) -> &'static [f64] {
        match self {
            Histogram::ScrapeDuration | Histogram::BackendHealthLatency => LATENCY_BUCKETS,
            Histogram::WebsocketPingRtt => RTT_BUCKETS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    ScrapeErrors,
}

impl Counter {
    pub const ALL: [Counter; 1] = [Counter::ScrapeErrors];

    pub fn name(self) -> &'static str {
        match self {
            Counter::ScrapeErrors => "transc_scrape_errors_total",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            Counter::ScrapeErrors => "Total number of scrape errors",
        }
    }
}

/// Destination for every value the scrape engine observes.
pub trait MetricsSink: Send + Sync {
    fn set(&self, gauge: Gauge, value: f64);

    fn observe(&self, histogram: Histogram, value: f64);

    fn increment(&self, counter: Counter);
}

impl<S: MetricsSink + ?Sized> MetricsSink for Arc<S> {
    fn set(&self, gauge: Gauge, value: f64) {
        (**self).set(gauge, value)
    }

    fn observe(&self, histogram: Histogram, value: f64) {
        (**self).observe(histogram, value)
    }

    fn increment(&self, counter: Counter) {
        (**self).increment(counter)
    }
}

/// Sink that writes through the global `metrics` recorder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusSink;

impl MetricsSink for PrometheusSink {
    fn set(&self, gauge: Gauge, value: f64) {
        metrics::gauge!(gauge.name()).set(value);
    }

    fn observe(&self, histogram: Histogram, value: f64) {
        metrics::histogram!(histogram.name()).record(value);
    }

    fn increment(&self, counter: Counter) {
        metrics::counter!(counter.name()).increment(1);
    }
}

/// Install the Prometheus recorder as the global `metrics` recorder.
///
/// Must be called once, before any `PrometheusSink` is used.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let mut builder = PrometheusBuilder::new();
    for histogram in Histogram::ALL {
        builder = builder.set_buckets_for_metric(
            Matcher::Full(histogram.name().to_string()),
            histogram.buckets(),
        )?;
    }
    let handle = builder.install_recorder()?;

    for gauge in Gauge::ALL {
        metrics::describe_gauge!(gauge.name(), gauge.help());
    }
    for histogram in Histogram::ALL {
        metrics::describe_histogram!(histogram.name(), histogram.help());
    }
    for counter in Counter::ALL {
        metrics::describe_counter!(counter.name(), counter.help());
        metrics::counter!(counter.name()).absolute(0);
    }

    metrics_process::Collector::default().describe();

    tracing::info!("Prometheus recorder installed");
    Ok(handle)
}

/// Exposition text for the metrics endpoint.
///
/// Process metrics are collected right before each render.
pub fn exposition(handle: PrometheusHandle) -> impl Fn() -> String + Send + Sync + 'static {
    let collector = metrics_process::Collector::default();
    move || {
        collector.collect();
        handle.render()
    }
}

/// Periodically drain histogram buffers until shutdown.
pub async fn run_upkeep(
    handle: PrometheusHandle,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = ticker.tick() => handle.run_upkeep(),
            _ = shutdown.recv() => break,
        }
    }
}

/// Point-in-time view of everything a `SnapshotSink` received.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    /// Last value set per gauge.
    pub gauges: BTreeMap<&'static str, f64>,
    /// Every value observed per histogram, in order.
    pub observations: BTreeMap<&'static str, Vec<f64>>,
    /// Increment count per counter.
    pub counters: BTreeMap<&'static str, u64>,
}

impl Snapshot {
    pub fn gauge(&self, gauge: Gauge) -> Option<f64> {
        self.gauges.get(gauge.name()).copied()
    }

    pub fn observed(&self, histogram: Histogram) -> &[f64] {
        self.observations
            .get(histogram.name())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn counter(&self, counter: Counter) -> u64 {
        self.counters.get(counter.name()).copied().unwrap_or_default()
    }
}

/// In-memory sink, used for one-shot runs and tests.
#[derive(Debug, Default)]
pub struct SnapshotSink {
    inner: Mutex<Snapshot>,
}

impl SnapshotSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Snapshot) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl MetricsSink for SnapshotSink {
    fn set(&self, gauge: Gauge, value: f64) {
        self.with(|s| s.gauges.insert(gauge.name(), value));
    }

    fn observe(&self, histogram: Histogram, value: f64) {
        self.with(|s| {
            s.observations
                .entry(histogram.name())
                .or_default()
                .push(value)
        });
    }

    fn increment(&self, counter: Counter) {
        self.with(|s| *s.counters.entry(counter.name()).or_default() += 1);
    }
}
