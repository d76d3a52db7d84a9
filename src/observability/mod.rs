//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Scrape engine produces:
//!     → logging.rs (structured log events, one span per cycle)
//!     → metrics.rs (gauges, histograms, counter via MetricsSink)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape, see http::server)
//! ```

pub mod logging;
pub mod metrics;

pub use metrics::{Counter, Gauge, Histogram, MetricsSink, PrometheusSink, Snapshot, SnapshotSink};
