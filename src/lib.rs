//! Backend probe exporter library.
//!
//! Probes a backend's `/health` and `/users` endpoints and its WebSocket
//! ping latency on a fixed interval, and republishes the results as
//! Prometheus metrics.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod probe;
pub mod resilience;
pub mod scrape;

pub use config::ExporterConfig;
pub use lifecycle::Shutdown;
pub use observability::MetricsSink;
pub use probe::{BackendProber, Probes};
pub use scrape::Scheduler;
