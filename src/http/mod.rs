//! HTTP exposition subsystem.
//!
//! # Data Flow
//! ```text
//! Prometheus scrape
//!     → server.rs (Axum router, trace layer)
//!     → render closure (PrometheusHandle::render)
//!     → text exposition response
//! ```

pub mod server;

pub use server::{MetricsServer, Render};
