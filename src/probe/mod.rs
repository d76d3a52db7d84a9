//! Probe subsystem.
//!
//! # Data Flow
//! ```text
//! Scrape cycle
//!     → health.rs    GET /health   → HealthResult (up, latency)
//!     → census.rs    GET /users    → CensusResult (online, in_game)
//!     → websocket.rs ping / pong   → round-trip time
//! ```
//!
//! # Design Decisions
//! - Each probe is a single attempt with its own timeout
//! - Probes never touch metrics; the cycle publishes their results
//! - `Probes` is the seam the cycle depends on, `BackendProber` the real one

pub mod census;
pub mod error;
pub mod health;
pub mod websocket;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::ProbeConfig;

pub use census::{CensusResult, UserRecord};
pub use error::{ProbeError, ProbeResult};
pub use health::HealthResult;
pub use websocket::{PingConnector, PingTransport, TungsteniteConnector};

/// The three checks a scrape cycle runs.
///
/// `deadline` is the cycle's overall deadline, if one is configured.
#[async_trait]
pub trait Probes: Send + Sync {
    async fn check_health(&self, deadline: Option<Instant>) -> ProbeResult<HealthResult>;

    async fn collect_users(&self, deadline: Option<Instant>) -> ProbeResult<CensusResult>;

    async fn check_websocket(&self, deadline: Option<Instant>) -> ProbeResult<Duration>;
}

#[async_trait]
impl<P: Probes + ?Sized> Probes for Arc<P> {
    async fn check_health(&self, deadline: Option<Instant>) -> ProbeResult<HealthResult> {
        (**self).check_health(deadline).await
    }

    async fn collect_users(&self, deadline: Option<Instant>) -> ProbeResult<CensusResult> {
        (**self).collect_users(deadline).await
    }

    async fn check_websocket(&self, deadline: Option<Instant>) -> ProbeResult<Duration> {
        (**self).check_websocket(deadline).await
    }
}

/// Probes a real backend over HTTP and WebSocket.
pub struct BackendProber<C = TungsteniteConnector> {
    client: Client,
    config: Arc<ProbeConfig>,
    connector: C,
}

impl BackendProber<TungsteniteConnector> {
    /// Create a prober using `tokio-tungstenite` for the WebSocket probe.
    pub fn new(config: Arc<ProbeConfig>) -> Result<Self, reqwest::Error> {
        Self::with_connector(config, TungsteniteConnector)
    }
}

impl<C: PingConnector> BackendProber<C> {
    /// Create a prober with a custom WebSocket connector.
    pub fn with_connector(config: Arc<ProbeConfig>, connector: C) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("transc-exporter/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            config,
            connector,
        })
    }

    /// The configuration this prober was built with.
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }
}

#[async_trait]
impl<C: PingConnector> Probes for BackendProber<C> {
    async fn check_health(&self, deadline: Option<Instant>) -> ProbeResult<HealthResult> {
        health::check_health(&self.client, &self.config, deadline).await
    }

    async fn collect_users(&self, deadline: Option<Instant>) -> ProbeResult<CensusResult> {
        census::collect_users(&self.client, &self.config, deadline).await
    }

    async fn check_websocket(&self, deadline: Option<Instant>) -> ProbeResult<Duration> {
        websocket::check_websocket(&self.connector, &self.config, deadline).await
    }
}

/// Attach the bearer header when a token is configured.
pub(crate) fn authorized(request: RequestBuilder, config: &ProbeConfig) -> RequestBuilder {
    match config.bearer() {
        Some(value) => request.header(AUTHORIZATION, value),
        None => request,
    }
}
