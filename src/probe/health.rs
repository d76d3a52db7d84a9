//! Backend health probe.
//!
//! One `GET {backend_base}/health`. Any response counts as a successful
//! probe; only 2xx counts as "up". Transport failures carry no latency.

use reqwest::Client;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::ProbeConfig;
use crate::probe::authorized;
use crate::probe::error::{ProbeError, ProbeResult};
use crate::resilience::timeouts::bounded_timeout;

/// Path probed on the backend.
pub const HEALTH_PATH: &str = "/health";

/// Outcome of a health probe that received a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthResult {
    /// True iff the status was 200-299.
    pub up: bool,
    /// Time from dispatch to response headers.
    pub latency: Duration,
    /// HTTP status code returned by the backend.
    pub status: u16,
}

/// Probe `{backend_base}/health`.
pub async fn check_health(
    client: &Client,
    config: &ProbeConfig,
    deadline: Option<Instant>,
) -> ProbeResult<HealthResult> {
    let url = config.endpoint(HEALTH_PATH);
    let timeout = bounded_timeout(Instant::now(), config.timeouts.http, deadline);
    let request = authorized(client.get(&url), config).timeout(timeout);

    let started = Instant::now();
    let response = request
        .send()
        .await
        .map_err(|source| ProbeError::Transport { probe: "health", source })?;
    let latency = started.elapsed();

    let status = response.status();
    drop(response);

    if !status.is_success() {
        tracing::warn!(url = %url, status = status.as_u16(), "Backend reported unhealthy status");
    }
    tracing::debug!(
        url = %url,
        status = status.as_u16(),
        latency_ms = latency.as_millis() as u64,
        "Health probe finished"
    );

    Ok(HealthResult {
        up: status.is_success(),
        latency,
        status: status.as_u16(),
    })
}
