//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the exporter.
//! All types derive Serde traits for deserialization from config files;
//! durations are written in humantime form (`"2s"`, `"250ms"`).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the exporter.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ExporterConfig {
    /// Backend endpoints, credentials and per-probe timeouts.
    pub probe: ProbeConfig,

    /// Scheduler settings.
    pub scrape: ScrapeConfig,

    /// Metrics endpoint settings.
    pub observability: ObservabilityConfig,
}

/// Everything a probe needs to reach the backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Base URL of the backend HTTP API (e.g., "http://backend:3001").
    pub backend_base: String,

    /// WebSocket endpoint used for the ping probe.
    pub ws_url: String,

    /// Static bearer token attached to every outbound request.
    pub api_token: Option<String>,

    /// Per-probe-kind timeouts.
    pub timeouts: TimeoutPolicy,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            backend_base: "http://backend:3001".to_string(),
            ws_url: "ws://backend:3001/ws".to_string(),
            api_token: None,
            timeouts: TimeoutPolicy::default(),
        }
    }
}

impl ProbeConfig {
    /// Join a path onto the backend base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.backend_base.trim_end_matches('/'), path)
    }

    /// Value for the `Authorization` header, if a token is configured.
    pub fn bearer(&self) -> Option<String> {
        self.api_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|t| format!("Bearer {}", t))
    }
}

/// Timeouts applied to individual probe calls.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutPolicy {
    /// Whole-request timeout for the health and census probes.
    #[serde(with = "humantime_serde")]
    pub http: Duration,

    /// Timeout for the WebSocket opening handshake.
    #[serde(with = "humantime_serde")]
    pub websocket_handshake: Duration,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            http: Duration::from_secs(2),
            websocket_handshake: Duration::from_secs(3),
        }
    }
}

/// What a scrape cycle does after the census probe fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CensusFailurePolicy {
    /// End the cycle; the WebSocket probe is skipped.
    #[default]
    Abort,
    /// Keep the census error as the cycle error but still run the WebSocket probe.
    Continue,
}

/// Scheduler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Interval between scrape cycles.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Optional deadline for a whole cycle, threaded through every probe.
    #[serde(with = "humantime_serde")]
    pub cycle_timeout: Option<Duration>,

    /// Behaviour after a census failure.
    pub census_failure: CensusFailurePolicy,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            cycle_timeout: None,
            census_failure: CensusFailurePolicy::Abort,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Metrics endpoint bind address.
    pub metrics_address: String,

    /// HTTP path the metrics are served on.
    pub metrics_path: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_address: "0.0.0.0:9101".to_string(),
            metrics_path: "/metrics".to_string(),
        }
    }
}
