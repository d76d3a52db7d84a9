//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::config::schema::ExporterConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: defaults, then the optional TOML file, then the
/// process environment. The result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<ExporterConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ExporterConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` returns the raw value of a variable; empty values count as
/// unset. A duration that does not parse keeps the current value.
pub fn apply_env_overrides<F>(config: &mut ExporterConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(v) = get("BACKEND_BASE") {
        config.probe.backend_base = v;
    }
    if let Some(v) = get("WS_URL") {
        config.probe.ws_url = v;
    }
    if let Some(v) = get("API_TOKEN") {
        config.probe.api_token = Some(v);
    }
    if let Some(v) = get("METRICS_ADDRESS") {
        config.observability.metrics_address = v;
    }
    if let Some(v) = get("METRICS_PATH") {
        config.observability.metrics_path = v;
    }

    override_duration(get("SCRAPE_INTERVAL"), "SCRAPE_INTERVAL", &mut config.scrape.interval);
    override_duration(get("HTTP_TIMEOUT"), "HTTP_TIMEOUT", &mut config.probe.timeouts.http);
    override_duration(
        get("WS_TIMEOUT"),
        "WS_TIMEOUT",
        &mut config.probe.timeouts.websocket_handshake,
    );

    let mut cycle_timeout = config.scrape.cycle_timeout.unwrap_or_default();
    if override_duration(get("CYCLE_TIMEOUT"), "CYCLE_TIMEOUT", &mut cycle_timeout) {
        config.scrape.cycle_timeout = Some(cycle_timeout);
    }
}

/// Returns whether `target` was replaced.
fn override_duration(raw: Option<String>, key: &str, target: &mut Duration) -> bool {
    let Some(raw) = raw else { return false };
    match parse_duration(&raw) {
        Ok(d) => {
            *target = d;
            true
        }
        Err(e) => {
            tracing::warn!(key, value = %raw, error = %e, "Ignoring unparseable duration");
            false
        }
    }
}

/// Parse a duration the way `humantime` does, also accepting fractional
/// amounts such as `1.5s` or `1h0.5m`.
pub fn parse_duration(raw: &str) -> Result<Duration, humantime::DurationError> {
    humantime::parse_duration(raw).or_else(|e| parse_fractional(raw).ok_or(e))
}

fn parse_fractional(raw: &str) -> Option<Duration> {
    let mut rest = raw.trim();
    if rest.is_empty() {
        return None;
    }

    let mut nanos = 0f64;
    while !rest.is_empty() {
        let unit_start = rest.find(|c: char| !(c.is_ascii_digit() || c == '.'))?;
        let (amount, tail) = rest.split_at(unit_start);
        let amount: f64 = amount.parse().ok()?;

        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_end);
        let scale = match unit {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return None,
        };

        nanos += amount * scale;
        rest = next;
    }

    let nanos = nanos.round();
    (nanos.is_finite() && nanos <= u64::MAX as f64).then(|| Duration::from_nanos(nanos as u64))
}
