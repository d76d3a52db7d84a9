//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check URL schemes for the HTTP and WebSocket endpoints
//! - Validate value ranges (timeouts > 0, bind address parses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ExporterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::schema::ExporterConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid URL '{value}': {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{field}: unsupported scheme '{scheme}', expected one of {expected}")]
    UnsupportedScheme {
        field: &'static str,
        scheme: String,
        expected: &'static str,
    },

    #[error("{field}: duration must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("observability.metrics_address: '{0}' is not a socket address")]
    InvalidBindAddress(String),

    #[error("observability.metrics_path: '{0}' must start with '/'")]
    InvalidMetricsPath(String),
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &ExporterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_url(
        &mut errors,
        "probe.backend_base",
        &config.probe.backend_base,
        &["http", "https"],
        "http, https",
    );
    check_url(
        &mut errors,
        "probe.ws_url",
        &config.probe.ws_url,
        &["ws", "wss"],
        "ws, wss",
    );

    check_duration(&mut errors, "probe.timeouts.http", config.probe.timeouts.http);
    check_duration(
        &mut errors,
        "probe.timeouts.websocket_handshake",
        config.probe.timeouts.websocket_handshake,
    );
    check_duration(&mut errors, "scrape.interval", config.scrape.interval);
    if let Some(cycle_timeout) = config.scrape.cycle_timeout {
        check_duration(&mut errors, "scrape.cycle_timeout", cycle_timeout);
    }

    let address = &config.observability.metrics_address;
    if address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(address.clone()));
    }

    let path = &config.observability.metrics_path;
    if !path.starts_with('/') {
        errors.push(ValidationError::InvalidMetricsPath(path.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(
    errors: &mut Vec<ValidationError>,
    field: &'static str,
    value: &str,
    schemes: &[&str],
    expected: &'static str,
) {
    match Url::parse(value) {
        Ok(url) if schemes.contains(&url.scheme()) => {}
        Ok(url) => errors.push(ValidationError::UnsupportedScheme {
            field,
            scheme: url.scheme().to_string(),
            expected,
        }),
        Err(e) => errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn check_duration(errors: &mut Vec<ValidationError>, field: &'static str, value: Duration) {
    if value.is_zero() {
        errors.push(ValidationError::ZeroDuration { field });
    }
}
