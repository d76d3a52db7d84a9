//! Probe error definitions.

use std::time::Duration;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors a single probe can fail with.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The request could not be sent or no response arrived in time.
    #[error("{probe}: transport error: {source}")]
    Transport {
        probe: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-2xx status.
    #[error("{probe}: unexpected status {status}: {body}")]
    Status {
        probe: &'static str,
        status: u16,
        body: String,
    },

    /// The body matched neither accepted JSON shape.
    #[error("users: decode failed: {array} / wrapped: {wrapped}")]
    Decode {
        array: serde_json::Error,
        wrapped: serde_json::Error,
    },

    /// The WebSocket opening handshake failed.
    #[error("websocket: handshake failed: {0}")]
    WsHandshake(#[source] tungstenite::Error),

    /// The WebSocket opening handshake did not finish in time.
    #[error("websocket: handshake timed out after {0:?}")]
    WsHandshakeTimeout(Duration),

    /// No pong arrived before the ping deadline.
    #[error("websocket: no pong within {0:?}")]
    WsTimeout(Duration),

    /// Writing the ping frame failed.
    #[error("websocket: ping write failed: {0}")]
    WsWrite(#[source] tungstenite::Error),

    /// Reading a frame after the ping failed.
    #[error("websocket: read failed: {0}")]
    WsRead(#[source] tungstenite::Error),
}

impl ProbeError {
    /// Whether this error came from the WebSocket probe.
    pub fn is_websocket(&self) -> bool {
        matches!(
            self,
            ProbeError::WsHandshake(_)
                | ProbeError::WsHandshakeTimeout(_)
                | ProbeError::WsTimeout(_)
                | ProbeError::WsWrite(_)
                | ProbeError::WsRead(_)
        )
    }
}

/// Result type for probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;
