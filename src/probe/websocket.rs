//! WebSocket ping latency probe.
//!
//! # Responsibilities
//! - Open a WebSocket to the backend (optional bearer header)
//! - Send one ping control frame and time the matching pong
//! - Close the connection on every exit path
//!
//! # Data Flow
//! ```text
//! connect (handshake timeout)
//!     → send ping (bounded by ping deadline)
//!     → read frames until pong / read error / deadline
//!     → close
//! ```
//!
//! # Design Decisions
//! - Pongs only surface while reading, so the probe keeps pulling frames
//! - Ping deadline = min(now + 2s, caller deadline), independent of the
//!   handshake timeout
//! - Transport sits behind `PingConnector` / `PingTransport` so the probe
//!   logic runs against fakes in tests

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{timeout, timeout_at, Instant};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::config::ProbeConfig;
use crate::probe::error::{ProbeError, ProbeResult};
use crate::resilience::timeouts::{bounded_timeout, capped_deadline};

/// Upper bound on the ping/pong phase.
pub const PING_BUDGET: Duration = Duration::from_secs(2);

/// Payload carried by the ping frame.
pub const PING_PAYLOAD: &[u8] = b"ping";

/// How long a close handshake may take before the socket is just dropped.
const CLOSE_GRACE: Duration = Duration::from_millis(500);

/// A frame as seen by the probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Pong(Vec<u8>),
    Other,
}

/// An open WebSocket connection, owned by one probe call.
#[async_trait]
pub trait PingTransport: Send {
    async fn send_ping(&mut self, payload: &[u8]) -> Result<(), tungstenite::Error>;

    /// Next frame from the peer. A close frame or end of stream is an error.
    async fn next_frame(&mut self) -> Result<Frame, tungstenite::Error>;

    /// Release the connection. Never fails; problems are logged.
    async fn close(&mut self);
}

/// Opens WebSocket connections.
#[async_trait]
pub trait PingConnector: Send + Sync {
    type Transport: PingTransport;

    async fn connect(
        &self,
        url: &str,
        bearer: Option<&str>,
    ) -> Result<Self::Transport, tungstenite::Error>;
}

/// Real connector backed by `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

/// A `tokio-tungstenite` client stream.
pub struct TungsteniteTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl PingConnector for TungsteniteConnector {
    type Transport = TungsteniteTransport;

    async fn connect(
        &self,
        url: &str,
        bearer: Option<&str>,
    ) -> Result<TungsteniteTransport, tungstenite::Error> {
        let mut request = url.into_client_request()?;
        if let Some(bearer) = bearer {
            let value = HeaderValue::from_str(bearer)
                .map_err(|e| tungstenite::Error::HttpFormat(e.into()))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        let (stream, response) = tokio_tungstenite::connect_async(request).await?;
        tracing::debug!(url, status = response.status().as_u16(), "WebSocket connected");

        Ok(TungsteniteTransport { stream })
    }
}

#[async_trait]
impl PingTransport for TungsteniteTransport {
    async fn send_ping(&mut self, payload: &[u8]) -> Result<(), tungstenite::Error> {
        self.stream.send(Message::Ping(payload.to_vec().into())).await
    }

    async fn next_frame(&mut self) -> Result<Frame, tungstenite::Error> {
        match self.stream.next().await {
            Some(Ok(Message::Pong(payload))) => Ok(Frame::Pong(payload.to_vec())),
            Some(Ok(Message::Close(_))) | None => Err(tungstenite::Error::ConnectionClosed),
            Some(Ok(_)) => Ok(Frame::Other),
            Some(Err(e)) => Err(e),
        }
    }

    async fn close(&mut self) {
        match timeout(CLOSE_GRACE, self.stream.close(None)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::trace!(error = %e, "WebSocket close failed"),
            Err(_) => tracing::trace!("WebSocket close handshake timed out"),
        }
    }
}

/// Measure WebSocket ping round-trip time.
///
/// `deadline` is the caller's overall deadline, if any. It shortens both
/// the handshake timeout and the 2 second ping budget.
pub async fn check_websocket<C: PingConnector>(
    connector: &C,
    config: &ProbeConfig,
    deadline: Option<Instant>,
) -> ProbeResult<Duration> {
    let handshake = bounded_timeout(
        Instant::now(),
        config.timeouts.websocket_handshake,
        deadline,
    );
    let bearer = config.bearer();

    let mut transport =
        match timeout(handshake, connector.connect(&config.ws_url, bearer.as_deref())).await {
            Ok(Ok(transport)) => transport,
            Ok(Err(e)) => return Err(ProbeError::WsHandshake(e)),
            Err(_) => return Err(ProbeError::WsHandshakeTimeout(handshake)),
        };

    let outcome = ping_pong(&mut transport, deadline).await;
    transport.close().await;

    if let Ok(rtt) = &outcome {
        tracing::debug!(
            url = %config.ws_url,
            rtt_ms = rtt.as_millis() as u64,
            "WebSocket ping answered"
        );
    }
    outcome
}

async fn ping_pong<T: PingTransport>(
    transport: &mut T,
    outer: Option<Instant>,
) -> ProbeResult<Duration> {
    let sent_at = Instant::now();
    let deadline = capped_deadline(sent_at, PING_BUDGET, outer);
    let budget = deadline.saturating_duration_since(sent_at);

    match timeout_at(deadline, transport.send_ping(PING_PAYLOAD)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(ProbeError::WsWrite(e)),
        Err(_) => return Err(ProbeError::WsTimeout(budget)),
    }

    loop {
        match timeout_at(deadline, transport.next_frame()).await {
            Ok(Ok(Frame::Pong(payload))) => {
                let rtt = sent_at.elapsed();
                if payload != PING_PAYLOAD {
                    tracing::debug!(len = payload.len(), "Pong payload differs from ping payload");
                }
                return Ok(rtt);
            }
            Ok(Ok(Frame::Other)) => continue,
            Ok(Err(e)) => return Err(ProbeError::WsRead(e)),
            Err(_) => return Err(ProbeError::WsTimeout(budget)),
        }
    }
}
