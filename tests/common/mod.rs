//! Shared mock servers for integration tests.

#![allow(dead_code)]

use futures_util::StreamExt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http;
use transc_exporter::config::{ProbeConfig, TimeoutPolicy};

/// What the mock backend saw for one request.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub path: String,
    pub authorization: Option<String>,
}

/// Start a programmable HTTP backend on an ephemeral port.
///
/// `f` maps each request to a status code and body.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(SeenRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let Some(seen) = read_request(&mut socket).await else {
                            return;
                        };
                        let (status, body) = f(seen).await;
                        let status_text = match status {
                            200 => "200 OK",
                            401 => "401 Unauthorized",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Backend serving fixed `/health` and `/users` answers.
pub async fn start_backend(
    health_status: u16,
    users_status: u16,
    users_body: &'static str,
) -> SocketAddr {
    start_programmable_backend(move |req| async move {
        match req.path.as_str() {
            "/health" => (health_status, "ok".to_string()),
            "/users" => (users_status, users_body.to_string()),
            _ => (404, "not found".to_string()),
        }
    })
    .await
}

async fn read_request(socket: &mut TcpStream) -> Option<SeenRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 || buf.len() > 16 * 1024 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf);
    let mut lines = head.split("\r\n");
    let path = lines.next()?.split_whitespace().nth(1)?.to_string();
    let authorization = lines.find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.eq_ignore_ascii_case("authorization")
            .then(|| value.trim().to_string())
    });

    Some(SeenRequest { path, authorization })
}

/// How the mock WebSocket server treats pings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingMode {
    /// Keep reading, so tungstenite answers every ping with a pong.
    Answer,
    /// Complete the handshake, then never read.
    Ignore,
}

/// Start a WebSocket server on an ephemeral port.
///
/// With `required_auth`, handshakes lacking that exact `Authorization`
/// header are rejected with 401.
pub async fn start_ws_server(mode: PingMode, required_auth: Option<&'static str>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let check = move |req: &Request,
                                  resp: Response|
                      -> Result<Response, ErrorResponse> {
                    let Some(expected) = required_auth else {
                        return Ok(resp);
                    };
                    let got = req
                        .headers()
                        .get("authorization")
                        .and_then(|v| v.to_str().ok());
                    if got == Some(expected) {
                        Ok(resp)
                    } else {
                        Err(http::Response::builder()
                            .status(401)
                            .body(None)
                            .unwrap())
                    }
                };

                let Ok(mut ws) = tokio_tungstenite::accept_hdr_async(socket, check).await else {
                    return;
                };

                match mode {
                    PingMode::Answer => {
                        while let Some(Ok(_)) = ws.next().await {}
                    }
                    PingMode::Ignore => {
                        tokio::time::sleep(Duration::from_secs(30)).await;
                        drop(ws);
                    }
                }
            });
        }
    });

    addr
}

/// An address nothing is listening on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Probe config pointing at the mock servers.
pub fn probe_config(http: SocketAddr, ws: SocketAddr, token: Option<&str>) -> ProbeConfig {
    ProbeConfig {
        backend_base: format!("http://{}", http),
        ws_url: format!("ws://{}/ws", ws),
        api_token: token.map(str::to_string),
        timeouts: TimeoutPolicy {
            http: Duration::from_secs(2),
            websocket_handshake: Duration::from_secs(2),
        },
    }
}
