//! Metrics endpoint server.
//!
//! # Responsibilities
//! - Serve the Prometheus text exposition on the configured path
//! - Stop accepting and drain on shutdown
//!
//! # Design Decisions
//! - Rendering is injected, so the server never touches the global recorder
//! - The listener is bound by the caller; a bind failure is a startup error

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

/// Produces the current exposition text.
pub type Render = Arc<dyn Fn() -> String + Send + Sync>;

const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// HTTP server exposing the exporter's metrics.
pub struct MetricsServer {
    router: Router,
}

impl MetricsServer {
    /// Create a server that answers `GET {path}` with `render()`.
    pub fn new(render: Render, path: &str) -> Self {
        let router = Router::new()
            .route(path, get(metrics_handler))
            .with_state(render)
            .layer(TraceLayer::new_for_http());

        Self { router }
    }

    /// Serve until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Metrics server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("Metrics server stopped");
        Ok(())
    }
}

async fn metrics_handler(State(render): State<Render>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], render())
}
