use crate::metrics::OpenIssuesGauge;
use anyhow::{Context, Result};
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use prometheus::TEXT_FORMAT;
use std::net::SocketAddr;
use tokio::net::TcpListener;

pub const METRICS_PATH: &str = "/metrics";

pub fn router(gauge: OpenIssuesGauge) -> Router {
    Router::new()
        .route(METRICS_PATH, get(metrics_handler))
        .with_state(gauge)
}

async fn metrics_handler(State(gauge): State<OpenIssuesGauge>) -> Response {
    match gauge.encode() {
        Ok(body) => ([(header::CONTENT_TYPE, TEXT_FORMAT)], body).into_response(),
        Err(err) => {
            tracing::error!("{err:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}

pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to listen on {addr}"))
}

/// Serves the metrics endpoint until the listener fails.
pub async fn serve(listener: TcpListener, gauge: OpenIssuesGauge) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Metrics server listening on http://{addr}{METRICS_PATH}");
    }
    axum::serve(listener, router(gauge))
        .await
        .context("Metrics server failed")
}
