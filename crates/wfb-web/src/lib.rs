//! Status web server: axum HTTP for the pairing page.
//!
//! - `GET /`: static pairing/status page
//! - `GET /api/status`: connectivity, pairing QR, targets, Telegram flag
//! - `GET /ping`: liveness probe

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::response::{Html, Json};
use axum::routing::get;
use axum::Router;
use tracing::info;

use wfb_core::status::{StatusSnapshot, StatusSource};

const INDEX_HTML: &str = include_str!("../static/index.html");

pub fn router(status: StatusSource) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/status", get(api_status))
        .route("/ping", get(ping))
        .with_state(status)
}

/// Serve the status page until the listener fails.
pub async fn start(status: StatusSource, bind: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .context(format!("Failed to bind to {}", bind))?;

    info!("🌐 status page listening on http://{}", bind);

    axum::serve(listener, router(status))
        .await
        .context("Web server error")?;

    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn api_status(State(status): State<StatusSource>) -> Json<StatusSnapshot> {
    Json(status.snapshot())
}

async fn ping() -> &'static str {
    "pong"
}
