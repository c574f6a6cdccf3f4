//! Optional read-only JSON status surface (spec.md §6.4). Grounded in the
//! teacher's `http.rs` (`Router::new().route(...)` + `axum::serve`), but
//! serving this server's own read-only state instead of Prometheus
//! metrics: the processor task refreshes a [`StatusSnapshot`] behind a
//! `tokio::sync::RwLock` after every event, and this server only ever
//! reads that snapshot, never `Irc` itself (spec.md §5's single-consumer
//! rule stays intact).

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::sync::RwLock;

use crate::core::{ChannelStatus, NicknameStatus, StatusSnapshot};

type SharedStatus = Arc<RwLock<StatusSnapshot>>;

/// Bind and serve the status endpoints until the process exits.
pub async fn run(addr: SocketAddr, status: SharedStatus) -> std::io::Result<()> {
    let app = Router::new()
        .route("/status", get(status_handler))
        .route("/channels", get(channels_handler))
        .route("/nicknames", get(nicknames_handler))
        .with_state(status);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "http status surface listening");
    axum::serve(listener, app).await
}

async fn status_handler(State(status): State<SharedStatus>) -> Json<StatusSnapshot> {
    Json(status.read().await.clone())
}

async fn channels_handler(State(status): State<SharedStatus>) -> Json<Vec<ChannelStatus>> {
    Json(status.read().await.channels.clone())
}

async fn nicknames_handler(State(status): State<SharedStatus>) -> Json<Vec<NicknameStatus>> {
    Json(status.read().await.nicknames.clone())
}
