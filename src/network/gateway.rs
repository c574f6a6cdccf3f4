//! TCP/WebSocket accept loops (spec.md §6.2's external interfaces).
//!
//! Grounded in the teacher's `Gateway::bind`/`Gateway::run` (spec.md
//! §9 keeps its bind-then-loop shape, dropping its rate limiter and
//! proxy-protocol handling as out of scope here).

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::core::CoreEvent;
use crate::network::{connection, websocket};

/// Bind the client listener and accept client connections forever,
/// handing each accepted socket to [`connection::handle`].
pub async fn run_client_listener(addr: SocketAddr, host: String, events_tx: mpsc::UnboundedSender<CoreEvent>) -> std::io::Result<()> {
    run_listener(addr, host, false, events_tx).await
}

/// Bind the link listener and accept peer connections forever. Behaves
/// identically to the client listener except accepted sessions are
/// flagged `is_link` (spec.md §6.2): only `SERVER` registration is
/// meaningful from this listener, enforced by `handlers::dispatch`.
pub async fn run_link_listener(addr: SocketAddr, host: String, events_tx: mpsc::UnboundedSender<CoreEvent>) -> std::io::Result<()> {
    run_listener(addr, host, true, events_tx).await
}

async fn run_listener(addr: SocketAddr, host: String, is_link: bool, events_tx: mpsc::UnboundedSender<CoreEvent>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, is_link, "listening");
    loop {
        match listener.accept().await {
            Ok((stream, remote_addr)) => {
                let host = host.clone();
                let events_tx = events_tx.clone();
                tokio::spawn(async move {
                    connection::handle(stream, remote_addr, host, is_link, events_tx).await;
                });
            }
            Err(e) => error!(error = %e, "failed to accept connection"),
        }
    }
}

/// Bind and run the optional WebSocket bridge listener.
pub async fn run_websocket_listener(addr: SocketAddr, host: String, events_tx: mpsc::UnboundedSender<CoreEvent>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening for websocket connections");
    loop {
        match listener.accept().await {
            Ok((stream, remote_addr)) => {
                let host = host.clone();
                let events_tx = events_tx.clone();
                tokio::spawn(async move {
                    websocket::handle(stream, remote_addr, host, events_tx).await;
                });
            }
            Err(e) => error!(error = %e, "failed to accept websocket connection"),
        }
    }
}

/// Connect out to a single configured peer (spec.md §6.2) and run the
/// link side of the connection, announcing ourselves with `SERVER`
/// before handing the socket to the ordinary connection loop.
pub async fn connect_peer(addr: SocketAddr, host: String, server_name: String, events_tx: mpsc::UnboundedSender<CoreEvent>) -> std::io::Result<()> {
    let stream = TcpStream::connect(addr).await?;
    info!(%addr, "connected to peer");
    connection::handle_outbound_link(stream, addr, host, server_name, events_tx).await;
    Ok(())
}
