//! Optional WebSocket bridge (spec.md §6.2): each WebSocket text message
//! is one IRC line in, one IRC line out, with no extra framing. Grounded
//! in the teacher's use of `tokio-tungstenite` for its own bridge
//! listener, reusing this server's ordinary [`read_loop`][super::connection]/
//! [`write_loop`][super::connection] shape rather than a second codec.

use std::net::SocketAddr;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use ircd_proto::Message;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;

use crate::core::CoreEvent;
use crate::handlers;
use crate::network::connection::{IDENT_TIMEOUT, PING_INTERVAL};
use crate::state::{Session, SessionId};

/// Accept a WebSocket connection the same way [`super::connection::handle`]
/// accepts a raw TCP one, adapting tungstenite's `Text`/`Close` frames to
/// and from plain IRC lines.
pub async fn handle(stream: TcpStream, remote_addr: SocketAddr, host: String, events_tx: mpsc::UnboundedSender<CoreEvent>) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::warn!(%remote_addr, error = %e, "WebSocket handshake failed");
            return;
        }
    };
    let (sink, stream) = ws.split();

    let (outbox_tx, outbox_rx) = mpsc::unbounded_channel::<Message>();
    let mut session = Session::new(remote_addr, host.clone(), outbox_tx);
    session.is_link = false;
    let session_id = session.id;

    if events_tx.send(CoreEvent::Register(session)).is_err() {
        return;
    }
    tracing::info!(session = %session_id, %remote_addr, "websocket connection accepted");

    let ident_events = events_tx.clone();
    let ident_watchdog = tokio::spawn(async move {
        tokio::time::sleep(IDENT_TIMEOUT).await;
        let _ = ident_events.send(CoreEvent::Message(session_id, Message::new(handlers::IDENT_TIMEOUT, vec![])));
    });

    let reader = tokio::spawn(read_loop(session_id, stream, events_tx.clone()));
    let writer = tokio::spawn(write_loop(session_id, sink, outbox_rx, events_tx));

    let _ = tokio::join!(reader, writer);
    ident_watchdog.abort();
    tracing::info!(session = %session_id, "websocket connection closed");
}

async fn read_loop<S>(session_id: SessionId, mut stream: S, events_tx: mpsc::UnboundedSender<CoreEvent>)
where
    S: Stream<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    loop {
        match stream.next().await {
            Some(Ok(tungstenite::Message::Text(line))) => match Message::parse(&line) {
                Ok(msg) => {
                    if events_tx.send(CoreEvent::Message(session_id, msg)).is_err() {
                        return;
                    }
                }
                Err(e) => tracing::debug!(session = %session_id, error = %e, "dropping unparseable line"),
            },
            Some(Ok(tungstenite::Message::Close(_))) | None => {
                let _ = events_tx.send(CoreEvent::Message(session_id, Message::new("QUIT", vec!["connection closed".to_owned()])));
                return;
            }
            Some(Ok(_)) => {} // ping/pong/binary frames carry no IRC content
            Some(Err(e)) => {
                let _ = events_tx.send(CoreEvent::Message(session_id, Message::new("QUIT", vec![format!("read error: {e}")])));
                return;
            }
        }
    }
}

async fn write_loop<S>(session_id: SessionId, mut sink: S, mut outbox_rx: mpsc::UnboundedReceiver<Message>, events_tx: mpsc::UnboundedSender<CoreEvent>)
where
    S: Sink<tungstenite::Message> + Unpin,
{
    loop {
        tokio::select! {
            sent = outbox_rx.recv() => {
                match sent {
                    Some(msg) => {
                        let text = msg.to_string();
                        if sink.send(tungstenite::Message::Text(text)).await.is_err() {
                            return;
                        }
                    }
                    None => return,
                }
            }
            _ = tokio::time::sleep(PING_INTERVAL) => {
                if events_tx.send(CoreEvent::Message(session_id, Message::new(handlers::PING_CHECK, vec![]))).is_err() {
                    return;
                }
            }
        }
    }
}
