//! Per-connection reader/writer tasks (spec.md §5).
//!
//! A connection is exactly two tasks plus a one-shot timer, none of
//! which ever touch [`crate::core::Irc`]'s maps directly — they only
//! enqueue onto the shared inbound queue, the one component boundary
//! spec.md §5 names. Grounded in the teacher's per-connection task split
//! and `tokio::select!` idiom (`network/connection.rs`,
//! `network/connection/event_loop.rs`), narrowed from its flood-control/
//! bouncer-replay machinery to the two suspension points spec.md §5
//! actually calls for: a network read, and a write-or-idle-timeout.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use ircd_proto::Message;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;

use crate::core::CoreEvent;
use crate::handlers;
use crate::network::codec::LineCodec;
use crate::state::{Session, SessionId};

/// How long the writer waits for outbound traffic before emitting a
/// keepalive PING (spec.md §4.9/§5).
pub const PING_INTERVAL: Duration = Duration::from_secs(60);

/// How long a freshly-accepted connection has to reach REGISTERED
/// before it is dropped (spec.md §4.9).
pub const IDENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Accept a freshly-connected socket: register a [`Session`] for it,
/// then run its reader and writer tasks and its ident-timeout watchdog
/// until the connection closes.
pub async fn handle(stream: TcpStream, remote_addr: SocketAddr, host: String, is_link: bool, events_tx: mpsc::UnboundedSender<CoreEvent>) {
    run(stream, remote_addr, host, is_link, None, events_tx).await;
}

/// Run the link side of a connection we initiated ourselves (spec.md
/// §6.2's optional outbound peer): send our own `SERVER` registration
/// as the first outbound line, then proceed exactly as an accepted
/// link connection would.
pub async fn handle_outbound_link(stream: TcpStream, remote_addr: SocketAddr, host: String, server_name: String, events_tx: mpsc::UnboundedSender<CoreEvent>) {
    let announce = Message::new("SERVER", vec![server_name, "1".to_owned(), "0".to_owned(), "ircd peer link".to_owned()]);
    run(stream, remote_addr, host, true, Some(announce), events_tx).await;
}

async fn run(stream: TcpStream, remote_addr: SocketAddr, host: String, is_link: bool, preamble: Option<Message>, events_tx: mpsc::UnboundedSender<CoreEvent>) {
    let framed = Framed::new(stream, LineCodec);
    let (sink, stream) = framed.split();

    let (outbox_tx, outbox_rx) = mpsc::unbounded_channel::<Message>();
    if let Some(msg) = preamble {
        let _ = outbox_tx.send(msg);
    }
    let mut session = Session::new(remote_addr, host.clone(), outbox_tx);
    session.is_link = is_link;
    let session_id = session.id;

    if events_tx.send(CoreEvent::Register(session)).is_err() {
        return;
    }
    tracing::info!(session = %session_id, %remote_addr, is_link, "connection accepted");

    let ident_events = events_tx.clone();
    let ident_watchdog = tokio::spawn(async move {
        tokio::time::sleep(IDENT_TIMEOUT).await;
        let _ = ident_events.send(CoreEvent::Message(session_id, Message::new(handlers::IDENT_TIMEOUT, vec![])));
    });

    let reader = tokio::spawn(read_loop(session_id, stream, events_tx.clone()));
    let writer = tokio::spawn(write_loop(session_id, sink, outbox_rx, events_tx));

    let _ = tokio::join!(reader, writer);
    ident_watchdog.abort();
    tracing::info!(session = %session_id, "connection closed");
}

/// Read lines off the socket, parse them, and enqueue them for the
/// processor. A line that fails to parse is skipped (spec.md §4.9's
/// "connection remains open"); a closed or errored socket enqueues a
/// synthetic QUIT so the processor tears the session down the same way
/// a client-sent QUIT would.
async fn read_loop<S>(session_id: SessionId, mut stream: S, events_tx: mpsc::UnboundedSender<CoreEvent>)
where
    S: futures_util::Stream<Item = std::io::Result<String>> + Unpin,
{
    loop {
        match stream.next().await {
            Some(Ok(line)) => match Message::parse(&line) {
                Ok(msg) => {
                    if events_tx.send(CoreEvent::Message(session_id, msg)).is_err() {
                        return;
                    }
                }
                Err(e) => tracing::debug!(session = %session_id, error = %e, "dropping unparseable line"),
            },
            Some(Err(e)) => {
                let _ = events_tx.send(CoreEvent::Message(session_id, Message::new("QUIT", vec![format!("read error: {e}")])));
                return;
            }
            None => {
                let _ = events_tx.send(CoreEvent::Message(session_id, Message::new("QUIT", vec!["connection closed".to_owned()])));
                return;
            }
        }
    }
}

/// Drain the outbound queue and write each message to the socket. On
/// `PING_INTERVAL` idle, ask the processor to run its ping/grace check
/// (spec.md §4.9) rather than composing the keepalive here, keeping
/// `ping_count` single-owned by [`crate::core::Irc`].
async fn write_loop<S>(session_id: SessionId, mut sink: S, mut outbox_rx: mpsc::UnboundedReceiver<Message>, events_tx: mpsc::UnboundedSender<CoreEvent>)
where
    S: futures_util::Sink<Message> + Unpin,
{
    loop {
        tokio::select! {
            sent = outbox_rx.recv() => {
                match sent {
                    Some(msg) => {
                        if sink.send(msg).await.is_err() {
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
