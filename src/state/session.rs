//! Per-connection state (spec.md §4.5).
//!
//! A `Session` tracks everything about a single socket that isn't part
//! of the durable [`crate::state::Nickname`]/[`crate::state::Channel`]
//! registry: capability negotiation, in-flight SASL state, and the
//! outbound channel the network-facing write task drains.

use std::collections::HashSet;
use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use ircd_proto::caps::Capability;
use ircd_proto::Message;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// A process-unique session identifier, used to correlate a connection's
/// reader/writer tasks with its entry in [`crate::core::Irc`] and in log
/// lines (`uid` field, per the teacher's `gateway.rs` convention).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Allocate a new, random session id.
    pub fn new() -> Self {
        SessionId(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// In-progress SASL AUTHENTICATE exchange state (spec.md §4.7).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SaslState {
    /// No AUTHENTICATE exchange is in progress.
    #[default]
    Idle,
    /// `AUTHENTICATE PLAIN` was received; the continuation `+` was sent
    /// and the client's base64 response is awaited.
    AwaitingResponse,
    /// The exchange completed and this session logged in as the given
    /// account name (900/903 already sent).
    Authenticated {
        /// The authenticated account name (the SASL authcid).
        account: String,
    },
}

/// Whether this session has completed `NICK`+`USER` registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RegistrationState {
    /// Neither NICK nor USER has been accepted yet, or only one has.
    #[default]
    Registering,
    /// Both NICK and USER are set and the welcome burst was sent.
    Registered,
}

/// Per-connection state owned by [`crate::core::Irc`], one per socket.
#[derive(Debug)]
pub struct Session {
    /// This session's id.
    pub id: SessionId,
    /// The peer's remote address, for logging and WHOIS.
    pub remote_addr: SocketAddr,
    /// The resolved or placeholder hostname shown in prefixes/WHOIS.
    pub host: String,
    /// When the underlying socket was accepted.
    pub connected_at: DateTime<Utc>,
    /// Whether this session is a server-to-server link rather than a
    /// regular client (spec.md §4.2/§6.2); link sessions skip the
    /// client welcome burst and receive the raw `process` mirror.
    pub is_link: bool,
    /// The registered nickname, once NICK has been accepted. `None`
    /// before registration or after the nickname's owning `Nickname`
    /// record has been dropped (never, while this session lives).
    pub nick: Option<String>,
    /// The USER command's ident (username) field.
    pub user: Option<String>,
    /// The USER command's realname field.
    pub realname: Option<String>,
    /// Registration progress.
    pub registration: RegistrationState,
    /// Capabilities this session has REQ'd and received ACK for.
    pub capabilities: HashSet<Capability>,
    /// In-progress SASL exchange state.
    pub sasl: SaslState,
    /// Whether `CAP LS`/`CAP REQ` is in progress, deferring registration
    /// completion until `CAP END` (spec.md §4.7).
    pub cap_negotiating: bool,
    /// Number of PINGs sent without a matching PONG since the last
    /// successful PONG (spec.md §5's idle-timeout accounting).
    pub ping_count: u32,
    /// The outbound queue this session's write task drains. `None`
    /// after the session has been dropped from the registry but its
    /// entry hasn't been garbage collected yet.
    outbox: UnboundedSender<Message>,
}

impl Session {
    /// Create a new session wired to the given outbound queue.
    pub fn new(remote_addr: SocketAddr, host: impl Into<String>, outbox: UnboundedSender<Message>) -> Self {
        Session {
            id: SessionId::new(),
            remote_addr,
            host: host.into(),
            connected_at: Utc::now(),
            is_link: false,
            nick: None,
            user: None,
            realname: None,
            registration: RegistrationState::Registering,
            capabilities: HashSet::new(),
            sasl: SaslState::Idle,
            cap_negotiating: false,
            ping_count: 0,
            outbox,
        }
    }

    /// Whether this session has completed registration.
    pub fn is_registered(&self) -> bool {
        self.registration == RegistrationState::Registered
    }

    /// NICK and USER are both present and CAP negotiation (if any) has
    /// ended: registration may complete.
    pub fn ready_to_register(&self) -> bool {
        self.nick.is_some() && self.user.is_some() && !self.cap_negotiating
    }

    /// Mark registration complete.
    pub fn complete_registration(&mut self) {
        self.registration = RegistrationState::Registered;
    }

    /// The client's current identity, `nick!user@host`, or `*` for any
    /// field not yet set (mirrors `original_source`'s `Client.identity`).
    pub fn identity(&self) -> String {
        format!(
            "{}!{}@{}",
            self.nick.as_deref().unwrap_or("*"),
            self.user.as_deref().unwrap_or("*"),
            self.host
        )
    }

    /// Enqueue a message for delivery to this session's socket. Silently
    /// drops the message if the write task has already shut down — the
    /// session itself is about to be torn down by the same disconnect.
    pub fn send(&self, message: Message) {
        let _ = self.outbox.send(message);
    }

    /// Whether `cap` has been negotiated for this session.
    pub fn has_capability(&self, cap: Capability) -> bool {
        self.capabilities.contains(&cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_session() -> (Session, tokio::sync::mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let session = Session::new("127.0.0.1:12345".parse().unwrap(), "localhost", tx);
        (session, rx)
    }

    #[test]
    fn identity_uses_placeholders_before_registration() {
        let (session, _rx) = test_session();
        assert_eq!(session.identity(), "*!*@localhost");
    }

    #[test]
    fn ready_to_register_requires_nick_and_user() {
        let (mut session, _rx) = test_session();
        assert!(!session.ready_to_register());
        session.nick = Some("alice".to_owned());
        assert!(!session.ready_to_register());
        session.user = Some("alice".to_owned());
        assert!(session.ready_to_register());
    }

    #[test]
    fn cap_negotiating_blocks_ready_to_register() {
        let (mut session, _rx) = test_session();
        session.nick = Some("alice".to_owned());
        session.user = Some("alice".to_owned());
        session.cap_negotiating = true;
        assert!(!session.ready_to_register());
    }

    #[tokio::test]
    async fn send_delivers_to_outbox() {
        let (session, mut rx) = test_session();
        session.send(Message::new("PING", vec!["x".to_owned()]));
        let received = rx.recv().await.unwrap();
        assert_eq!(received.command, "PING");
    }
}
