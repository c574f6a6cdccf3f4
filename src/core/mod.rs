//! The authoritative server registry (spec.md §4.8).
//!
//! `Irc` owns every client, nickname, channel, and link. It is driven
//! exclusively by the single central processor task (spec.md §5) — no
//! other task touches these maps. Every public method here mirrors one
//! operation named in spec.md §4.8, grounded method-for-method on
//! `original_source/ircd/irc.py`'s `IRC` class.

mod links;
mod status;

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use ircd_proto::caps::Capability;
use ircd_proto::prefix::Prefix;
use ircd_proto::sasl;
use ircd_proto::{response, Message, Tag};
use uuid::Uuid;

use crate::error::{IrcError, IrcResult};
use crate::handlers;
use crate::state::channel::{JoinOutcome, ModeError};
use crate::state::session::SaslState;
use crate::state::{Channel, Nickname, Session, SessionId};

pub use status::{ChannelStatus, NicknameStatus, StatusSnapshot};

pub use links::Links;

/// Channel names must begin with one of these (spec.md §6.1).
const CHAN_START_CHARS: &str = "&#!+";

/// Consecutive server PINGs tolerated without an intervening PONG before
/// the session is dropped (spec.md §4.9's `PING_GRACE`).
const PING_GRACE: u32 = 5;

/// Everything the network layer needs to hand to the single processor
/// task (spec.md §5): either a freshly-accepted session to register, or
/// an inbound message (real or an internal timeout sentinel) to dispatch.
/// This is the one inbound queue spec.md §5 names — multi-producer
/// (every connection's reader and writer tasks), single-consumer
/// (`run_processor`).
pub enum CoreEvent {
    /// A newly-accepted connection, to be inserted into the registry.
    Register(Session),
    /// A message read off `SessionId`'s socket, or an internal timeout
    /// sentinel (see [`handlers::PING_CHECK`]/[`handlers::IDENT_TIMEOUT`]).
    Message(SessionId, Message),
}

/// The single central processor task (spec.md §5): drains `events` and
/// is the only task that ever touches `irc`'s maps. `status`, if given,
/// is refreshed after every event for [`crate::http`]'s read-only
/// surface (spec.md §6.4) to read without ever reaching into `irc` itself.
pub async fn run_processor(
    mut irc: Irc,
    mut events: tokio::sync::mpsc::UnboundedReceiver<CoreEvent>,
    status: Option<std::sync::Arc<tokio::sync::RwLock<StatusSnapshot>>>,
) {
    while let Some(event) = events.recv().await {
        match event {
            CoreEvent::Register(session) => {
                let id = irc.insert_session(session);
                tracing::debug!(session = %id, "session registered");
            }
            CoreEvent::Message(session_id, msg) => irc.process(session_id, msg),
        }
        if let Some(status) = &status {
            *status.write().await = irc.snapshot();
        }
    }
    tracing::info!("processor task exiting: inbound queue closed");
}

/// `RPL_ISUPPORT` tokens this server advertises, in order
/// (`original_source/ircd/irc.py`'s `ISUPPORT` dict).
const ISUPPORT: &[(&str, &str)] = &[
    ("AWAYLEN", ""),
    ("CASEMAPPING", "ascii"),
    ("CHANLIMIT", ""),
    ("CHANTYPES", "#"),
];

/// An account registered via SASL PLAIN's "register on first use" rule.
struct KnownIdentity {
    authcid: String,
    password: String,
}

/// The server's authoritative state (spec.md §3, §8).
pub struct Irc {
    host: String,
    server_name: String,
    server_version: String,
    created: DateTime<Utc>,
    motd: Option<String>,
    sessions: HashMap<SessionId, Session>,
    nicknames: HashMap<String, Nickname>,
    nick_session: HashMap<String, SessionId>,
    channels: HashMap<String, Channel>,
    links: Links,
    known_identities: HashMap<String, KnownIdentity>,
    operators: HashSet<String>,
}

impl Irc {
    /// Create an empty registry.
    pub fn new(host: impl Into<String>, server_name: impl Into<String>, server_version: impl Into<String>, motd: Option<String>) -> Self {
        Irc {
            host: host.into(),
            server_name: server_name.into(),
            server_version: server_version.into(),
            created: Utc::now(),
            motd,
            sessions: HashMap::new(),
            nicknames: HashMap::new(),
            nick_session: HashMap::new(),
            channels: HashMap::new(),
            links: Links::default(),
            known_identities: HashMap::new(),
            operators: HashSet::new(),
        }
    }

    /// The server host string used as the prefix for server replies.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Register a freshly-accepted connection and return its id.
    pub fn insert_session(&mut self, session: Session) -> SessionId {
        let id = session.id;
        self.sessions.insert(id, session);
        id
    }

    /// A session by id, for the network layer to look up its outbox.
    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    /// A session by id, mutably — used by handlers for registration-state
    /// fields (`nick`, `user`, capabilities, SASL progress) that belong to
    /// the connection rather than to durable nickname/channel state.
    pub fn session_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(&id)
    }

    // ---------------------------------------------------------------- queries

    /// Every capability this server supports, for `CAP LS`.
    pub fn capabilities(&self) -> &'static [Capability] {
        &ircd_proto::caps::ALL
    }

    /// Whether `name` is a registered nickname.
    pub fn has_nickname(&self, name: &str) -> bool {
        self.nicknames.contains_key(name)
    }

    /// A nickname record by name (read-only query, spec.md §6.4).
    pub fn get_nickname(&self, name: &str) -> Option<&Nickname> {
        self.nicknames.get(name)
    }

    /// Every registered nickname (read-only query, spec.md §6.4).
    pub fn nicknames(&self) -> impl Iterator<Item = &Nickname> {
        self.nicknames.values()
    }

    /// Whether `name` is a live channel.
    pub fn has_channel(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    /// A channel by name (read-only query, spec.md §6.4).
    pub fn get_channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    /// Every live channel (read-only query, spec.md §6.4).
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    /// Channels visible to `requester_nick`: secret channels are omitted
    /// unless the requester is a member; `names`, if given, further
    /// restricts the result to that set.
    pub fn list_channels(&self, requester_nick: &str, names: Option<&[String]>) -> Vec<&Channel> {
        self.channels
            .values()
            .filter(|c| !c.is_secret() || c.is_member(requester_nick))
            .filter(|c| names.map(|ns| ns.iter().any(|n| n == &c.name)).unwrap_or(true))
            .collect()
    }

    fn lookup_session(&self, nick: &str) -> Option<SessionId> {
        self.nick_session.get(nick).copied()
    }

    /// The identity prefix (`nick!user@host`) for the session's current
    /// nickname. Used as the `:source` of every message the session
    /// originates.
    fn identity_prefix(&self, session_id: SessionId) -> IrcResult<Prefix> {
        let session = self.require_session(session_id)?;
        let nick = session.nick.as_deref().unwrap_or("*");
        let user = session.user.as_deref().unwrap_or("*");
        Ok(Prefix::new(nick, user, session.host.clone()))
    }

    fn require_session(&self, session_id: SessionId) -> IrcResult<&Session> {
        self.sessions
            .get(&session_id)
            .ok_or_else(|| IrcError::Internal(anyhow::anyhow!("unknown session {session_id}")))
    }

    fn require_nick(&self, session_id: SessionId) -> IrcResult<String> {
        self.require_session(session_id)?
            .nick
            .clone()
            .ok_or_else(|| IrcError::Internal(anyhow::anyhow!("session {session_id} has no nickname")))
    }

    fn send_to(&self, recipient_nick: &str, msg: Message) {
        if let Some(id) = self.lookup_session(recipient_nick) {
            self.deliver(id, msg);
        }
    }

    /// Enqueue `msg` to `session_id`, decorating it with `server-time`
    /// and `message-ids` tags if that session negotiated them
    /// (spec.md §4.1, §6.1). Tag content is per-recipient, so broadcast
    /// call sites clone the base message once per member.
    fn deliver(&self, session_id: SessionId, mut msg: Message) {
        let Some(session) = self.sessions.get(&session_id) else { return };
        if session.has_capability(Capability::ServerTime) {
            msg = msg.with_tag(Tag::new("time", server_time_now()));
        }
        if session.has_capability(Capability::MessageIds) {
            msg = msg.with_tag(Tag::new("msgid", Uuid::new_v4().simple().to_string()));
        }
        session.send(msg);
    }

    // ---------------------------------------------------------------- links

    /// Register `session_id` as a peer link (spec.md §6.2's link listener).
    pub fn add_link(&mut self, session_id: SessionId) {
        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.is_link = true;
        }
        self.links.add(session_id);
    }

    /// Dispatch `msg` (already read off `session_id`'s inbound queue) to
    /// the command handler, then mirror it to every linked peer other
    /// than the originator (spec.md §4.8's peer-forwarding note).
    ///
    /// Intercepts the network layer's internal timeout sentinels
    /// (spec.md §4.9) before they ever reach the command table: neither
    /// one is forwarded to links or counted as nickname activity.
    pub fn process(&mut self, session_id: SessionId, msg: Message) {
        match msg.command.as_str() {
            handlers::PING_CHECK => return self.check_ping(session_id),
            handlers::IDENT_TIMEOUT => return self.check_ident_timeout(session_id),
            _ => {}
        }

        if let Err(e) = handlers::dispatch(self, session_id, &msg) {
            match e {
                IrcError::ProtocolError(reply) => self.deliver(session_id, reply),
                IrcError::SessionError(reason) => self.drop_client(session_id, Some(&reason)),
                IrcError::Internal(err) => tracing::error!(error = %err, "handler failed"),
            }
        }

        if let Some(nick) = self.sessions.get(&session_id).and_then(|s| s.nick.clone()) {
            if let Some(nickname) = self.nicknames.get_mut(&nick) {
                nickname.seen();
            }
        }

        for id in self.links.others(session_id).collect::<Vec<_>>() {
            self.deliver(id, msg.clone());
        }
    }

    // ---------------------------------------------------------------- SASL

    /// Verify (or, on first use, register) a SASL PLAIN identity against
    /// the nickname the authenticating client currently holds
    /// (`original_source/ircd/irc.py`'s `authenticate`).
    pub fn authenticate(&mut self, current_nick: &str, authcid: &str, password: &str) -> bool {
        match self.known_identities.get(current_nick) {
            None => {
                self.known_identities.insert(
                    current_nick.to_owned(),
                    KnownIdentity {
                        authcid: authcid.to_owned(),
                        password: password.to_owned(),
                    },
                );
                true
            }
            Some(owner) => owner.authcid == authcid && owner.password == password,
        }
    }

    // ---------------------------------------------------------------- registration

    /// Change (or first-set) the nickname for `session_id`, echoing
    /// `NICK` to the client and to every channel the old nickname was in.
    pub fn set_nick(&mut self, session_id: SessionId, new_nickname: &str) -> IrcResult<()> {
        if self.has_nickname(new_nickname) {
            let me = self.sessions.get(&session_id).and_then(|s| s.nick.clone()).unwrap_or_else(|| "*".to_owned());
            return Err(IrcError::protocol(response::error_nick_in_use(&self.host, &me, new_nickname)));
        }

        let old = self.sessions.get(&session_id).and_then(|s| s.nick.clone());
        let had_identity = self.sessions.get(&session_id).map(|s| s.user.is_some()).unwrap_or(false);
        let user = self.sessions.get(&session_id).and_then(|s| s.user.clone()).unwrap_or_default();
        let host = self.sessions.get(&session_id).map(|s| s.host.clone()).unwrap_or_default();

        let old_prefix = match &old {
            Some(old_nick) => Prefix::new(old_nick.clone(), user, host),
            None => Prefix::new(new_nickname, user, host),
        };
        let msg = response::nick(old_prefix, new_nickname);

        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.nick = Some(new_nickname.to_owned());
        }

        let nickname = match &old {
            Some(old_nick) => {
                let mut n = self.nicknames.remove(old_nick).unwrap_or_else(|| Nickname::new(new_nickname));
                n.rename(new_nickname);
                n
            }
            None => Nickname::new(new_nickname),
        };
        let channel_names: Vec<String> = nickname.channels.iter().cloned().collect();

        if let Some(old_nick) = &old {
            self.nick_session.remove(old_nick);
        }
        self.nick_session.insert(new_nickname.to_owned(), session_id);
        self.nicknames.insert(new_nickname.to_owned(), nickname);

        if had_identity {
            self.deliver(session_id, msg.clone());
            for channel in channel_names {
                self.broadcast_to_channel(new_nickname, &channel, msg.clone(), true, &[]);
            }
        }

        Ok(())
    }

    /// Record the `USER` command's fields. Registration only completes
    /// once NICK and USER are both set and any `CAP` negotiation in
    /// progress has ended with `CAP END` (spec.md §4.7's interleaving
    /// note) — see [`Self::try_complete_registration`].
    pub fn set_ident(&mut self, session_id: SessionId, user: &str, realname: &str) -> IrcResult<()> {
        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.user = Some(user.to_owned());
            session.realname = Some(realname.to_owned());
        }
        self.try_complete_registration(session_id)
    }

    /// Begin (or extend) `CAP` negotiation, deferring registration
    /// completion until a matching `CAP END`. A no-op once the session
    /// is already fully registered.
    pub fn begin_cap_negotiation(&mut self, session_id: SessionId) {
        if let Some(session) = self.sessions.get_mut(&session_id) {
            if !session.is_registered() {
                session.cap_negotiating = true;
            }
        }
    }

    /// `CAP END`: registration proceeds if NICK and USER are already set.
    pub fn end_cap_negotiation(&mut self, session_id: SessionId) -> IrcResult<()> {
        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.cap_negotiating = false;
        }
        self.try_complete_registration(session_id)
    }

    /// An unrecognized `CAP` subcommand (410).
    pub fn reject_cap_subcommand(&mut self, session_id: SessionId, subcommand: &str) {
        let nick = self.sessions.get(&session_id).and_then(|s| s.nick.clone()).unwrap_or_else(|| "*".to_owned());
        self.deliver(session_id, response::error_invalid_cap_subcommand(&self.host, &nick, subcommand));
    }

    /// Complete registration once NICK, USER, and any CAP negotiation are
    /// all settled: send the welcome burst, LUSER block, current user
    /// mode, and MOTD. A no-op if already registered or not yet ready.
    fn try_complete_registration(&mut self, session_id: SessionId) -> IrcResult<()> {
        let Some(session) = self.sessions.get(&session_id) else { return Ok(()) };
        if session.is_registered() || !session.ready_to_register() {
            return Ok(());
        }
        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.complete_registration();
        }

        let nick = self.require_nick(session_id)?;
        let user = self.require_session(session_id)?.user.clone().unwrap_or_default();
        let host = self.require_session(session_id)?.host.clone();
        tracing::info!(nick = %nick, user = %user, host = %host, "client registered");

        let prefix = self.identity_prefix(session_id)?;
        self.deliver(session_id, response::nick(prefix, &nick));
        self.deliver(session_id, response::reply_welcome(&self.host, &nick, &nick, &user, &host));
        self.deliver(
            session_id,
            response::reply_yourhost(&self.host, &nick, &self.server_name, &self.server_version),
        );
        self.deliver(session_id, response::reply_created(&self.host, &nick, &self.created.to_rfc2822()));
        self.deliver(
            session_id,
            response::reply_myinfo(&self.host, &nick, &self.server_name, &self.server_version),
        );
        self.deliver(session_id, response::reply_isupport(&self.host, &nick, ISUPPORT));

        self.deliver(
            session_id,
            response::reply_luser_client(&self.host, self.nicknames.len(), self.links.len() + 1),
        );
        self.deliver(session_id, response::reply_luser_op(&self.host, self.operators.len()));
        self.deliver(session_id, response::reply_luser_chan(&self.host, self.channels.len()));
        self.deliver(
            session_id,
            response::reply_luser_me(&self.host, self.sessions.len(), self.links.len() + 1),
        );

        self.send_user_mode(session_id, &nick)?;
        self.send_motd(session_id);

        Ok(())
    }

    /// Send the MOTD (372/375/376), or 422 if none is configured.
    pub fn send_motd(&mut self, session_id: SessionId) {
        let Ok(nick) = self.require_nick(session_id) else { return };
        match &self.motd {
            Some(motd) => {
                let motd = motd.clone();
                self.deliver(session_id, response::reply_start_motd(&self.host, &nick));
                self.deliver(session_id, response::reply_motd(&self.host, &nick, &motd));
                self.deliver(session_id, response::reply_end_motd(&self.host, &nick));
            }
            None => self.deliver(session_id, response::reply_no_motd(&self.host, &nick)),
        }
    }

    /// Tear down a session: part every channel it was in (broadcasting a
    /// synthetic QUIT), unregister its nickname, and drop the session
    /// entry. Idempotent: a second call on an already-gone session is a
    /// no-op.
    pub fn drop_client(&mut self, session_id: SessionId, message: Option<&str>) {
        let Some(session) = self.sessions.get(&session_id) else { return };
        let Some(nick) = session.nick.clone() else {
            self.sessions.remove(&session_id);
            self.links.remove(session_id);
            return;
        };
        let identity = session.identity();

        tracing::info!(nick = %nick, reason = message.unwrap_or("none"), "client disconnected");

        // Broadcast the synthetic QUIT *before* removing membership, so
        // other members actually receive it (spec.md §4.9). This is a
        // deliberate divergence from `original_source/ircd/irc.py`'s
        // `drop_client`, whose own ordering parts the channel first —
        // which makes its own `send_to_channel` membership check reject
        // the broadcast, silently dropping the QUIT (see `DESIGN.md`).
        if let Some(nickname) = self.nicknames.get(&nick) {
            let channel_names: Vec<String> = nickname.channels.iter().cloned().collect();
            for channel_name in channel_names {
                let quit = response::quit(Prefix::from(identity.as_str()), message.unwrap_or(""));
                self.broadcast_to_channel(&nick, &channel_name, quit, true, &[]);
                if let Some(channel) = self.channels.get_mut(&channel_name) {
                    channel.part(&nick);
                    if channel.members.is_empty() {
                        self.channels.remove(&channel_name);
                    }
                }
            }
        }

        self.nick_session.remove(&nick);
        self.nicknames.remove(&nick);
        self.sessions.remove(&session_id);
        self.links.remove(session_id);
    }

    // ---------------------------------------------------------------- channels

    /// JOIN: create the channel if it doesn't exist (enforcing the
    /// channel-prefix check only in that case), then apply invite-only,
    /// ban, and key checks before adding the nickname to members.
    pub fn join_channel(&mut self, session_id: SessionId, name: &str, key: Option<&str>) -> IrcResult<()> {
        let nick = self.require_nick(session_id)?;
        let identity = self.require_session(session_id)?.identity();

        if !self.channels.contains_key(name) {
            if !name.starts_with(|c| CHAN_START_CHARS.contains(c)) {
                return Err(IrcError::protocol(response::error_no_such_channel(&self.host, &nick, name)));
            }
            self.channels.insert(name.to_owned(), Channel::new(name, &nick));
        }

        // These checks run even for a channel just created above; they're
        // no-ops there (a fresh channel has no invite-only flag and no
        // bans), matching `original_source/ircd/irc.py`'s `join_channel`
        // rather than special-casing creation.
        let channel = self.channels.get(name).expect("inserted above if absent");
        if !channel.can_join(&nick) {
            return Err(IrcError::protocol(response::error_invite_only_channel(&self.host, &nick, name)));
        }
        if channel.is_banned(&identity) {
            return Err(IrcError::protocol(response::error_banned_from_channel(&self.host, &nick, name)));
        }

        let channel = self.channels.get_mut(name).expect("checked above");
        if channel.join(&nick, key) == JoinOutcome::BadKey {
            self.deliver(session_id, response::error_bad_channel_key(&self.host, &nick, name));
            return Ok(());
        }
        if let Some(nickname) = self.nicknames.get_mut(&nick) {
            nickname.joined_channel(name);
        }

        let join_msg = response::join(Prefix::from(identity.as_str()), name);
        self.broadcast_to_channel(&nick, name, join_msg, false, &[]);
        self.send_topic(session_id, name)?;
        self.send_names(session_id, name);
        Ok(())
    }

    /// PART: broadcast (including to the parting nickname itself), then
    /// remove from members and destroy the channel if it's now empty.
    pub fn part_channel(&mut self, session_id: SessionId, name: &str, message: Option<&str>) -> IrcResult<()> {
        let nick = self.require_nick(session_id)?;
        if !self.channels.contains_key(name) {
            return Ok(());
        }
        let identity = self.require_session(session_id)?.identity();

        let part_msg = response::part(Prefix::from(identity.as_str()), name, message);
        self.send_to_channel(&nick, name, part_msg, false, &[])?;

        if let Some(channel) = self.channels.get_mut(name) {
            channel.part(&nick);
            if channel.members.is_empty() {
                self.channels.remove(name);
            }
        }
        if let Some(nickname) = self.nicknames.get_mut(&nick) {
            nickname.parted_channel(name);
        }
        Ok(())
    }

    /// The unified broadcast primitive (spec.md §4.8): send `msg` to
    /// every member of `channel_name`, enforcing that `sender_nick` is
    /// itself a member, optionally skipping the sender and gating on a
    /// set of required capabilities.
    fn send_to_channel(&mut self, sender_nick: &str, channel_name: &str, msg: Message, skip_self: bool, required_caps: &[Capability]) -> IrcResult<()> {
        let channel = self
            .channels
            .get(channel_name)
            .ok_or_else(|| IrcError::protocol(response::error_no_such_channel(&self.host, sender_nick, channel_name)))?;
        if !channel.is_member(sender_nick) {
            return Err(IrcError::protocol(response::error_not_in_channel(&self.host, sender_nick)));
        }
        self.broadcast_to_channel(sender_nick, channel_name, msg, skip_self, required_caps);
        Ok(())
    }

    /// Membership-unchecked broadcast core, shared by `send_to_channel`
    /// and call sites (join/part/quit/kick/topic) that already know the
    /// sender is (or was) a member.
    fn broadcast_to_channel(&mut self, sender_nick: &str, channel_name: &str, msg: Message, skip_self: bool, required_caps: &[Capability]) {
        let Some(channel) = self.channels.get(channel_name) else { return };
        let members = channel.members.clone();
        for member in members {
            if skip_self && member == sender_nick {
                continue;
            }
            if !required_caps.is_empty() {
                let has_all = self
                    .lookup_session(&member)
                    .and_then(|id| self.sessions.get(&id))
                    .map(|s| required_caps.iter().all(|c| s.has_capability(*c)))
                    .unwrap_or(false);
                if !has_all {
                    continue;
                }
            }
            self.send_to(&member, msg.clone());
        }
    }

    /// `CAP LS`/`CAP LIST`.
    pub fn send_capabilities(&mut self, session_id: SessionId) {
        let Ok(nick) = self.require_nick(session_id) else { return };
        let list = ircd_proto::caps::ls_list();
        self.deliver(session_id, response::reply_list_capabilities(&self.host, &nick, &list));
    }

    /// `CAP REQ`: ACK the recognized subset, NAK the rest.
    pub fn request_capabilities(&mut self, session_id: SessionId, requested: &str) {
        let Ok(nick) = self.require_nick(session_id) else { return };
        let (accepted, rejected) = ircd_proto::caps::request(requested);

        if !accepted.is_empty() {
            let list = accepted.iter().map(Capability::as_str).collect::<Vec<_>>().join(" ");
            self.deliver(session_id, response::reply_ack_capabilities(&self.host, &nick, &list));
            if let Some(session) = self.sessions.get_mut(&session_id) {
                session.capabilities.extend(accepted);
            }
        }
        if !rejected.is_empty() {
            let list = rejected.join(" ");
            self.deliver(session_id, response::reply_nak_capabilities(&self.host, &nick, &list));
        }
    }

    /// NAMES.
    pub fn send_names(&mut self, session_id: SessionId, channel_name: &str) {
        let Ok(nick) = self.require_nick(session_id) else { return };
        let Some(channel) = self.channels.get(channel_name) else { return };
        if (channel.is_private() || channel.is_secret()) && !channel.is_member(&nick) {
            return;
        }
        let mut members = channel.members.clone();
        members.sort();
        self.deliver(session_id, response::reply_names(&self.host, &nick, channel_name, &members));
        self.deliver(session_id, response::reply_endnames(&self.host, &nick, channel_name));
    }

    /// LIST.
    pub fn send_list(&mut self, session_id: SessionId, channel_names: Option<&[String]>) {
        let Ok(nick) = self.require_nick(session_id) else { return };
        self.deliver(session_id, response::reply_list_start(&self.host, &nick));
        let channels = self.list_channels(&nick, channel_names);
        for channel in channels {
            let topic_or_private = if channel.is_private() {
                "(private)".to_owned()
            } else {
                channel.topic.clone().unwrap_or_default()
            };
            self.deliver(
                session_id,
                response::reply_list(&self.host, &nick, &channel.name, channel.members.len(), &topic_or_private),
            );
        }
        self.deliver(session_id, response::reply_list_end(&self.host, &nick));
    }

    /// Send 331/332 to the requester only.
    pub fn send_topic(&mut self, session_id: SessionId, channel_name: &str) -> IrcResult<()> {
        let nick = self.require_nick(session_id)?;
        let channel = self
            .channels
            .get(channel_name)
            .ok_or_else(|| IrcError::protocol(response::error_no_such_channel(&self.host, &nick, channel_name)))?;
        match &channel.topic {
            Some(topic) => self.deliver(session_id, response::reply_topic(&self.host, &nick, channel_name, topic)),
            None => self.deliver(session_id, response::reply_notopic(&self.host, &nick, channel_name)),
        }
        Ok(())
    }

    /// TOPIC with a new value: set it (if permitted) and echo 332/333 to
    /// every member, including the setter.
    pub fn set_topic(&mut self, session_id: SessionId, channel_name: &str, topic: &str) -> IrcResult<()> {
        let nick = self.require_nick(session_id)?;
        let channel = self
            .channels
            .get(channel_name)
            .ok_or_else(|| IrcError::protocol(response::error_no_such_channel(&self.host, &nick, channel_name)))?;
        let permitted = channel.is_operator(&nick) || channel.is_topic_open();

        if permitted {
            let set_at = Utc::now().timestamp();
            if let Some(channel) = self.channels.get_mut(channel_name) {
                channel.set_topic(topic, &nick, set_at);
            }
        }

        let Some(channel) = self.channels.get(channel_name) else { return Ok(()) };
        let members = channel.members.clone();
        let topic_text = channel.topic.clone().unwrap_or_default();
        let setter = channel.topic_setter.clone().unwrap_or_default();
        let set_at = channel.topic_set_at.unwrap_or_default();
        for member in members {
            let Some(id) = self.lookup_session(&member) else { continue };
            self.deliver(id, response::reply_topic(&self.host, &member, channel_name, &topic_text));
            self.deliver(id, response::reply_topic_who_time(&self.host, &member, channel_name, &setter, set_at));
        }
        Ok(())
    }

    // ---------------------------------------------------------------- messaging

    /// PRIVMSG to a channel.
    pub fn send_private_message_to_channel(&mut self, session_id: SessionId, channel_name: &str, text: &str, client_tags: Vec<Tag>) -> IrcResult<()> {
        let nick = self.require_nick(session_id)?;
        if !self.has_channel(channel_name) {
            return Err(IrcError::protocol(response::error_no_such_channel(&self.host, &nick, channel_name)));
        }
        let prefix = self.identity_prefix(session_id)?;
        let msg = response::private_message(prefix, channel_name, text, client_tags);
        self.send_to_channel(&nick, channel_name, msg, true, &[])
    }

    /// PRIVMSG to a nickname; redirects to a 301 AWAY reply (sent with
    /// the *target's* identity as the prefix — `original_source`'s own
    /// behavior) if the target is away.
    pub fn send_private_message_to_client(&mut self, session_id: SessionId, target_nick: &str, text: &str, client_tags: Vec<Tag>) -> IrcResult<()> {
        let nick = self.require_nick(session_id)?;
        let Some(target_id) = self.lookup_session(target_nick) else {
            return Err(IrcError::protocol(response::error_no_such_nickname(&self.host, &nick, target_nick)));
        };
        let target_identity = self.require_session(target_id)?.identity();

        if let Some(away) = self.nicknames.get(target_nick).and_then(|n| n.away_message.clone()) {
            self.deliver(session_id, response::reply_away(&target_identity, &nick, target_nick, &away));
            return Ok(());
        }

        let prefix = self.identity_prefix(session_id)?;
        let msg = response::private_message(prefix, target_nick, text, client_tags);
        self.deliver(target_id, msg);
        Ok(())
    }

    /// NOTICE to a channel. No away-redirect (spec.md §4.6).
    pub fn send_notice_to_channel(&mut self, session_id: SessionId, channel_name: &str, text: &str, client_tags: Vec<Tag>) -> IrcResult<()> {
        let nick = self.require_nick(session_id)?;
        if !self.has_channel(channel_name) {
            return Err(IrcError::protocol(response::error_no_such_channel(&self.host, &nick, channel_name)));
        }
        let prefix = self.identity_prefix(session_id)?;
        let msg = response::notice(prefix, channel_name, text, client_tags);
        self.send_to_channel(&nick, channel_name, msg, true, &[])
    }

    /// NOTICE to a nickname. No away-redirect.
    pub fn send_notice_to_client(&mut self, session_id: SessionId, target_nick: &str, text: &str, client_tags: Vec<Tag>) -> IrcResult<()> {
        let nick = self.require_nick(session_id)?;
        let Some(target_id) = self.lookup_session(target_nick) else {
            return Err(IrcError::protocol(response::error_no_such_nickname(&self.host, &nick, target_nick)));
        };
        let prefix = self.identity_prefix(session_id)?;
        let msg = response::notice(prefix, target_nick, text, client_tags);
        self.deliver(target_id, msg);
        Ok(())
    }

    /// TAGMSG to a channel: delivered only to members with `message-tags`.
    pub fn send_tag_message_to_channel(&mut self, session_id: SessionId, channel_name: &str, client_tags: Vec<Tag>) -> IrcResult<()> {
        let nick = self.require_nick(session_id)?;
        if !self.has_channel(channel_name) {
            return Err(IrcError::protocol(response::error_no_such_channel(&self.host, &nick, channel_name)));
        }
        let prefix = self.identity_prefix(session_id)?;
        let msg = response::tag_message(prefix, channel_name, client_tags);
        self.send_to_channel(&nick, channel_name, msg, true, &[Capability::MessageTags])
    }

    /// TAGMSG to a nickname: delivered only if the recipient negotiated
    /// `message-tags`.
    pub fn send_tag_message_to_client(&mut self, session_id: SessionId, target_nick: &str, client_tags: Vec<Tag>) -> IrcResult<()> {
        let nick = self.require_nick(session_id)?;
        let Some(target_id) = self.lookup_session(target_nick) else {
            return Err(IrcError::protocol(response::error_no_such_nickname(&self.host, &nick, target_nick)));
        };
        let Some(target) = self.sessions.get(&target_id) else { return Ok(()) };
        if !target.has_capability(Capability::MessageTags) {
            return Ok(());
        }
        let prefix = self.identity_prefix(session_id)?;
        let msg = response::tag_message(prefix, target_nick, client_tags);
        self.deliver(target_id, msg);
        Ok(())
    }

    /// PING keepalive: emit a server PING to the client (spec.md §5).
    pub fn ping(&mut self, session_id: SessionId) {
        self.deliver(session_id, response::ping(&self.host));
    }

    /// Reply to a client-initiated PING with a matching PONG, echoing
    /// the client's token.
    pub fn reply_pong(&mut self, session_id: SessionId, token: &str) {
        self.deliver(session_id, response::pong(&self.host, token));
    }

    /// Clear the ping-timeout counter: a PONG arrived.
    pub fn clear_ping_count(&mut self, session_id: SessionId) {
        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.ping_count = 0;
        }
    }

    /// The writer task's `PING_INTERVAL` idle-timeout sentinel
    /// (spec.md §4.9): either this session has exhausted `PING_GRACE`
    /// unanswered PINGs and is dropped, or it gets one more.
    fn check_ping(&mut self, session_id: SessionId) {
        let Some(session) = self.sessions.get_mut(&session_id) else { return };
        if session.ping_count >= PING_GRACE {
            self.drop_client(session_id, Some("ping timeout"));
        } else {
            session.ping_count += 1;
            self.ping(session_id);
        }
    }

    /// The network layer's `IDENT_TIMEOUT` sentinel (spec.md §4.9): drop
    /// the session if it never reached REGISTERED in time. A no-op if
    /// registration already completed.
    fn check_ident_timeout(&mut self, session_id: SessionId) {
        if let Some(session) = self.sessions.get(&session_id) {
            if !session.is_registered() {
                self.drop_client(session_id, Some("ident timeout"));
            }
        }
    }

    // ---------------------------------------------------------------- mode

    /// Send the current channel mode string (324).
    pub fn send_channel_mode(&mut self, session_id: SessionId, channel_name: &str) -> IrcResult<()> {
        let nick = self.require_nick(session_id)?;
        let channel = self
            .channels
            .get(channel_name)
            .ok_or_else(|| IrcError::protocol(response::error_no_such_channel(&self.host, &nick, channel_name)))?;
        let params = channel.key.clone();
        self.deliver(
            session_id,
            response::reply_channel_mode_is(&self.host, &nick, channel_name, &channel.mode_string(), params.as_deref()),
        );
        Ok(())
    }

    /// MODE on a channel: requires channel-operator, applies the flags,
    /// and echoes the effective change to every member if anything
    /// actually changed.
    pub fn set_channel_mode(&mut self, session_id: SessionId, target: &str, flags: &str, param: Option<&str>) -> IrcResult<()> {
        let nick = self.require_nick(session_id)?;
        let channel = self
            .channels
            .get(target)
            .ok_or_else(|| IrcError::protocol(response::error_no_such_channel(&self.host, &nick, target)))?;
        if !channel.is_operator(&nick) {
            return Err(IrcError::protocol(response::error_channel_operator_needed(&self.host, &nick, target)));
        }

        let Some((op, rest)) = flags.chars().next().map(|op| (op, &flags[1..])) else {
            return Ok(());
        };

        let channel = self.channels.get_mut(target).expect("checked above");
        let result = match op {
            '+' => channel.set_mode(rest, param),
            '-' => channel.clear_mode(rest, param),
            _ => return Ok(()),
        };
        let modified = result.map_err(|ModeError| IrcError::protocol(response::error_needs_more_params(&self.host, &nick, "MODE")))?;

        if !modified.is_empty() {
            let prefix = self.identity_prefix(session_id)?;
            let msg = response::mode(prefix, target, &format!("{op}{modified}"), param);
            self.broadcast_to_channel(&nick, target, msg, false, &[]);
        }
        Ok(())
    }

    /// Send the current user mode string (221).
    pub fn send_user_mode(&mut self, session_id: SessionId, target_nick: &str) -> IrcResult<()> {
        let nick = self.require_nick(session_id)?;
        let target = self
            .nicknames
            .get(target_nick)
            .ok_or_else(|| IrcError::protocol(response::error_no_such_nickname(&self.host, &nick, target_nick)))?;
        self.deliver(session_id, response::reply_user_mode_is(&self.host, &nick, &target.mode_string()));
        Ok(())
    }

    /// MODE on a user: requires `target == self`; silently ignores
    /// attempts to touch `a` (away) or `o` (operator) via raw MODE.
    pub fn set_user_mode(&mut self, session_id: SessionId, target: &str, flags: &str) -> IrcResult<()> {
        let nick = self.require_nick(session_id)?;
        if nick != target {
            return Err(IrcError::protocol(response::error_users_dont_match(&self.host, &nick)));
        }

        let Some((op, rest)) = flags.chars().next().map(|op| (op, &flags[1..])) else {
            return Ok(());
        };
        if rest.contains('a') || rest.contains('o') {
            return Ok(());
        }

        let Some(nickname) = self.nicknames.get_mut(&nick) else { return Ok(()) };
        let modified = match op {
            '+' => nickname.set_mode(rest),
            '-' => nickname.clear_mode(rest),
            _ => return Ok(()),
        };

        if !modified.is_empty() {
            let prefix = self.identity_prefix(session_id)?;
            self.deliver(session_id, response::mode(prefix, target, &format!("{op}{modified}"), None));
        }
        Ok(())
    }

    /// Fail with 401 if `target` is not a currently registered nickname.
    /// Used by handlers that need to report an unknown target by name
    /// before doing anything else (spec.md §9's handler-layer checks).
    pub fn require_known_nickname(&self, session_id: SessionId, target: &str) -> IrcResult<()> {
        if self.has_nickname(target) {
            Ok(())
        } else {
            let nick = self.require_nick(session_id)?;
            Err(IrcError::protocol(response::error_no_such_nickname(&self.host, &nick, target)))
        }
    }

    /// Fail with 403 for a PRIVMSG/TAGMSG target that is neither a known
    /// channel nor a known nickname.
    pub fn no_such_target(&self, session_id: SessionId, target: &str) -> IrcResult<()> {
        let nick = self.require_nick(session_id)?;
        Err(IrcError::protocol(response::error_no_such_channel(&self.host, &nick, target)))
    }

    /// Fail with 403 if `channel_name` doesn't exist, or 482 if the
    /// caller isn't one of its operators (`original_source`'s
    /// `commands.py::invite`/`kick`, which run this check in the
    /// handler rather than in `Irc::invite`/`Irc::kick` themselves).
    pub fn require_channel_operator(&self, session_id: SessionId, channel_name: &str) -> IrcResult<()> {
        let nick = self.require_nick(session_id)?;
        let channel = self
            .channels
            .get(channel_name)
            .ok_or_else(|| IrcError::protocol(response::error_no_such_channel(&self.host, &nick, channel_name)))?;
        if !channel.is_operator(&nick) {
            return Err(IrcError::protocol(response::error_channel_operator_needed(&self.host, &nick, channel_name)));
        }
        Ok(())
    }

    /// AWAY: with a message, sets the away flag and stores it (306);
    /// without one, clears it (305).
    pub fn set_away(&mut self, session_id: SessionId, message: Option<&str>) -> IrcResult<()> {
        let nick = self.require_nick(session_id)?;
        if let Some(nickname) = self.nicknames.get_mut(&nick) {
            match message {
                Some(text) => nickname.set_away(text),
                None => nickname.clear_away(),
            }
        }
        match message {
            Some(_) => self.deliver(session_id, response::reply_nowaway(&self.host, &nick)),
            None => self.deliver(session_id, response::reply_unaway(&self.host, &nick)),
        }
        Ok(())
    }

    // ---------------------------------------------------------------- invite / kick

    /// INVITE: requires the inviter to be a channel operator (checked by
    /// the handler before calling this, per `original_source`'s
    /// `commands.py::invite`); records the invite and notifies both
    /// parties.
    pub fn invite(&mut self, session_id: SessionId, invitee_nick: &str, channel_name: &str) -> IrcResult<()> {
        let nick = self.require_nick(session_id)?;
        let channel = self
            .channels
            .get_mut(channel_name)
            .ok_or_else(|| IrcError::protocol(response::error_no_such_channel(&self.host, &nick, channel_name)))?;
        channel.invite(invitee_nick);

        self.deliver(session_id, response::reply_inviting(&self.host, &nick, channel_name, invitee_nick));

        if let Some(invitee_id) = self.lookup_session(invitee_nick) {
            let prefix = self.identity_prefix(session_id)?;
            self.deliver(invitee_id, response::invite(prefix, invitee_nick, channel_name));
        }
        Ok(())
    }

    /// KICK: requires channel-operator (checked by the handler), removes
    /// the target from members and invited, and notifies every remaining
    /// member including the kicked nickname itself (spec.md §4.6 — this
    /// server's deliberate divergence from `original_source`, which
    /// notifies only the kicked client; see `DESIGN.md`).
    pub fn kick(&mut self, session_id: SessionId, channel_name: &str, target_nick: &str, comment: Option<&str>) -> IrcResult<()> {
        let nick = self.require_nick(session_id)?;
        if !self.channels.contains_key(channel_name) {
            return Err(IrcError::protocol(response::error_no_such_channel(&self.host, &nick, channel_name)));
        }

        let prefix = self.identity_prefix(session_id)?;
        let msg = response::kick(prefix, channel_name, target_nick, comment);
        self.broadcast_to_channel(&nick, channel_name, msg, false, &[]);

        if let Some(channel) = self.channels.get_mut(channel_name) {
            channel.kick(target_nick);
            if channel.members.is_empty() {
                self.channels.remove(channel_name);
            }
        }
        if let Some(nickname) = self.nicknames.get_mut(target_nick) {
            nickname.parted_channel(channel_name);
        }
        Ok(())
    }

    // ---------------------------------------------------------------- SASL wiring

    /// The first `AUTHENTICATE` line of an exchange: it must name a
    /// supported mechanism (only `PLAIN`). Accepting it sends the `+`
    /// continuation and awaits the base64 response on the next line.
    pub fn begin_sasl(&mut self, session_id: SessionId, mechanism: &str) -> IrcResult<()> {
        let nick = self.require_nick(session_id)?;
        if mechanism.eq_ignore_ascii_case("PLAIN") {
            if let Some(session) = self.sessions.get_mut(&session_id) {
                session.sasl = crate::state::session::SaslState::AwaitingResponse;
            }
            self.deliver(session_id, response::sasl_continue(&self.host));
        } else {
            self.deliver(session_id, response::error_sasl_mechanism(&self.host, &nick));
        }
        Ok(())
    }

    /// Decode and verify an `AUTHENTICATE` PLAIN response, replying with
    /// the matching numeric sequence.
    pub fn handle_sasl_response(&mut self, session_id: SessionId, base64_payload: &str) {
        let Ok(nick) = self.require_nick(session_id) else { return };
        match sasl::decode_plain(base64_payload) {
            Ok(creds) => {
                if self.authenticate(&nick, &creds.authcid, &creds.password) {
                    if let Some(session) = self.sessions.get_mut(&session_id) {
                        session.sasl = crate::state::session::SaslState::Authenticated {
                            account: creds.authcid.clone(),
                        };
                    }
                    self.deliver(session_id, response::sasl_logged_in(&self.host, &nick));
                    self.deliver(session_id, response::sasl_success(&self.host, &nick));
                } else {
                    self.deliver(session_id, response::error_sasl_fail(&self.host, &nick));
                }
            }
            Err(_) => self.deliver(session_id, response::error_sasl_fail(&self.host, &nick)),
        }
    }

    // ---------------------------------------------------------------- WHOIS / ISON
    // Supplemented per SPEC_FULL.md §4.6/§4.8; not present in `original_source`.

    /// WHOIS: 311/312/317/319 then 318, or 401 if the nickname is unknown.
    pub fn whois(&mut self, session_id: SessionId, target_nick: &str) -> IrcResult<()> {
        let nick = self.require_nick(session_id)?;
        let target_id = self
            .lookup_session(target_nick)
            .ok_or_else(|| IrcError::protocol(response::error_no_such_nickname(&self.host, &nick, target_nick)))?;
        let target_session = self.require_session(target_id)?;
        let user = target_session.user.clone().unwrap_or_default();
        let host = target_session.host.clone();
        let realname = target_session.realname.clone().unwrap_or_default();
        let connected_at = target_session.connected_at;

        self.deliver(session_id, response::reply_whois_user(&self.host, &nick, target_nick, &user, &host, &realname));
        self.deliver(session_id, response::reply_whois_server(&self.host, &nick, target_nick, &self.host, &self.server_name));

        if let Some(target) = self.nicknames.get(target_nick) {
            let idle = (Utc::now() - target.last_seen).num_seconds().max(0) as u64;
            self.deliver(
                session_id,
                response::reply_whois_idle(&self.host, &nick, target_nick, idle, connected_at.timestamp()),
            );
            let channels: Vec<String> = target.channels.iter().cloned().collect();
            if !channels.is_empty() {
                self.deliver(session_id, response::reply_whois_channels(&self.host, &nick, target_nick, &channels));
            }
        }

        self.deliver(session_id, response::reply_end_whois(&self.host, &nick, target_nick));
        Ok(())
    }

    /// ISON: the subset of the requested nicknames that are currently online.
    pub fn ison(&mut self, session_id: SessionId, requested: &[String]) -> IrcResult<()> {
        let nick = self.require_nick(session_id)?;
        let online: Vec<String> = requested.iter().filter(|n| self.has_nickname(n)).cloned().collect();
        self.deliver(session_id, response::reply_ison(&self.host, &nick, &online));
        Ok(())
    }
}

fn server_time_now() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
