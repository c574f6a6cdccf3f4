//! A read-only snapshot of server state, refreshed by the processor
//! task after each event and served by [`crate::http`] (spec.md §6.4).
//!
//! Kept separate from [`super::Irc`] itself so the only thing the HTTP
//! task ever touches is a plain, `Clone`-able, `Serialize`-able struct
//! behind a `tokio::sync::RwLock` — it never reaches into the registry
//! the processor task owns exclusively (spec.md §5).

use serde::Serialize;

use super::Irc;

/// One channel's publicly-visible status.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelStatus {
    /// The channel's name.
    pub name: String,
    /// Current topic, if any.
    pub topic: Option<String>,
    /// Number of members.
    pub member_count: usize,
}

/// One nickname's publicly-visible status.
#[derive(Debug, Clone, Serialize)]
pub struct NicknameStatus {
    /// The nickname.
    pub name: String,
    /// Whether it's currently marked away.
    pub away: bool,
}

/// The whole read-only surface spec.md §6.4 names.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusSnapshot {
    /// The server's name, as advertised in replies.
    pub server_name: String,
    /// Every non-secret channel.
    pub channels: Vec<ChannelStatus>,
    /// Every registered nickname.
    pub nicknames: Vec<NicknameStatus>,
}

impl Irc {
    /// Build a fresh snapshot of the current state. Secret channels are
    /// omitted, mirroring the gating [`Irc::list_channels`] applies for
    /// a requester with no memberships.
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            server_name: self.server_name.clone(),
            channels: self
                .channels()
                .filter(|c| !c.is_secret())
                .map(|c| ChannelStatus {
                    name: c.name.clone(),
                    topic: c.topic.clone(),
                    member_count: c.members.len(),
                })
                .collect(),
            nicknames: self
                .nicknames()
                .map(|n| NicknameStatus {
                    name: n.name.clone(),
                    away: n.is_away(),
                })
                .collect(),
        }
    }
}
