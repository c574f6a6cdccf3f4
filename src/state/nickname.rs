//! The persistent per-nickname identity record (spec.md §3, §4.4).
//!
//! Grounded in `original_source/ircd/nick.py`: a nickname survives a
//! NICK rename (the registry key moves, this struct does not) and is
//! destroyed only when its owning client disconnects.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use ircd_proto::mode::{ModeType, UserMode};

/// A registered nickname's persistent state.
#[derive(Debug, Clone)]
pub struct Nickname {
    /// The current nickname text (the registry's key may lag this by one
    /// rename during `set_nick`; see `core::Irc::set_nick`).
    pub name: String,
    /// Set user modes (`a`,`i`,`w`,`r`,`o`,`O`,`s`).
    modes: BTreeSet<char>,
    /// Last time a handler ran for this nickname's client.
    pub last_seen: DateTime<Utc>,
    /// Names of channels this nickname currently belongs to.
    pub channels: BTreeSet<String>,
    /// The AWAY message, if any (mode `a` is set iff this is `Some`).
    pub away_message: Option<String>,
}

impl Nickname {
    /// Create a fresh nickname record with no modes set and no channels
    /// joined.
    pub fn new(name: impl Into<String>) -> Self {
        Nickname {
            name: name.into(),
            modes: BTreeSet::new(),
            last_seen: Utc::now(),
            channels: BTreeSet::new(),
            away_message: None,
        }
    }

    /// Rename in place. Does not touch `channels` — the channels' member
    /// lists reference this nickname by string key owned by the core, not
    /// by a separate copy, so nothing needs re-indexing here.
    pub fn rename(&mut self, new_name: impl Into<String>) {
        self.name = new_name.into();
    }

    /// Record that a handler just ran for this nickname's client.
    pub fn seen(&mut self) {
        self.last_seen = Utc::now();
    }

    /// Record membership in a channel.
    pub fn joined_channel(&mut self, channel: &str) {
        self.channels.insert(channel.to_owned());
    }

    /// Remove membership in a channel.
    pub fn parted_channel(&mut self, channel: &str) {
        self.channels.remove(channel);
    }

    /// Whether the given flag is currently set.
    pub fn is_set(&self, flag: UserMode) -> bool {
        self.modes.contains(&flag.to_char())
    }

    /// Whether the away flag is set (equivalently, `away_message.is_some()`).
    pub fn is_away(&self) -> bool {
        self.away_message.is_some()
    }

    /// Set the AWAY flag and store the message (reply 306).
    pub fn set_away(&mut self, message: impl Into<String>) {
        self.modes.insert(UserMode::Away.to_char());
        self.away_message = Some(message.into());
    }

    /// Clear the AWAY flag and message (reply 305).
    pub fn clear_away(&mut self) {
        self.modes.remove(&UserMode::Away.to_char());
        self.away_message = None;
    }

    /// Apply `+flags` (each character of `flags` that names a known user
    /// mode). Returns the characters actually changed (were not already
    /// set), in `flags`' order — the echoed MODE reply uses this delta.
    ///
    /// No user mode takes a parameter (spec.md §4.3), so unlike
    /// `Channel::set_mode` there is no `param` argument here.
    pub fn set_mode(&mut self, flags: &str) -> String {
        let mut changed = String::new();
        for c in flags.chars() {
            if UserMode::from_char(c).is_none() {
                continue;
            }
            if self.modes.insert(c) {
                changed.push(c);
            }
        }
        changed
    }

    /// Apply `-flags`, mirroring [`Self::set_mode`].
    pub fn clear_mode(&mut self, flags: &str) -> String {
        let mut changed = String::new();
        for c in flags.chars() {
            if UserMode::from_char(c).is_none() {
                continue;
            }
            if self.modes.remove(&c) {
                changed.push(c);
            }
        }
        changed
    }

    /// The current mode string, e.g. `"iw"`, in character order.
    pub fn mode_string(&self) -> String {
        self.modes.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_preserves_channels() {
        let mut n = Nickname::new("foo");
        n.joined_channel("#chan");
        n.rename("bar");
        assert_eq!(n.name, "bar");
        assert!(n.channels.contains("#chan"));
    }

    #[test]
    fn set_mode_reports_only_newly_set_flags() {
        let mut n = Nickname::new("foo");
        assert_eq!(n.set_mode("iw"), "iw");
        assert_eq!(n.set_mode("iw"), "");
        assert_eq!(n.mode_string(), "iw");
    }

    #[test]
    fn away_sets_and_clears_flag_with_message() {
        let mut n = Nickname::new("foo");
        n.set_away("gone fishing");
        assert!(n.is_away());
        assert_eq!(n.mode_string(), "a");
        n.clear_away();
        assert!(!n.is_away());
        assert_eq!(n.mode_string(), "");
    }

    #[test]
    fn unknown_flag_characters_are_ignored() {
        let mut n = Nickname::new("foo");
        assert_eq!(n.set_mode("z"), "");
    }
}
