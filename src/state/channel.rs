//! Channel membership, mode, and authorization state (spec.md §3, §4.4).
//!
//! Grounded in `original_source/ircd/chan.py`: an ordered member list, a
//! separate operator set, invited/ban/exception lists, and a `Mode`
//! mapping whose parameterized flags (`k`, `o`, `b`, `e`) mutate this
//! struct's own fields as a side effect of being set or cleared.

use std::collections::BTreeSet;

use ircd_proto::mask::Mask;
use ircd_proto::mode::{ChannelMode, ModeType};

/// The outcome of a successful `JOIN`, vs. the one case (`join_channel`)
/// that the core handles by sending a reply directly rather than raising
/// a typed error — see `original_source/ircd/irc.py`'s `join_channel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The nickname was added to (or was already in) `members`.
    Joined,
    /// A channel key is set and the supplied key didn't match.
    BadKey,
}

/// A named multicast group (spec.md §3).
#[derive(Debug, Clone)]
pub struct Channel {
    /// The channel name, including its leading `&`/`#`/`!`/`+`.
    pub name: String,
    /// The nickname that created this channel; always a member and
    /// operator for the channel's entire lifetime.
    pub owner: String,
    /// The join key, if `+k` is set.
    pub key: Option<String>,
    /// The current topic text, if any has been set.
    pub topic: Option<String>,
    /// The nickname that last set the topic.
    pub topic_setter: Option<String>,
    /// Unix timestamp the topic was last set at.
    pub topic_set_at: Option<i64>,
    /// Member nicknames, in join order.
    pub members: Vec<String>,
    /// Nicknames with channel-operator status. A subset of `members`;
    /// always contains `owner`.
    pub operators: BTreeSet<String>,
    /// Nicknames granted voice (`+v`). Not named in spec.md §3's data
    /// model table, but the mode registry documents `v`'s parameter as
    /// "the nickname to grant/revoke voice" — this is that list.
    pub voiced: BTreeSet<String>,
    /// Nicknames invited (relevant only while `+i` is set).
    pub invited: BTreeSet<String>,
    /// Ban masks (`+b`).
    pub bans: Vec<Mask>,
    /// Ban exception masks (`+e`).
    pub exceptions: Vec<Mask>,
    /// Set channel modes, excluding `k`/`b`/`e`/`o`/`v` whose state lives
    /// in the fields above rather than as a bare flag.
    modes: BTreeSet<char>,
}

impl Channel {
    /// Create a channel with `owner` as its sole member and operator.
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        let owner = owner.into();
        Channel {
            name: name.into(),
            owner: owner.clone(),
            key: None,
            topic: None,
            topic_setter: None,
            topic_set_at: None,
            members: vec![owner.clone()],
            operators: BTreeSet::from([owner]),
            voiced: BTreeSet::new(),
            invited: BTreeSet::new(),
            bans: Vec::new(),
            exceptions: Vec::new(),
            modes: BTreeSet::new(),
        }
    }

    /// Whether `nick` currently is a member.
    pub fn is_member(&self, nick: &str) -> bool {
        self.members.iter().any(|m| m == nick)
    }

    /// Whether `nick` is a channel operator.
    pub fn is_operator(&self, nick: &str) -> bool {
        self.operators.contains(nick)
    }

    /// Whether `nick` was invited (and the invite hasn't been consumed).
    pub fn is_invited(&self, nick: &str) -> bool {
        self.invited.contains(nick)
    }

    /// `+i`.
    pub fn is_invite_only(&self) -> bool {
        self.modes.contains(&ChannelMode::InviteOnly.to_char())
    }

    /// `+p`.
    pub fn is_private(&self) -> bool {
        self.modes.contains(&ChannelMode::Private.to_char())
    }

    /// `+s`.
    pub fn is_secret(&self) -> bool {
        self.modes.contains(&ChannelMode::Secret.to_char())
    }

    /// Topic may be set by non-operators unless `+t` is set.
    pub fn is_topic_open(&self) -> bool {
        !self.modes.contains(&ChannelMode::TopicClosed.to_char())
    }

    /// JOIN is permitted unless the channel is invite-only and `nick`
    /// hasn't been invited.
    pub fn can_join(&self, nick: &str) -> bool {
        if self.is_invite_only() {
            self.is_invited(nick)
        } else {
            true
        }
    }

    /// `is_banned(identity) ⇔ some ban mask matches ∧ no exception matches`
    /// (spec.md §3).
    pub fn is_banned(&self, identity: &str) -> bool {
        self.bans.iter().any(|m| m.matches(identity)) && !self.exceptions.iter().any(|m| m.matches(identity))
    }

    /// Add `nick` to `members` if a key is required and matches (or none
    /// is required). Idempotent: joining twice leaves `members` unchanged
    /// after the first join.
    pub fn join(&mut self, nick: &str, key: Option<&str>) -> JoinOutcome {
        if let Some(required) = &self.key {
            if key != Some(required.as_str()) {
                return JoinOutcome::BadKey;
            }
        }
        if !self.is_member(nick) {
            self.members.push(nick.to_owned());
        }
        JoinOutcome::Joined
    }

    /// Remove `nick` from `members`. Does not touch `invited`.
    pub fn part(&mut self, nick: &str) {
        self.members.retain(|m| m != nick);
    }

    /// Remove `nick` from both `invited` and `members` (spec.md §4.4).
    pub fn kick(&mut self, nick: &str) {
        self.invited.remove(nick);
        self.members.retain(|m| m != nick);
        self.operators.remove(nick);
        self.voiced.remove(nick);
    }

    /// Record an invite.
    pub fn invite(&mut self, nick: &str) {
        self.invited.insert(nick.to_owned());
    }

    /// Set the topic, recording who set it.
    pub fn set_topic(&mut self, topic: impl Into<String>, setter: &str, set_at_unix: i64) {
        self.topic = Some(topic.into());
        self.topic_setter = Some(setter.to_owned());
        self.topic_set_at = Some(set_at_unix);
    }

    /// The current mode string, e.g. `"nt"`, in character order. Includes
    /// every set flag, including `k`/`b`/`e`/`o`/`v` whose presence is
    /// derived from the dedicated fields.
    pub fn mode_string(&self) -> String {
        let mut chars = self.modes.clone();
        if self.key.is_some() {
            chars.insert(ChannelMode::Key.to_char());
        }
        chars.into_iter().collect()
    }

    /// Apply `+flags`, with `param` applied to every flag in `flags` that
    /// takes one on set (spec.md §4.3's single shared-parameter model,
    /// grounded in `original_source/ircd/mode.py`'s
    /// `Mode.set_flags(flags, param=None)`). Returns the flags actually
    /// changed, in `flags`' order; a required parameter missing, or an
    /// empty parameter to `k`, raises [`ModeError`].
    pub fn set_mode(&mut self, flags: &str, param: Option<&str>) -> Result<String, ModeError> {
        let mut changed = String::new();
        for c in flags.chars() {
            let Some(flag) = ChannelMode::from_char(c) else { continue };
            if flag.takes_arg_on_set() && param.is_none() {
                return Err(ModeError);
            }
            // `k` additionally requires the parameter be non-empty
            // (spec.md §4.3): an empty key would set `+k` with no key a
            // client could ever supply back on JOIN.
            if flag == ChannelMode::Key && param.is_some_and(str::is_empty) {
                return Err(ModeError);
            }
            if self.set_one(flag, param) {
                changed.push(c);
            }
        }
        Ok(changed)
    }

    /// Apply `-flags`, mirroring [`Self::set_mode`].
    pub fn clear_mode(&mut self, flags: &str, param: Option<&str>) -> Result<String, ModeError> {
        let mut changed = String::new();
        for c in flags.chars() {
            let Some(flag) = ChannelMode::from_char(c) else { continue };
            if flag.takes_arg_on_clear() && param.is_none() {
                return Err(ModeError);
            }
            if self.clear_one(flag, param) {
                changed.push(c);
            }
        }
        Ok(changed)
    }

    fn set_one(&mut self, flag: ChannelMode, param: Option<&str>) -> bool {
        match flag {
            ChannelMode::Key => {
                // `param` is checked present and non-empty by the caller.
                self.key = param.map(str::to_owned);
                true
            }
            ChannelMode::Operator => {
                let Some(nick) = param else { return false };
                if self.is_member(nick) {
                    self.operators.insert(nick.to_owned())
                } else {
                    false
                }
            }
            ChannelMode::Voice => {
                let Some(nick) = param else { return false };
                if self.is_member(nick) {
                    self.voiced.insert(nick.to_owned())
                } else {
                    false
                }
            }
            ChannelMode::Ban => {
                let Some(raw) = param else { return false };
                let mask = Mask::parse(raw);
                if self.bans.contains(&mask) {
                    false
                } else {
                    self.bans.push(mask);
                    true
                }
            }
            ChannelMode::Exception => {
                let Some(raw) = param else { return false };
                let mask = Mask::parse(raw);
                if self.exceptions.contains(&mask) {
                    false
                } else {
                    self.exceptions.push(mask);
                    true
                }
            }
            other => self.modes.insert(other.to_char()),
        }
    }

    fn clear_one(&mut self, flag: ChannelMode, param: Option<&str>) -> bool {
        match flag {
            ChannelMode::Key => {
                let was_set = self.key.is_some();
                self.key = None;
                was_set
            }
            ChannelMode::Operator => {
                let Some(nick) = param else { return false };
                self.operators.remove(nick)
            }
            ChannelMode::Voice => {
                let Some(nick) = param else { return false };
                self.voiced.remove(nick)
            }
            ChannelMode::Ban => {
                let Some(raw) = param else { return false };
                let mask = Mask::parse(raw);
                if let Some(pos) = self.bans.iter().position(|m| *m == mask) {
                    self.bans.remove(pos);
                    true
                } else {
                    false
                }
            }
            ChannelMode::Exception => {
                let Some(raw) = param else { return false };
                let mask = Mask::parse(raw);
                if let Some(pos) = self.exceptions.iter().position(|m| *m == mask) {
                    self.exceptions.remove(pos);
                    true
                } else {
                    false
                }
            }
            other => self.modes.remove(&other.to_char()),
        }
    }
}

/// Raised when a mode flag that requires a parameter was applied without
/// one (spec.md §4.3). The handler boundary translates this to reply 461.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("mode requires a parameter")]
pub struct ModeError;

/// A separate name matching `original_source`'s `ModeParamMissing`, kept
/// distinct from `ircd_proto::ModeParseError` (a wire-parse failure) since
/// this one is raised by applying an already-parsed mode string.
pub type ModeParamMissing = ModeError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_is_member_and_operator() {
        let chan = Channel::new("#chan", "foo");
        assert!(chan.is_member("foo"));
        assert!(chan.is_operator("foo"));
    }

    #[test]
    fn join_twice_is_idempotent() {
        let mut chan = Channel::new("#chan", "foo");
        assert_eq!(chan.join("bar", None), JoinOutcome::Joined);
        assert_eq!(chan.join("bar", None), JoinOutcome::Joined);
        assert_eq!(chan.members.iter().filter(|m| *m == "bar").count(), 1);
    }

    #[test]
    fn key_mismatch_is_rejected() {
        let mut chan = Channel::new("#chan", "foo");
        chan.set_mode("k", Some("sekret")).unwrap();
        assert_eq!(chan.join("bar", Some("wrong")), JoinOutcome::BadKey);
        assert_eq!(chan.join("bar", Some("sekret")), JoinOutcome::Joined);
    }

    #[test]
    fn ban_then_exception_then_unban() {
        let mut chan = Channel::new("#chan", "foo");
        chan.set_mode("b", Some("*!*@localhost")).unwrap();
        assert!(chan.is_banned("bar!bar@localhost"));
        chan.set_mode("e", Some("*!*@localhost")).unwrap();
        assert!(!chan.is_banned("bar!bar@localhost"));
        chan.clear_mode("e", Some("*!*@localhost")).unwrap();
        assert!(chan.is_banned("bar!bar@localhost"));
        chan.clear_mode("b", Some("*!*@localhost")).unwrap();
        assert!(!chan.is_banned("bar!bar@localhost"));
    }

    #[test]
    fn key_without_param_is_param_missing() {
        let mut chan = Channel::new("#chan", "foo");
        assert_eq!(chan.set_mode("k", None), Err(ModeError));
    }

    #[test]
    fn key_with_empty_param_is_rejected() {
        let mut chan = Channel::new("#chan", "foo");
        assert_eq!(chan.set_mode("k", Some("")), Err(ModeError));
        assert!(chan.key.is_none());
    }

    #[test]
    fn set_mode_twice_is_idempotent() {
        let mut chan = Channel::new("#chan", "foo");
        assert_eq!(chan.set_mode("n", None).unwrap(), "n");
        assert_eq!(chan.set_mode("n", None).unwrap(), "");
        assert_eq!(chan.mode_string(), "n");
    }

    #[test]
    fn kick_removes_from_members_and_invited() {
        let mut chan = Channel::new("#chan", "foo");
        chan.join("bar", None);
        chan.invite("bar");
        chan.kick("bar");
        assert!(!chan.is_member("bar"));
        assert!(!chan.is_invited("bar"));
    }
}
