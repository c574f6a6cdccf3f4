//! The flag/char mapping and argument-arity table for user and channel
//! modes. Mutating the parent entity (adding to `operators`, storing a
//! key, adding a ban mask) is the daemon crate's job — see
//! `ircd::state::{nickname, channel}` — this module only knows which
//! character means what and whether it carries an argument.

use std::fmt;

/// Common behavior of a mode flag character.
pub trait ModeType: Copy + Eq + fmt::Debug {
    /// Parse a flag character, if it is recognized.
    fn from_char(c: char) -> Option<Self>;

    /// The wire character for this flag.
    fn to_char(&self) -> char;

    /// Whether `+flag` requires a parameter.
    fn takes_arg_on_set(&self) -> bool;

    /// Whether `-flag` requires a parameter.
    fn takes_arg_on_clear(&self) -> bool;
}

/// User mode flags (spec.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserMode {
    /// `a` — away (set indirectly via AWAY, not raw MODE; see `ircd::core`).
    Away,
    /// `i` — invisible.
    Invisible,
    /// `w` — receives WALLOPS.
    Wallops,
    /// `r` — restricted connection.
    Restricted,
    /// `o` — network operator.
    Operator,
    /// `O` — local operator.
    LocalOperator,
    /// `s` — receives server notices.
    ServerNotices,
}

impl ModeType for UserMode {
    fn from_char(c: char) -> Option<Self> {
        Some(match c {
            'a' => UserMode::Away,
            'i' => UserMode::Invisible,
            'w' => UserMode::Wallops,
            'r' => UserMode::Restricted,
            'o' => UserMode::Operator,
            'O' => UserMode::LocalOperator,
            's' => UserMode::ServerNotices,
            _ => return None,
        })
    }

    fn to_char(&self) -> char {
        match self {
            UserMode::Away => 'a',
            UserMode::Invisible => 'i',
            UserMode::Wallops => 'w',
            UserMode::Restricted => 'r',
            UserMode::Operator => 'o',
            UserMode::LocalOperator => 'O',
            UserMode::ServerNotices => 's',
        }
    }

    fn takes_arg_on_set(&self) -> bool {
        false
    }

    fn takes_arg_on_clear(&self) -> bool {
        false
    }
}

/// Channel mode flags (spec.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelMode {
    /// `p` — private (hidden from non-member LIST with reason text).
    Private,
    /// `s` — secret (hidden entirely from non-members).
    Secret,
    /// `i` — invite-only.
    InviteOnly,
    /// `t` — topic settable only by operators.
    TopicClosed,
    /// `n` — no external messages (messages must come from a member).
    NoExternalMessages,
    /// `m` — moderated.
    Moderated,
    /// `l` — user limit (boolean flag only; no capacity is enforced, as in
    /// the reference implementation this server is grounded on).
    UserLimit,
    /// `b` — ban mask; parameter is the mask to add/remove.
    Ban,
    /// `e` — ban exception mask; parameter is the mask to add/remove.
    Exception,
    /// `v` — voice; parameter is the nickname to grant/revoke voice.
    Voice,
    /// `k` — channel key; parameter is the key (set only).
    Key,
    /// `o` — channel operator; parameter is the nickname to add/remove.
    Operator,
}

impl ModeType for ChannelMode {
    fn from_char(c: char) -> Option<Self> {
        Some(match c {
            'p' => ChannelMode::Private,
            's' => ChannelMode::Secret,
            'i' => ChannelMode::InviteOnly,
            't' => ChannelMode::TopicClosed,
            'n' => ChannelMode::NoExternalMessages,
            'm' => ChannelMode::Moderated,
            'l' => ChannelMode::UserLimit,
            'b' => ChannelMode::Ban,
            'e' => ChannelMode::Exception,
            'v' => ChannelMode::Voice,
            'k' => ChannelMode::Key,
            'o' => ChannelMode::Operator,
            _ => return None,
        })
    }

    fn to_char(&self) -> char {
        match self {
            ChannelMode::Private => 'p',
            ChannelMode::Secret => 's',
            ChannelMode::InviteOnly => 'i',
            ChannelMode::TopicClosed => 't',
            ChannelMode::NoExternalMessages => 'n',
            ChannelMode::Moderated => 'm',
            ChannelMode::UserLimit => 'l',
            ChannelMode::Ban => 'b',
            ChannelMode::Exception => 'e',
            ChannelMode::Voice => 'v',
            ChannelMode::Key => 'k',
            ChannelMode::Operator => 'o',
        }
    }

    fn takes_arg_on_set(&self) -> bool {
        matches!(
            self,
            ChannelMode::Ban | ChannelMode::Exception | ChannelMode::Voice | ChannelMode::Key | ChannelMode::Operator
        )
    }

    fn takes_arg_on_clear(&self) -> bool {
        matches!(
            self,
            ChannelMode::Ban | ChannelMode::Exception | ChannelMode::Voice | ChannelMode::Operator
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_mode_chars_round_trip() {
        for c in ['a', 'i', 'w', 'r', 'o', 'O', 's'] {
            let m = UserMode::from_char(c).unwrap();
            assert_eq!(m.to_char(), c);
        }
    }

    #[test]
    fn channel_mode_chars_round_trip() {
        for c in ['p', 's', 'i', 't', 'n', 'm', 'l', 'b', 'e', 'v', 'k', 'o'] {
            let m = ChannelMode::from_char(c).unwrap();
            assert_eq!(m.to_char(), c);
        }
    }

    #[test]
    fn key_requires_arg_only_on_set() {
        assert!(ChannelMode::Key.takes_arg_on_set());
        assert!(!ChannelMode::Key.takes_arg_on_clear());
    }

    #[test]
    fn unknown_char_is_none() {
        assert!(UserMode::from_char('z').is_none());
        assert!(ChannelMode::from_char('z').is_none());
    }
}
