//! IRCv3 capability negotiation (spec.md §4.7).
//!
//! This server recognizes exactly four capabilities; anything else is
//! rejected with a NAK rather than silently accepted.

use std::fmt;

/// A capability this server understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `message-tags` — forward client tags (`+name=value`) verbatim.
    MessageTags,
    /// `server-time` — add a `time` tag to outbound messages.
    ServerTime,
    /// `message-ids` — add a `msgid` tag to outbound messages.
    MessageIds,
    /// `sasl` — enable the AUTHENTICATE command.
    Sasl,
}

/// Every capability this server offers, in CAP LS order.
pub const ALL: [Capability; 4] = [
    Capability::MessageTags,
    Capability::ServerTime,
    Capability::MessageIds,
    Capability::Sasl,
];

impl Capability {
    /// Parse a capability token, if recognized.
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "message-tags" => Capability::MessageTags,
            "server-time" => Capability::ServerTime,
            "message-ids" => Capability::MessageIds,
            "sasl" => Capability::Sasl,
            _ => return None,
        })
    }

    /// The wire name of this capability.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::MessageTags => "message-tags",
            Capability::ServerTime => "server-time",
            Capability::MessageIds => "message-ids",
            Capability::Sasl => "sasl",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The space-separated list of all supported capability names, for CAP LS.
pub fn ls_list() -> String {
    ALL.iter().map(Capability::as_str).collect::<Vec<_>>().join(" ")
}

/// Split a CAP REQ token list into recognized and unrecognized capabilities,
/// preserving the caller's original spelling for the rejected set so it can
/// be echoed back verbatim in the NAK reply.
pub fn request(requested: &str) -> (Vec<Capability>, Vec<String>) {
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    for token in requested.split_whitespace() {
        match Capability::parse(token) {
            Some(cap) => accepted.push(cap),
            None => rejected.push(token.to_owned()),
        }
    }
    (accepted, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ls_list_contains_all_four() {
        let list = ls_list();
        for cap in ALL {
            assert!(list.contains(cap.as_str()));
        }
    }

    #[test]
    fn request_splits_known_and_unknown() {
        let (accepted, rejected) = request("message-tags server-time bogus-cap");
        assert_eq!(accepted, vec![Capability::MessageTags, Capability::ServerTime]);
        assert_eq!(rejected, vec!["bogus-cap".to_string()]);
    }

    #[test]
    fn parse_roundtrips_as_str() {
        for cap in ALL {
            assert_eq!(Capability::parse(cap.as_str()), Some(cap));
        }
    }
}
