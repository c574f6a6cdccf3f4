//! Message prefix: `nick!user@host`, `nick@host`, or a bare server name.

use std::fmt;

/// The source of a message, as written on the wire after the leading `:`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Prefix {
    /// A server name, e.g. `localhost`.
    ServerName(String),
    /// A user identity, any of whose `user`/`host` parts may be empty.
    Nickname(String, String, String),
}

impl Prefix {
    /// Build a user prefix from its three parts.
    pub fn new(nickname: impl Into<String>, user: impl Into<String>, host: impl Into<String>) -> Self {
        Prefix::Nickname(nickname.into(), user.into(), host.into())
    }

    /// Parse a raw prefix string leniently, the way a server decomposes an
    /// inbound `:source` token. A string containing `!` or `@` is a user
    /// identity; a bare name containing a `.` (conventionally a dotted
    /// server hostname) is treated as a server name; anything else is
    /// treated as a bare nickname with empty user/host.
    pub fn parse(raw: &str) -> Prefix {
        if let Some(bang) = raw.find('!') {
            let nickname = &raw[..bang];
            let rest = &raw[bang + 1..];
            if let Some(at) = rest.find('@') {
                return Prefix::Nickname(nickname.to_owned(), rest[..at].to_owned(), rest[at + 1..].to_owned());
            }
            return Prefix::Nickname(nickname.to_owned(), rest.to_owned(), String::new());
        }
        if let Some(at) = raw.find('@') {
            return Prefix::Nickname(raw[..at].to_owned(), String::new(), raw[at + 1..].to_owned());
        }
        if raw.contains('.') {
            return Prefix::ServerName(raw.to_owned());
        }
        Prefix::Nickname(raw.to_owned(), String::new(), String::new())
    }

    /// The nickname, if this is a user prefix.
    pub fn nickname(&self) -> Option<&str> {
        match self {
            Prefix::Nickname(nick, _, _) => Some(nick),
            Prefix::ServerName(_) => None,
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::ServerName(name) => f.write_str(name),
            Prefix::Nickname(nick, user, host) => match (user.is_empty(), host.is_empty()) {
                (true, true) => f.write_str(nick),
                (false, true) => write!(f, "{nick}!{user}"),
                (true, false) => write!(f, "{nick}@{host}"),
                (false, false) => write!(f, "{nick}!{user}@{host}"),
            },
        }
    }
}

impl From<&str> for Prefix {
    fn from(raw: &str) -> Self {
        Prefix::parse(raw)
    }
}
