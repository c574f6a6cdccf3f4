//! The [`Message`] type: a parsed or about-to-be-serialized IRC line.

mod nom_parser;
mod parse;
mod serialize;

use std::borrow::Cow;

use crate::prefix::Prefix;

/// A single IRCv3 message tag: `name` (possibly `+client-tag`) and an
/// optional value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag(pub Cow<'static, str>, pub Option<String>);

impl Tag {
    /// Build a tag from a name and value.
    pub fn new(name: impl Into<Cow<'static, str>>, value: impl Into<String>) -> Self {
        Tag(name.into(), Some(value.into()))
    }

    /// Build a valueless tag.
    pub fn flag(name: impl Into<Cow<'static, str>>) -> Self {
        Tag(name.into(), None)
    }

    /// Whether this is an IRCv3 client tag (`+`-prefixed), preserved
    /// verbatim across routing rather than interpreted by the server.
    pub fn is_client_tag(&self) -> bool {
        self.0.starts_with('+')
    }
}

/// A parsed or freshly-constructed IRC protocol message.
///
/// `command` is a plain string rather than a typed enum: this server
/// implements one small, fixed command set, and a dispatch table keyed on
/// the uppercased string (see `ircd::handlers`) is simpler than threading
/// a large generated enum through both crates for no added safety here.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Tags present on the message, in wire order.
    pub tags: Option<Vec<Tag>>,
    /// The source of the message, if any.
    pub prefix: Option<Prefix>,
    /// The uppercased command token or three-digit numeric.
    pub command: String,
    /// Positional arguments; the last one may contain spaces.
    pub args: Vec<String>,
}

impl Message {
    /// Build a message with no tags and no prefix.
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Message {
            tags: None,
            prefix: None,
            command: command.into(),
            args,
        }
    }

    /// Attach a prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: Prefix) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// Attach tags, replacing any already present.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags = if tags.is_empty() { None } else { Some(tags) };
        self
    }

    /// Add a single tag.
    #[must_use]
    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.get_or_insert_with(Vec::new).push(tag);
        self
    }

    /// The value of a tag by name, if present.
    pub fn tag_value(&self, name: &str) -> Option<&str> {
        self.tags
            .as_ref()?
            .iter()
            .find(|t| t.0 == name)
            .and_then(|t| t.1.as_deref())
    }

    /// Only the client tags (`+`-prefixed), in wire order.
    pub fn client_tags(&self) -> Vec<&Tag> {
        self.tags
            .as_ref()
            .map(|tags| tags.iter().filter(|t| t.is_client_tag()).collect())
            .unwrap_or_default()
    }

    /// The nickname of the sender, if the prefix is a user identity.
    pub fn source_nickname(&self) -> Option<&str> {
        self.prefix.as_ref().and_then(Prefix::nickname)
    }

    /// Parse a single line (without the terminating CRLF).
    pub fn parse(line: &str) -> Result<Message, crate::error::ProtocolError> {
        parse::parse_line(line)
    }
}

impl std::str::FromStr for Message {
    type Err = crate::error::ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Message::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_round_trip() {
        let msg = Message::new("PRIVMSG", vec!["#chan".into(), "hi".into()])
            .with_prefix(Prefix::parse("foo!foo@localhost"))
            .with_tag(Tag::new("time", "2026-01-01T00:00:00Z"));
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.tag_value("time"), Some("2026-01-01T00:00:00Z"));
        assert_eq!(msg.source_nickname(), Some("foo"));
    }

    #[test]
    fn client_tags_filters_by_prefix() {
        let msg = Message::new("TAGMSG", vec!["#chan".into()])
            .with_tag(Tag::new("aaa", "bbb"))
            .with_tag(Tag::new("+example.com/ddd", "eee"));
        let client = msg.client_tags();
        assert_eq!(client.len(), 1);
        assert_eq!(client[0].0, "+example.com/ddd");
    }
}
