//! Owned-string parsing entry point, built on [`super::nom_parser`].

use std::borrow::Cow;

use crate::error::{MessageParseError, ProtocolError};
use crate::prefix::Prefix;
use crate::tags::unescape_tag_value;

use super::nom_parser::ParsedMessage;
use super::{Message, Tag};

/// Intern the handful of tag keys this server actually understands, to
/// avoid an allocation on the common path.
fn intern_tag_key(key: &str) -> Cow<'static, str> {
    match key {
        "time" => Cow::Borrowed("time"),
        "msgid" => Cow::Borrowed("msgid"),
        "account" => Cow::Borrowed("account"),
        _ => Cow::Owned(key.to_owned()),
    }
}

fn parse_tags_string(tags_str: &str) -> Vec<Tag> {
    tags_str
        .split(';')
        .filter(|s| !s.is_empty())
        .map(|tag| {
            let mut it = tag.splitn(2, '=');
            let key = it.next().unwrap_or("");
            let value = it.next().map(unescape_tag_value);
            Tag(intern_tag_key(key), value)
        })
        .collect()
}

pub(super) fn parse_line(line: &str) -> Result<Message, ProtocolError> {
    if line.is_empty() {
        return Err(ProtocolError::InvalidMessage {
            string: line.to_owned(),
            cause: MessageParseError::EmptyMessage,
        });
    }

    let parsed = ParsedMessage::parse(line).map_err(|e| ProtocolError::InvalidMessage {
        string: line.to_owned(),
        cause: MessageParseError::Malformed { position: e.position },
    })?;

    if parsed.command.is_empty() {
        return Err(ProtocolError::InvalidMessage {
            string: line.to_owned(),
            cause: MessageParseError::MissingCommand,
        });
    }

    Ok(Message {
        tags: parsed.tags.map(parse_tags_string),
        prefix: parsed.prefix.map(Prefix::parse),
        command: parsed.command.to_ascii_uppercase(),
        args: parsed.params.iter().map(|s| s.to_string()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_line() {
        assert!(parse_line("").is_err());
    }

    #[test]
    fn parses_privmsg_with_tags_and_prefix() {
        let msg = parse_line("@+example.com/ddd=eee :foo!foo@localhost PRIVMSG foo :Hello").unwrap();
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.args, vec!["foo".to_string(), "Hello".to_string()]);
        assert_eq!(msg.source_nickname(), Some("foo"));
        assert_eq!(msg.tag_value("+example.com/ddd"), Some("eee"));
    }

    #[test]
    fn uppercases_command() {
        let msg = parse_line("join #chan").unwrap();
        assert_eq!(msg.command, "JOIN");
    }

    #[test]
    fn unescapes_tag_values() {
        let msg = parse_line("@key=value\\swith\\sspace PING :test").unwrap();
        assert_eq!(msg.tag_value("key"), Some("value with space"));
    }
}
