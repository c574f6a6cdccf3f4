//! Formatting: the inverse of [`super::parse`].

use std::fmt;

use crate::tags::escape_tag_value;

use super::Message;

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tags) = self.tags.as_ref().filter(|t| !t.is_empty()) {
            f.write_str("@")?;
            for (i, tag) in tags.iter().enumerate() {
                if i > 0 {
                    f.write_str(";")?;
                }
                f.write_str(&tag.0)?;
                if let Some(value) = &tag.1 {
                    f.write_str("=")?;
                    f.write_str(&escape_tag_value(value))?;
                }
            }
            f.write_str(" ")?;
        }

        if let Some(prefix) = &self.prefix {
            write!(f, ":{prefix} ")?;
        }

        f.write_str(&self.command)?;

        if let Some((last, head)) = self.args.split_last() {
            for arg in head {
                write!(f, " {arg}")?;
            }
            if !last.is_empty() {
                write!(f, " :{last}")?;
            }
        }

        Ok(())
    }
}

impl Message {
    /// Format this message as a complete wire line, CRLF-terminated.
    pub fn to_line(&self) -> String {
        format!("{self}\r\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefix::Prefix;
    use crate::message::Tag;

    #[test]
    fn formats_simple_command() {
        let msg = Message::new("PING", vec!["server".into()]);
        assert_eq!(msg.to_string(), "PING :server");
    }

    #[test]
    fn formats_prefix_and_trailing() {
        let msg = Message::new("PRIVMSG", vec!["#chan".into(), "hi there".into()])
            .with_prefix(Prefix::parse("foo!foo@localhost"));
        assert_eq!(msg.to_string(), ":foo!foo@localhost PRIVMSG #chan :hi there");
    }

    #[test]
    fn formats_tags_before_everything() {
        let msg = Message::new("PRIVMSG", vec!["foo".into(), "Hello".into()])
            .with_prefix(Prefix::parse("bar!bar@localhost"))
            .with_tag(Tag::new("+example.com/ddd", "eee"))
            .with_tag(Tag::new("time", "2026-01-01T00:00:00Z"));
        assert_eq!(
            msg.to_string(),
            "@+example.com/ddd=eee;time=2026-01-01T00:00:00Z :bar!bar@localhost PRIVMSG foo :Hello"
        );
    }

    #[test]
    fn round_trip_parse_format() {
        for line in [
            "PING :server",
            ":foo!foo@localhost JOIN :#chan",
            ":localhost 001 foo :Welcome to the Internet Relay Network foo!foo@localhost",
        ] {
            let parsed = Message::parse(line).unwrap();
            assert_eq!(parsed.to_string(), line);
        }
    }
}
