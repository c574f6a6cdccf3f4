//! Identity masks (`nick!user@host` with `*` wildcards) used for channel
//! bans and ban exceptions.

use std::fmt;

/// A compiled `nick!user@host` glob pattern. Missing parts default to `*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mask {
    nick: String,
    user: String,
    host: String,
}

impl Mask {
    /// Parse a raw mask string such as `*!*@localhost` or `bar!*@*`.
    /// Missing `nick`/`user`/`host` segments default to `*`.
    pub fn parse(raw: &str) -> Mask {
        let (nick, rest) = match raw.find('!') {
            Some(i) => (&raw[..i], &raw[i + 1..]),
            None => ("*", raw),
        };
        let (user, host) = match rest.find('@') {
            Some(i) => (&rest[..i], &rest[i + 1..]),
            None => ("*", rest),
        };
        Mask {
            nick: non_empty_or_star(nick),
            user: non_empty_or_star(user),
            host: non_empty_or_star(host),
        }
    }

    /// Whether this mask matches a full `nick!user@host` identity string.
    /// Matching is case-insensitive and anchored; `*` matches a run of one
    /// or more characters (`original_source/ircd/mask.py` compiles it to
    /// `.+?`, not `.*?`), so it never matches an empty segment.
    pub fn matches(&self, identity: &str) -> bool {
        let (nick, rest) = match identity.find('!') {
            Some(i) => (&identity[..i], &identity[i + 1..]),
            None => ("", identity),
        };
        let (user, host) = match rest.find('@') {
            Some(i) => (&rest[..i], &rest[i + 1..]),
            None => ("", rest),
        };
        glob_match(&self.nick, nick) && glob_match(&self.user, user) && glob_match(&self.host, host)
    }
}

fn non_empty_or_star(s: &str) -> String {
    if s.is_empty() {
        "*".to_owned()
    } else {
        s.to_owned()
    }
}

/// Case-insensitive glob match where `*` matches one or more characters.
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().flat_map(char::to_lowercase).collect();
    let text: Vec<char> = text.chars().flat_map(char::to_lowercase).collect();
    glob_match_chars(&pattern, &text)
}

fn glob_match_chars(pattern: &[char], text: &[char]) -> bool {
    match pattern.first() {
        None => text.is_empty(),
        Some('*') => {
            let rest = &pattern[1..];
            (1..=text.len()).any(|i| glob_match_chars(rest, &text[i..]))
        }
        Some(c) => match text.first() {
            Some(t) if t == c => glob_match_chars(&pattern[1..], &text[1..]),
            _ => false,
        },
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}@{}", self.nick, self.user, self.host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_missing_parts_as_star() {
        let m = Mask::parse("bar");
        assert_eq!(m.to_string(), "*!*@bar");
    }

    #[test]
    fn full_wildcard_matches_everyone() {
        let m = Mask::parse("*!*@localhost");
        assert!(m.matches("bar!bar@localhost"));
        assert!(!m.matches("bar!bar@example.com"));
    }

    #[test]
    fn case_insensitive() {
        let m = Mask::parse("*!*@LocalHost");
        assert!(m.matches("bar!bar@localhost"));
    }

    #[test]
    fn structural_equality() {
        assert_eq!(Mask::parse("bar"), Mask::parse("*!*@bar"));
    }

    #[test]
    fn partial_wildcard() {
        let m = Mask::parse("b*r!*@*");
        assert!(m.matches("bar!anything@anywhere"));
        assert!(m.matches("bazaar!x@y"));
        assert!(!m.matches("baz!x@y"));
    }

    #[test]
    fn star_requires_at_least_one_character() {
        // `ab*` must not match the bare nick `ab`: each `*` is `.+?`, not
        // `.*?` (original_source/ircd/mask.py).
        let m = Mask::parse("ab*!*@*");
        assert!(!m.matches("ab!user@host"));
        assert!(m.matches("abc!user@host"));
    }

    #[test]
    fn star_does_not_match_an_empty_segment() {
        let m = Mask::parse("*!*@*");
        assert!(!m.matches("!user@host"));
        assert!(!m.matches("nick!@host"));
        assert!(!m.matches("nick!user@"));
    }
}
