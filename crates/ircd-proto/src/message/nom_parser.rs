//! Low-level nom combinators splitting a raw line into its components.
//!
//! Mirrors the shape of a hand-rolled IRC line grammar: `[@tags] [:prefix]
//! <command> [params...] [:trailing]`. Kept separate from [`super::parse`]
//! so the borrowed intermediate form can be unit-tested on its own.

use nom::{
    bytes::complete::{take_till, take_while1},
    character::complete::{char, space0},
    combinator::opt,
    error::ErrorKind,
    sequence::preceded,
    IResult,
};
use smallvec::SmallVec;

fn parse_tags(input: &str) -> IResult<&str, &str> {
    preceded(char('@'), take_till(|c| c == ' '))(input)
}

fn parse_prefix(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), take_while1(|c| c != ' '))(input)
}

fn parse_command(input: &str) -> IResult<&str, &str> {
    let (rest, cmd) = take_while1(|c: char| c.is_ascii_alphanumeric())(input)?;
    let is_all_letters = cmd.chars().all(|c| c.is_ascii_alphabetic());
    let is_three_digits = cmd.len() == 3 && cmd.chars().all(|c| c.is_ascii_digit());
    if is_all_letters || is_three_digits {
        Ok((rest, cmd))
    } else {
        Err(nom::Err::Error(nom::error::Error::new(input, ErrorKind::AlphaNumeric)))
    }
}

/// Parse parameters after the command: space-separated tokens, with the
/// final trailing argument (introduced by ` :`) allowed to contain spaces.
/// Repeated spaces between parameters are collapsed, matching common
/// server leniency.
fn parse_params(input: &str) -> (&str, SmallVec<[&str; 15]>) {
    let mut params: SmallVec<[&str; 15]> = SmallVec::new();
    let mut rest = input;

    loop {
        if rest.as_bytes().first() != Some(&b' ') {
            break;
        }
        while rest.as_bytes().first() == Some(&b' ') {
            rest = &rest[1..];
        }
        if rest.is_empty() || rest.starts_with('\r') || rest.starts_with('\n') {
            break;
        }
        if let Some(stripped) = rest.strip_prefix(':') {
            let end = stripped.find(['\r', '\n']).unwrap_or(stripped.len());
            params.push(&stripped[..end]);
            rest = &stripped[end..];
            break;
        }
        let end = rest.find([' ', '\r', '\n']).unwrap_or(rest.len());
        let (param, remainder) = rest.split_at(end);
        if param.is_empty() {
            break;
        }
        params.push(param);
        rest = remainder;
        if params.len() >= 15 {
            break;
        }
    }

    (rest, params)
}

fn parse_message(input: &str) -> IResult<&str, ParsedMessage<'_>> {
    let (input, tags) = opt(parse_tags)(input)?;
    let (input, _) = space0(input)?;
    let (input, prefix) = opt(parse_prefix)(input)?;
    let (input, _) = space0(input)?;
    let (input, command) = parse_command(input)?;
    let (rest, params) = parse_params(input);
    Ok((
        rest,
        ParsedMessage {
            tags,
            prefix,
            command,
            params,
        },
    ))
}

/// Borrowed view of a parsed line, before tag unescaping and ownership
/// conversion happens in [`super::parse`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedMessage<'a> {
    pub tags: Option<&'a str>,
    pub prefix: Option<&'a str>,
    pub command: &'a str,
    pub params: SmallVec<[&'a str; 15]>,
}

/// Details of a failed parse, for the outer `ProtocolError`.
#[derive(Debug)]
pub(crate) struct DetailedParseError {
    pub position: usize,
}

impl<'a> ParsedMessage<'a> {
    pub fn parse(input: &'a str) -> Result<Self, DetailedParseError> {
        match parse_message(input) {
            Ok((_remaining, msg)) => Ok(msg),
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(DetailedParseError {
                position: input.len() - e.input.len(),
            }),
            Err(nom::Err::Incomplete(_)) => Err(DetailedParseError { position: input.len() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_command() {
        let p = ParsedMessage::parse("PING :server").unwrap();
        assert_eq!(p.command, "PING");
        assert_eq!(&p.params[..], ["server"]);
    }

    #[test]
    fn parses_tags_prefix_and_trailing() {
        let p = ParsedMessage::parse("@time=now :nick!u@h PRIVMSG #c :hello there").unwrap();
        assert_eq!(p.tags, Some("time=now"));
        assert_eq!(p.prefix, Some("nick!u@h"));
        assert_eq!(p.command, "PRIVMSG");
        assert_eq!(&p.params[..], ["#c", "hello there"]);
    }

    #[test]
    fn collapses_repeated_spaces() {
        let p = ParsedMessage::parse("JOIN   #chan").unwrap();
        assert_eq!(&p.params[..], ["#chan"]);
    }

    #[test]
    fn numeric_command_is_three_digits() {
        let p = ParsedMessage::parse(":localhost 001 foo :welcome").unwrap();
        assert_eq!(p.command, "001");
    }

    #[test]
    fn rejects_bad_command_token() {
        assert!(ParsedMessage::parse("1x2 foo").is_err());
    }
}
