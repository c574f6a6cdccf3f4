//! Numeric and command reply constructors (spec.md §4.1, §6.1).
//!
//! One function per reply, each building a ready-to-send [`Message`]. The
//! exact trailing-text byte form of every numeric follows
//! `original_source/ircd/message.py` literally — see `DESIGN.md` for the
//! handful of places that document differ deliberately (the 473/474/475
//! embedded colon, the 482 missing one, the LUSER `251`/`252` target
//! normalized to `*`).

use crate::message::{Message, Tag};
use crate::prefix::Prefix;

fn server(host: &str) -> Prefix {
    Prefix::ServerName(host.to_owned())
}

fn numeric(host: &str, code: &str, args: Vec<String>) -> Message {
    Message::new(code, args).with_prefix(server(host))
}

fn or_star(name: &str) -> String {
    if name.is_empty() { "*".to_owned() } else { name.to_owned() }
}

/// `string.ascii_letters` equivalent used as the placeholder user/channel
/// mode-letter fields of `RPL_MYINFO` (004) — this server does not publish
/// per-letter mode support tables, matching `original_source`.
const ASCII_LETTERS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

// ---------------------------------------------------------------- welcome burst

/// 001 — RPL_WELCOME.
pub fn reply_welcome(host: &str, target: &str, nickname: &str, user: &str, hostname: &str) -> Message {
    numeric(
        host,
        "001",
        vec![
            target.to_owned(),
            format!("Welcome to the Internet Relay Network {nickname}!{user}@{hostname}"),
        ],
    )
}

/// 002 — RPL_YOURHOST.
pub fn reply_yourhost(host: &str, target: &str, name: &str, version: &str) -> Message {
    numeric(
        host,
        "002",
        vec![target.to_owned(), format!("Your host is {name}, running version {version}")],
    )
}

/// 003 — RPL_CREATED.
pub fn reply_created(host: &str, target: &str, created: &str) -> Message {
    numeric(host, "003", vec![target.to_owned(), format!("This server was created {created}")])
}

/// 004 — RPL_MYINFO.
pub fn reply_myinfo(host: &str, target: &str, name: &str, version: &str) -> Message {
    numeric(
        host,
        "004",
        vec![target.to_owned(), format!("{name} {version} {ASCII_LETTERS} {ASCII_LETTERS}")],
    )
}

/// 005 — RPL_ISUPPORT.
pub fn reply_isupport(host: &str, target: &str, tokens: &[(&str, &str)]) -> Message {
    let joined = tokens
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" ");
    numeric(host, "005", vec![target.to_owned(), joined])
}

/// 251 — RPL_LUSERCLIENT.
pub fn reply_luser_client(host: &str, num_users: usize, num_servers: usize) -> Message {
    numeric(
        host,
        "251",
        vec!["*".to_owned(), format!("There are {num_users} user(s) on {num_servers} server(s)")],
    )
}

/// 252 — RPL_LUSEROP.
pub fn reply_luser_op(host: &str, num_ops: usize) -> Message {
    numeric(host, "252", vec!["*".to_owned(), format!("There are {num_ops} operator(s) online")])
}

/// 254 — RPL_LUSERCHANNELS.
pub fn reply_luser_chan(host: &str, num_chans: usize) -> Message {
    numeric(host, "254", vec!["*".to_owned(), format!("There are {num_chans} channels(s) formed")])
}

/// 255 — RPL_LUSERME.
pub fn reply_luser_me(host: &str, num_clients: usize, num_servers: usize) -> Message {
    numeric(
        host,
        "255",
        vec!["*".to_owned(), format!("I have {num_clients} client(s) and {num_servers} server(s)")],
    )
}

// ---------------------------------------------------------------- user/channel mode

/// 221 — RPL_UMODEIS.
pub fn reply_user_mode_is(host: &str, target: &str, mode: &str) -> Message {
    numeric(host, "221", vec![target.to_owned(), format!("+{mode}")])
}

/// 324 — RPL_CHANNELMODEIS.
pub fn reply_channel_mode_is(host: &str, target: &str, channel: &str, mode: &str, params: Option<&str>) -> Message {
    let mut args = vec![target.to_owned(), channel.to_owned(), format!("+{mode}")];
    if let Some(p) = params.filter(|p| !p.is_empty()) {
        args.push(p.to_owned());
    }
    numeric(host, "324", args)
}

// ---------------------------------------------------------------- away

/// 301 — RPL_AWAY.
pub fn reply_away(host: &str, target: &str, nickname: &str, message: &str) -> Message {
    numeric(host, "301", vec![target.to_owned(), nickname.to_owned(), message.to_owned()])
}

/// 305 — RPL_UNAWAY.
pub fn reply_unaway(host: &str, target: &str) -> Message {
    numeric(host, "305", vec![target.to_owned(), "You are no longer marked as being away".to_owned()])
}

/// 306 — RPL_NOWAWAY.
pub fn reply_nowaway(host: &str, target: &str) -> Message {
    numeric(host, "306", vec![target.to_owned(), "You have been marked as being away".to_owned()])
}

// ---------------------------------------------------------------- topic

/// 331 — RPL_NOTOPIC.
pub fn reply_notopic(host: &str, target: &str, channel: &str) -> Message {
    numeric(host, "331", vec![target.to_owned(), channel.to_owned()])
}

/// 332 — RPL_TOPIC.
pub fn reply_topic(host: &str, target: &str, channel: &str, topic: &str) -> Message {
    numeric(host, "332", vec![target.to_owned(), channel.to_owned(), topic.to_owned()])
}

/// 333 — RPL_TOPICWHOTIME.
pub fn reply_topic_who_time(host: &str, target: &str, channel: &str, setter: &str, set_at_unix: i64) -> Message {
    numeric(
        host,
        "333",
        vec![target.to_owned(), channel.to_owned(), setter.to_owned(), set_at_unix.to_string()],
    )
}

// ---------------------------------------------------------------- invite/names/list

/// 341 — RPL_INVITING.
pub fn reply_inviting(host: &str, target: &str, channel: &str, invitee: &str) -> Message {
    numeric(host, "341", vec![target.to_owned(), channel.to_owned(), invitee.to_owned()])
}

/// 353 — RPL_NAMREPLY. `members` should already be sorted by the caller.
pub fn reply_names(host: &str, target: &str, channel: &str, members: &[String]) -> Message {
    numeric(
        host,
        "353",
        vec![target.to_owned(), "=".to_owned(), channel.to_owned(), members.join(" ")],
    )
}

/// 366 — RPL_ENDOFNAMES.
pub fn reply_endnames(host: &str, target: &str, channel: &str) -> Message {
    numeric(host, "366", vec![target.to_owned(), channel.to_owned(), "End of /NAMES list.".to_owned()])
}

/// 321 — RPL_LISTSTART.
pub fn reply_list_start(host: &str, target: &str) -> Message {
    numeric(
        host,
        "321",
        vec![target.to_owned(), "Channel".to_owned(), "Users".to_owned(), "Name".to_owned()],
    )
}

/// 322 — RPL_LIST.
pub fn reply_list(host: &str, target: &str, channel: &str, member_count: usize, topic_or_private: &str) -> Message {
    numeric(
        host,
        "322",
        vec![target.to_owned(), channel.to_owned(), member_count.to_string(), topic_or_private.to_owned()],
    )
}

/// 323 — RPL_LISTEND.
pub fn reply_list_end(host: &str, target: &str) -> Message {
    numeric(host, "323", vec![target.to_owned(), "End of /LIST".to_owned()])
}

// ---------------------------------------------------------------- errors

/// 433 — ERR_NICKNAMEINUSE.
pub fn error_nick_in_use(host: &str, target: &str, nickname: &str) -> Message {
    numeric(host, "433", vec![target.to_owned(), nickname.to_owned()])
}

/// 441 — ERR_USERNOTINCHANNEL (used here for "you are not in that channel").
pub fn error_not_in_channel(host: &str, target: &str) -> Message {
    numeric(host, "441", vec![target.to_owned()])
}

/// 403 — ERR_NOSUCHCHANNEL.
pub fn error_no_such_channel(host: &str, target: &str, name: &str) -> Message {
    numeric(host, "403", vec![target.to_owned(), format!("{name} No such nick/channel")])
}

/// 401 — ERR_NOSUCHNICK.
pub fn error_no_such_nickname(host: &str, target: &str, name: &str) -> Message {
    numeric(host, "401", vec![target.to_owned(), format!("{name} No such nick/channel")])
}

/// 461 — ERR_NEEDMOREPARAMS.
pub fn error_needs_more_params(host: &str, target: &str, command: &str) -> Message {
    numeric(
        host,
        "461",
        vec![target.to_owned(), command.to_owned(), "Not enough parameters".to_owned()],
    )
}

/// 473 — ERR_INVITEONLYCHAN.
pub fn error_invite_only_channel(host: &str, target: &str, channel: &str) -> Message {
    numeric(host, "473", vec![target.to_owned(), format!("{channel} :Cannot join channel (+i)")])
}

/// 474 — ERR_BANNEDFROMCHAN.
pub fn error_banned_from_channel(host: &str, target: &str, channel: &str) -> Message {
    numeric(host, "474", vec![target.to_owned(), format!("{channel} :Cannot join channel (+b)")])
}

/// 475 — ERR_BADCHANNELKEY.
pub fn error_bad_channel_key(host: &str, target: &str, channel: &str) -> Message {
    numeric(host, "475", vec![target.to_owned(), format!("{channel} :Cannot join channel (+k)")])
}

/// 482 — ERR_CHANOPRIVSNEEDED.
pub fn error_channel_operator_needed(host: &str, target: &str, channel: &str) -> Message {
    numeric(host, "482", vec![target.to_owned(), format!("{channel} You're not channel operator")])
}

/// 502 — ERR_USERSDONTMATCH.
pub fn error_users_dont_match(host: &str, target: &str) -> Message {
    numeric(host, "502", vec![target.to_owned(), "Cant change mode for other users".to_owned()])
}

// ---------------------------------------------------------------- MOTD

/// 422 — ERR_NOMOTD.
pub fn reply_no_motd(host: &str, target: &str) -> Message {
    numeric(host, "422", vec![target.to_owned(), "no message of the day".to_owned()])
}

/// 375 — RPL_MOTDSTART.
pub fn reply_start_motd(host: &str, target: &str) -> Message {
    numeric(host, "375", vec![target.to_owned(), "- message of the day -".to_owned()])
}

/// 376 — RPL_ENDOFMOTD.
pub fn reply_end_motd(host: &str, target: &str) -> Message {
    numeric(host, "376", vec![target.to_owned(), "- end of message -".to_owned()])
}

/// 372 — RPL_MOTD.
pub fn reply_motd(host: &str, target: &str, line: &str) -> Message {
    numeric(host, "372", vec![target.to_owned(), line.to_owned()])
}

// ---------------------------------------------------------------- WHOIS / ISON
//
// Not present in `original_source`; supplemented per SPEC_FULL.md §4.6,
// grounded in the teacher's own `handlers::user_query` module, which treats
// these as read-only queries alongside NAMES/LIST.

/// 311 — RPL_WHOISUSER.
pub fn reply_whois_user(host: &str, target: &str, nickname: &str, user: &str, hostname: &str, realname: &str) -> Message {
    numeric(
        host,
        "311",
        vec![
            target.to_owned(),
            nickname.to_owned(),
            user.to_owned(),
            hostname.to_owned(),
            "*".to_owned(),
            realname.to_owned(),
        ],
    )
}

/// 312 — RPL_WHOISSERVER.
pub fn reply_whois_server(host: &str, target: &str, nickname: &str, server_name: &str, server_info: &str) -> Message {
    numeric(
        host,
        "312",
        vec![target.to_owned(), nickname.to_owned(), server_name.to_owned(), server_info.to_owned()],
    )
}

/// 317 — RPL_WHOISIDLE.
pub fn reply_whois_idle(host: &str, target: &str, nickname: &str, idle_seconds: u64, signon_unix: i64) -> Message {
    numeric(
        host,
        "317",
        vec![
            target.to_owned(),
            nickname.to_owned(),
            idle_seconds.to_string(),
            signon_unix.to_string(),
            "seconds idle, signon time".to_owned(),
        ],
    )
}

/// 318 — RPL_ENDOFWHOIS.
pub fn reply_end_whois(host: &str, target: &str, nickname: &str) -> Message {
    numeric(host, "318", vec![target.to_owned(), nickname.to_owned(), "End of /WHOIS list.".to_owned()])
}

/// 319 — RPL_WHOISCHANNELS.
pub fn reply_whois_channels(host: &str, target: &str, nickname: &str, channels: &[String]) -> Message {
    numeric(host, "319", vec![target.to_owned(), nickname.to_owned(), channels.join(" ")])
}

/// 303 — RPL_ISON.
pub fn reply_ison(host: &str, target: &str, online: &[String]) -> Message {
    numeric(host, "303", vec![target.to_owned(), online.join(" ")])
}

// ---------------------------------------------------------------- CAP / SASL

/// 410 — ERR_INVALIDCAPCMD.
pub fn error_invalid_cap_subcommand(host: &str, nickname: &str, subcommand: &str) -> Message {
    numeric(
        host,
        "410",
        vec![or_star(nickname), subcommand.to_owned(), "Invalid capability command".to_owned()],
    )
}

/// `CAP * LS :<capabilities>`.
pub fn reply_list_capabilities(host: &str, nickname: &str, capabilities: &str) -> Message {
    let list = if capabilities.is_empty() { " ".to_owned() } else { capabilities.to_owned() };
    Message::new("CAP", vec![or_star(nickname), "LS".to_owned(), list]).with_prefix(server(host))
}

/// `CAP <nick> ACK :<capabilities>`.
pub fn reply_ack_capabilities(host: &str, nickname: &str, capabilities: &str) -> Message {
    Message::new("CAP", vec![or_star(nickname), "ACK".to_owned(), capabilities.to_owned()]).with_prefix(server(host))
}

/// `CAP <nick> NAK :<capabilities>`.
pub fn reply_nak_capabilities(host: &str, nickname: &str, capabilities: &str) -> Message {
    Message::new("CAP", vec![or_star(nickname), "NAK".to_owned(), capabilities.to_owned()]).with_prefix(server(host))
}

/// `AUTHENTICATE +` — the SASL continuation prompt.
///
/// `original_source`'s `sasl_continue` crams the literal string
/// `"AUTHENTICATE +"` into the command field, exploiting the fact that its
/// formatter never validates the command token; this crate's `Message`
/// treats `command` as a single real token, so the `+` is represented as the
/// (colon-prefixed) sole argument instead. The on-the-wire distinction isn't
/// load-bearing — spec.md §4.7 only names the semantic reply.
pub fn sasl_continue(host: &str) -> Message {
    Message::new("AUTHENTICATE", vec!["+".to_owned()]).with_prefix(server(host))
}

/// 908 — ERR_SASLMECHS.
pub fn error_sasl_mechanism(host: &str, nickname: &str) -> Message {
    numeric(host, "908", vec![or_star(nickname), "PLAIN".to_owned(), "are available sasl mechanisms".to_owned()])
}

/// 900 — RPL_LOGGEDIN.
pub fn sasl_logged_in(host: &str, nickname: &str) -> Message {
    numeric(host, "900", vec![or_star(nickname), "you are now logged in".to_owned()])
}

/// 903 — RPL_SASLSUCCESS.
pub fn sasl_success(host: &str, nickname: &str) -> Message {
    numeric(host, "903", vec![or_star(nickname), "SASL authentication successful".to_owned()])
}

/// 904 — ERR_SASLFAIL.
pub fn error_sasl_fail(host: &str, nickname: &str) -> Message {
    numeric(host, "904", vec![or_star(nickname), "SASL authentication failed".to_owned()])
}

// ---------------------------------------------------------------- identity-prefixed commands

/// `PONG <server>`.
pub fn reply_pong(host: &str, token: &str) -> Message {
    Message::new("PONG", vec![token.to_owned()]).with_prefix(server(host))
}

/// `:ident NICK :new`.
pub fn nick(prefix: Prefix, new_nickname: &str) -> Message {
    Message::new("NICK", vec![new_nickname.to_owned()]).with_prefix(prefix)
}

/// `:ident JOIN :#chan`.
pub fn join(prefix: Prefix, channel: &str) -> Message {
    Message::new("JOIN", vec![channel.to_owned()]).with_prefix(prefix)
}

/// `:ident PART #chan [:message]`.
pub fn part(prefix: Prefix, channel: &str, message: Option<&str>) -> Message {
    let mut args = vec![channel.to_owned()];
    if let Some(m) = message.filter(|m| !m.is_empty()) {
        args.push(m.to_owned());
    }
    Message::new("PART", args).with_prefix(prefix)
}

/// `:ident PRIVMSG target :text`, with client tags forwarded verbatim.
pub fn private_message(prefix: Prefix, target: &str, text: &str, client_tags: Vec<Tag>) -> Message {
    Message::new("PRIVMSG", vec![target.to_owned(), text.to_owned()])
        .with_prefix(prefix)
        .with_tags(client_tags)
}

/// `:ident NOTICE target :text`, with client tags forwarded verbatim.
pub fn notice(prefix: Prefix, target: &str, text: &str, client_tags: Vec<Tag>) -> Message {
    Message::new("NOTICE", vec![target.to_owned(), text.to_owned()])
        .with_prefix(prefix)
        .with_tags(client_tags)
}

/// `:ident TAGMSG target`, carrying only client tags.
pub fn tag_message(prefix: Prefix, target: &str, client_tags: Vec<Tag>) -> Message {
    Message::new("TAGMSG", vec![target.to_owned()]).with_prefix(prefix).with_tags(client_tags)
}

/// `PING :host`.
pub fn ping(host: &str) -> Message {
    Message::new("PING", vec![host.to_owned()]).with_prefix(server(host))
}

/// `:host PONG host :token`, replying to a client-initiated PING.
pub fn pong(host: &str, token: &str) -> Message {
    Message::new("PONG", vec![host.to_owned(), token.to_owned()]).with_prefix(server(host))
}

/// `:ident MODE target flags [param]`.
pub fn mode(prefix: Prefix, target: &str, flags: &str, param: Option<&str>) -> Message {
    let mut args = vec![target.to_owned(), flags.to_owned()];
    if let Some(p) = param.filter(|p| !p.is_empty()) {
        args.push(p.to_owned());
    }
    Message::new("MODE", args).with_prefix(prefix)
}

/// `:ident QUIT :message`.
pub fn quit(prefix: Prefix, message: &str) -> Message {
    Message::new("QUIT", vec![message.to_owned()]).with_prefix(prefix)
}

/// `:ident INVITE nickname channel`.
pub fn invite(prefix: Prefix, nickname: &str, channel: &str) -> Message {
    Message::new("INVITE", vec![nickname.to_owned(), channel.to_owned()]).with_prefix(prefix)
}

/// `:ident KICK channel nickname [:comment]`.
pub fn kick(prefix: Prefix, channel: &str, nickname: &str, comment: Option<&str>) -> Message {
    let mut args = vec![channel.to_owned(), nickname.to_owned()];
    if let Some(c) = comment.filter(|c| !c.is_empty()) {
        args.push(c.to_owned());
    }
    Message::new("KICK", args).with_prefix(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welcome_matches_worked_example() {
        let msg = reply_welcome("localhost", "foo", "foo", "foo", "localhost");
        assert_eq!(
            msg.to_string(),
            ":localhost 001 foo :Welcome to the Internet Relay Network foo!foo@localhost"
        );
    }

    #[test]
    fn notopic_and_names_match_worked_example() {
        assert_eq!(reply_notopic("localhost", "foo", "#").to_string(), ":localhost 331 foo :#");
        let names = reply_names("localhost", "foo", "#", &["foo".to_owned()]);
        assert_eq!(names.to_string(), ":localhost 353 foo = # :foo");
        assert_eq!(
            reply_endnames("localhost", "foo", "#").to_string(),
            ":localhost 366 foo # :End of /NAMES list."
        );
    }

    #[test]
    fn bad_channel_key_has_embedded_colon() {
        let msg = error_bad_channel_key("localhost", "bar", "#");
        assert_eq!(msg.to_string(), ":localhost 475 bar :# :Cannot join channel (+k)");
    }

    #[test]
    fn channel_operator_needed_has_no_embedded_colon() {
        let msg = error_channel_operator_needed("localhost", "bar", "#");
        assert_eq!(msg.to_string(), ":localhost 482 bar :# You're not channel operator");
    }

    #[test]
    fn nick_in_use_carries_no_reason_text() {
        let msg = error_nick_in_use("localhost", "foo", "bar");
        assert_eq!(msg.to_string(), ":localhost 433 foo bar");
    }

    #[test]
    fn sasl_continue_is_bare_plus() {
        assert_eq!(sasl_continue("localhost").to_string(), ":localhost AUTHENTICATE :+");
    }

    #[test]
    fn mode_reply_omits_missing_param() {
        let msg = mode(Prefix::parse("foo!foo@localhost"), "#", "+n", None);
        assert_eq!(msg.to_string(), ":foo!foo@localhost MODE # +n");
    }

    #[test]
    fn pong_echoes_token() {
        assert_eq!(pong("localhost", "abc").to_string(), ":localhost PONG localhost :abc");
    }
}
