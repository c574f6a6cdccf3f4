//! MOTD, AWAY, WHOIS, ISON (spec.md §4.6; WHOIS/ISON are SPEC_FULL.md's
//! supplement, absent from `original_source`).

use ircd_proto::Message;

use crate::core::Irc;
use crate::error::IrcResult;
use crate::state::SessionId;

pub(super) fn motd(irc: &mut Irc, session_id: SessionId, _msg: &Message) -> IrcResult<()> {
    irc.send_motd(session_id);
    Ok(())
}

pub(super) fn away(irc: &mut Irc, session_id: SessionId, msg: &Message) -> IrcResult<()> {
    irc.set_away(session_id, msg.args.first().map(String::as_str))
}

pub(super) fn whois(irc: &mut Irc, session_id: SessionId, msg: &Message) -> IrcResult<()> {
    irc.whois(session_id, &msg.args[0])
}

pub(super) fn ison(irc: &mut Irc, session_id: SessionId, msg: &Message) -> IrcResult<()> {
    let requested: Vec<String> = msg.args[0].split_whitespace().map(str::to_owned).collect();
    irc.ison(session_id, &requested)
}
