//! NICK, USER, SERVER, QUIT, PING, PONG (spec.md §4.5, §4.6).
//!
//! Grounded in `original_source/ircd/commands.py`'s `nick`, `user`,
//! `server`, `quit`, `ping`, and `pong` functions.

use ircd_proto::Message;

use crate::core::Irc;
use crate::error::IrcResult;
use crate::state::SessionId;

pub(super) fn nick(irc: &mut Irc, session_id: SessionId, msg: &Message) -> IrcResult<()> {
    irc.set_nick(session_id, &msg.args[0])
}

pub(super) fn user(irc: &mut Irc, session_id: SessionId, msg: &Message) -> IrcResult<()> {
    irc.set_ident(session_id, &msg.args[0], &msg.args[3])
}

pub(super) fn server(irc: &mut Irc, session_id: SessionId, _msg: &Message) -> IrcResult<()> {
    irc.add_link(session_id);
    Ok(())
}

pub(super) fn quit(irc: &mut Irc, session_id: SessionId, msg: &Message) -> IrcResult<()> {
    let reason = msg.args.first().map(String::as_str).unwrap_or("client quit");
    irc.drop_client(session_id, Some(reason));
    Ok(())
}

pub(super) fn ping(irc: &mut Irc, session_id: SessionId, msg: &Message) -> IrcResult<()> {
    irc.reply_pong(session_id, &msg.args[0]);
    Ok(())
}

pub(super) fn pong(irc: &mut Irc, session_id: SessionId, _msg: &Message) -> IrcResult<()> {
    irc.clear_ping_count(session_id);
    Ok(())
}
