//! PRIVMSG, NOTICE, TAGMSG (spec.md §4.6).
//!
//! Grounded in `original_source/ircd/commands.py`'s `privmsg`, `notice`,
//! and `tagmsg`: each dispatches on whether its target names a channel
//! or a nickname.

use ircd_proto::{Message, Tag};

use crate::core::Irc;
use crate::error::IrcResult;
use crate::state::SessionId;

fn client_tags(msg: &Message) -> Vec<Tag> {
    msg.client_tags().into_iter().cloned().collect()
}

pub(super) fn privmsg(irc: &mut Irc, session_id: SessionId, msg: &Message) -> IrcResult<()> {
    let target = &msg.args[0];
    let text = &msg.args[1];
    let tags = client_tags(msg);
    if irc.has_channel(target) {
        irc.send_private_message_to_channel(session_id, target, text, tags)
    } else if irc.has_nickname(target) {
        irc.send_private_message_to_client(session_id, target, text, tags)
    } else {
        irc.no_such_target(session_id, target)
    }
}

pub(super) fn notice(irc: &mut Irc, session_id: SessionId, msg: &Message) -> IrcResult<()> {
    let target = &msg.args[0];
    let text = &msg.args[1];
    let tags = client_tags(msg);
    if irc.has_channel(target) {
        irc.send_notice_to_channel(session_id, target, text, tags)
    } else if irc.has_nickname(target) {
        irc.send_notice_to_client(session_id, target, text, tags)
    } else {
        // NOTICE never elicits an error reply, by IRC convention.
        Ok(())
    }
}

pub(super) fn tagmsg(irc: &mut Irc, session_id: SessionId, msg: &Message) -> IrcResult<()> {
    let target = &msg.args[0];
    let tags = client_tags(msg);
    if irc.has_channel(target) {
        irc.send_tag_message_to_channel(session_id, target, tags)
    } else if irc.has_nickname(target) {
        irc.send_tag_message_to_client(session_id, target, tags)
    } else {
        irc.no_such_target(session_id, target)
    }
}
