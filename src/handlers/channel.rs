//! JOIN, PART, MODE, TOPIC, INVITE, KICK, NAMES, LIST (spec.md §4.6).
//!
//! Grounded in `original_source/ircd/commands.py`'s same-named
//! functions. `invite` and `kick` run their channel-operator check here
//! rather than inside `core::Irc::invite`/`core::Irc::kick`, matching
//! the original's placement (see `DESIGN.md`).

use ircd_proto::Message;

use crate::core::Irc;
use crate::error::IrcResult;
use crate::state::SessionId;

pub(super) fn join(irc: &mut Irc, session_id: SessionId, msg: &Message) -> IrcResult<()> {
    let key = msg.args.get(1).map(String::as_str);
    irc.join_channel(session_id, &msg.args[0], key)
}

pub(super) fn part(irc: &mut Irc, session_id: SessionId, msg: &Message) -> IrcResult<()> {
    let message = msg.args.get(1).map(String::as_str);
    irc.part_channel(session_id, &msg.args[0], message)
}

/// `MODE target [flags [param]]`: a channel or a nickname, queried with
/// no flags or set/cleared with them.
pub(super) fn mode(irc: &mut Irc, session_id: SessionId, msg: &Message) -> IrcResult<()> {
    let target = &msg.args[0];
    let flags = msg.args.get(1).map(String::as_str);
    let param = msg.args.get(2).map(String::as_str);

    if irc.has_nickname(target) {
        match flags {
            Some(flags) => irc.set_user_mode(session_id, target, flags),
            None => irc.send_user_mode(session_id, target),
        }
    } else if irc.has_channel(target) {
        match flags {
            Some(flags) => irc.set_channel_mode(session_id, target, flags, param),
            None => irc.send_channel_mode(session_id, target),
        }
    } else {
        Ok(())
    }
}

pub(super) fn topic(irc: &mut Irc, session_id: SessionId, msg: &Message) -> IrcResult<()> {
    let channel_name = &msg.args[0];
    match msg.args.get(1) {
        Some(topic) => irc.set_topic(session_id, channel_name, topic),
        None => irc.send_topic(session_id, channel_name),
    }
}

pub(super) fn invite(irc: &mut Irc, session_id: SessionId, msg: &Message) -> IrcResult<()> {
    let invitee = &msg.args[0];
    let channel_name = &msg.args[1];
    irc.require_known_nickname(session_id, invitee)?;
    irc.require_channel_operator(session_id, channel_name)?;
    irc.invite(session_id, invitee, channel_name)
}

pub(super) fn kick(irc: &mut Irc, session_id: SessionId, msg: &Message) -> IrcResult<()> {
    let channel_name = &msg.args[0];
    let target = &msg.args[1];
    irc.require_channel_operator(session_id, channel_name)?;
    irc.require_known_nickname(session_id, target)?;
    let comment = msg.args.get(2).map(String::as_str);
    irc.kick(session_id, channel_name, target, comment)
}

pub(super) fn names(irc: &mut Irc, session_id: SessionId, msg: &Message) -> IrcResult<()> {
    for channel_name in msg.args[0].split(',') {
        irc.send_names(session_id, channel_name);
    }
    Ok(())
}

pub(super) fn list(irc: &mut Irc, session_id: SessionId, msg: &Message) -> IrcResult<()> {
    let names: Option<Vec<String>> = msg.args.first().map(|s| s.split(',').map(str::to_owned).collect());
    irc.send_list(session_id, names.as_deref());
    Ok(())
}
