//! IRCv3 capability negotiation and SASL `AUTHENTICATE` (spec.md §4.7).
//!
//! Grounded in `original_source/ircd/commands.py`'s `cap` and
//! `authenticate` functions; the SASL PLAIN mechanism check and base64
//! decoding live in `ircd_proto::sasl` and `core::Irc::handle_sasl_response`.

use ircd_proto::Message;

use crate::core::Irc;
use crate::error::IrcResult;
use crate::state::session::SaslState;
use crate::state::SessionId;

pub(super) fn cap(irc: &mut Irc, session_id: SessionId, msg: &Message) -> IrcResult<()> {
    match msg.args[0].to_ascii_uppercase().as_str() {
        "LS" | "LIST" => {
            irc.begin_cap_negotiation(session_id);
            irc.send_capabilities(session_id);
        }
        "REQ" => {
            irc.begin_cap_negotiation(session_id);
            let requested = msg.args.get(1).map(String::as_str).unwrap_or("");
            irc.request_capabilities(session_id, requested);
        }
        "END" => return irc.end_cap_negotiation(session_id),
        other => irc.reject_cap_subcommand(session_id, other),
    }
    Ok(())
}

pub(super) fn authenticate(irc: &mut Irc, session_id: SessionId, msg: &Message) -> IrcResult<()> {
    let payload = &msg.args[0];
    let state = irc.session(session_id).map(|s| s.sasl.clone()).unwrap_or_default();
    match state {
        SaslState::Idle => irc.begin_sasl(session_id, payload),
        SaslState::AwaitingResponse | SaslState::Authenticated { .. } => {
            irc.handle_sasl_response(session_id, payload);
            Ok(())
        }
    }
}
