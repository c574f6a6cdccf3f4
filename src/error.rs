//! The handler-boundary error type (spec.md §7, SPEC_FULL.md §7).

use ircd_proto::Message;
use thiserror::Error;

/// An error raised by a core operation or a command handler.
///
/// `ProtocolError` and `SessionError` are the two client-visible-or-fatal
/// categories spec.md §7 names; `Internal` is the catch-all for a handler
/// bug that should be logged but must not take the session down, mirroring
/// the teacher's `HandlerError::Internal` / `anyhow::Error` boundary use.
#[derive(Debug, Error)]
pub enum IrcError {
    /// A pre-built numeric or command reply to enqueue to the offending
    /// client, e.g. 403/441/482. Recoverable: the connection stays open.
    #[error("protocol error: {0}")]
    ProtocolError(Message),

    /// The session must be dropped; the string becomes the QUIT reason
    /// broadcast to the nickname's channels.
    #[error("session error: {0}")]
    SessionError(String),

    /// An unexpected failure inside a handler. Logged at `error` level;
    /// the session is left open and no reply is sent to the client.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IrcError {
    /// Build a `ProtocolError` from a reply message, for call sites that
    /// read a little more naturally than a bare tuple variant.
    pub fn protocol(reply: Message) -> Self {
        IrcError::ProtocolError(reply)
    }

    /// Build a `SessionError` from anything `Display`-able.
    pub fn session(reason: impl Into<String>) -> Self {
        IrcError::SessionError(reason.into())
    }
}

/// Result type for core operations and command handlers.
pub type IrcResult<T> = Result<T, IrcError>;
