//! Error types for the wire protocol.

use thiserror::Error;

/// Convenience alias for results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Top-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// Failed to parse a line into a [`crate::Message`].
    #[error("invalid message: {string}")]
    InvalidMessage {
        /// The offending line.
        string: String,
        /// The underlying parse failure.
        #[source]
        cause: MessageParseError,
    },

    /// Message exceeded the configured maximum line length.
    #[error("message too long: {actual} bytes (limit: {limit})")]
    MessageTooLong {
        /// Actual length in bytes.
        actual: usize,
        /// Configured limit.
        limit: usize,
    },

    /// I/O error while reading or writing the wire.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors encountered parsing an individual line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageParseError {
    /// The line was empty.
    #[error("empty message")]
    EmptyMessage,

    /// No command token was found after the optional tags and prefix.
    #[error("missing command")]
    MissingCommand,

    /// A tag, prefix, or trailing argument was not terminated as expected.
    #[error("malformed message at byte {position}")]
    Malformed {
        /// Byte offset where parsing gave up.
        position: usize,
    },
}

/// Errors encountered parsing a mode string such as `+o-b`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModeParseError {
    /// A mode string did not begin with `+` or `-`.
    #[error("missing mode modifier")]
    MissingModeModifier,

    /// A flag that requires a parameter (e.g. `k`, `o`, `b`, `e`) was given
    /// none and none remained in the argument list.
    #[error("missing parameter for mode '{flag}'")]
    MissingModeParam {
        /// The flag character that required a parameter.
        flag: char,
    },
}
