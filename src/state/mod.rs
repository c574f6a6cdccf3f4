//! In-memory server state: nicknames, channels, and per-connection
//! sessions (spec.md §3, §4.4, §4.5). Owned exclusively by
//! [`crate::core::Irc`]; nothing outside `core` mutates these types.

pub mod channel;
pub mod nickname;
pub mod session;

pub use channel::Channel;
pub use nickname::Nickname;
pub use session::{Session, SessionId};
