//! Network-facing transports (spec.md §5, §6.2).
//!
//! `codec` frames the byte stream into IRC lines; `connection` and
//! `websocket` drive the per-connection reader/writer tasks spec.md §5
//! names; `gateway` owns the accept loops. None of these modules touch
//! [`crate::core::Irc`]'s maps directly — they only ever enqueue onto
//! the shared inbound queue ([`crate::core::CoreEvent`]).

pub mod codec;
pub mod connection;
pub mod gateway;
pub mod websocket;
