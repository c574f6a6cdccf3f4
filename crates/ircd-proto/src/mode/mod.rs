//! Mode flag registry: the character/flag mapping and argument arity for
//! user and channel modes (spec.md §4.3).

mod types;

pub use types::{ChannelMode, ModeType, UserMode};
