//! Peer-link bookkeeping (spec.md §4.8's "forwarding to peer links").
//!
//! Grounded in `original_source/ircd/irc.py`'s `self.links` list and
//! `add_link`/`process`: a link is just another session that receives a
//! best-effort mirror of every message processed locally, with no
//! acknowledgement or state reconciliation (spec.md §9's resolved open
//! question — see `DESIGN.md`).

use std::collections::HashSet;

use crate::state::SessionId;

/// The set of sessions registered as peer links.
#[derive(Debug, Default)]
pub struct Links(HashSet<SessionId>);

impl Links {
    /// Register a session as a link, if not already registered.
    pub fn add(&mut self, session_id: SessionId) -> bool {
        self.0.insert(session_id)
    }

    /// Remove a session, e.g. on disconnect.
    pub fn remove(&mut self, session_id: SessionId) {
        self.0.remove(&session_id);
    }

    /// Whether `session_id` is a registered link.
    pub fn contains(&self, session_id: SessionId) -> bool {
        self.0.contains(&session_id)
    }

    /// Number of registered links, for LUSER's server count.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate every linked session except `origin`.
    pub fn others(&self, origin: SessionId) -> impl Iterator<Item = SessionId> + '_ {
        self.0.iter().copied().filter(move |id| *id != origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn others_excludes_origin() {
        let mut links = Links::default();
        let a = SessionId::new();
        let b = SessionId::new();
        links.add(a);
        links.add(b);
        let remaining: Vec<_> = links.others(a).collect();
        assert_eq!(remaining, vec![b]);
    }
}
