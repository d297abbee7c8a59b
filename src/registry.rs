//! Registry of active sessions
//!
//! Owned by the relay actor, so every add/remove/snapshot is already
//! serialized; the type itself needs no locking.

use std::collections::HashMap;

use crate::peer::Peer;
use crate::types::SessionId;

/// Active sessions keyed by identity, remembered in join order
#[derive(Debug, Default)]
pub struct Registry {
    peers: HashMap<SessionId, Peer>,
    /// Join order; always holds exactly the keys of `peers`
    order: Vec<SessionId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a peer. Returns false (and drops `peer`) if its id is already present.
    ///
    /// Usernames are not checked for uniqueness.
    pub fn add(&mut self, peer: Peer) -> bool {
        if self.peers.contains_key(&peer.id) {
            return false;
        }
        self.order.push(peer.id);
        self.peers.insert(peer.id, peer);
        true
    }

    /// Remove by identity; `None` if it was not registered
    pub fn remove(&mut self, id: SessionId) -> Option<Peer> {
        let peer = self.peers.remove(&id)?;
        self.order.retain(|other| *other != id);
        Some(peer)
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.peers.contains_key(&id)
    }

    /// Registered peers in join order
    pub fn snapshot(&self) -> Vec<&Peer> {
        self.order
            .iter()
            .filter_map(|id| self.peers.get(id))
            .collect()
    }

    /// Roster in join order, one entry per registered peer
    pub fn usernames(&self) -> Vec<&str> {
        self.snapshot()
            .into_iter()
            .map(Peer::display_name)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
