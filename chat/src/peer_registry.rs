//! user_id -> transport peer mapping
//!
//! Populated from verified HELLOs and consulted when routing CHAT recipients.
//! Each user id is bound to the ML-DSA key that first registered it; a later
//! registration under a different key is refused. Created by the application
//! and shared by `Arc`; there is no global map.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::{ChatError, Result};

#[derive(Debug)]
struct Entry<P> {
    peer: P,
    verify_key: Vec<u8>,
}

#[derive(Debug)]
pub struct PeerRegistry<P> {
    peers: Mutex<HashMap<String, Entry<P>>>,
}

impl<P> Default for PeerRegistry<P> {
    fn default() -> Self {
        Self {
            peers: Mutex::new(HashMap::new()),
        }
    }
}

impl<P: Clone> PeerRegistry<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `user_id` to `peer` under `verify_key`, returning the previous
    /// peer if the user reconnected from somewhere else.
    ///
    /// Fails with [`ChatError::KeyMismatch`] when `user_id` is already bound
    /// to a different key; the existing entry is left untouched.
    pub fn register(
        &self,
        user_id: impl Into<String>,
        verify_key: &[u8],
        peer: P,
    ) -> Result<Option<P>> {
        let user_id = user_id.into();
        let mut peers = self.peers.lock();
        if let Some(existing) = peers.get(&user_id) {
            if existing.verify_key != verify_key {
                return Err(ChatError::KeyMismatch { user_id });
            }
        }
        let previous = peers.insert(
            user_id,
            Entry {
                peer,
                verify_key: verify_key.to_vec(),
            },
        );
        Ok(previous.map(|entry| entry.peer))
    }

    pub fn lookup(&self, user_id: &str) -> Option<P> {
        self.peers.lock().get(user_id).map(|entry| entry.peer.clone())
    }

    /// Key `user_id` was registered with
    pub fn verify_key(&self, user_id: &str) -> Option<Vec<u8>> {
        self.peers
            .lock()
            .get(user_id)
            .map(|entry| entry.verify_key.clone())
    }

    /// Drop the entry and its key binding.
    pub fn remove(&self, user_id: &str) -> Option<P> {
        self.peers.lock().remove(user_id).map(|entry| entry.peer)
    }

    /// Snapshot of every registered peer, in no particular order
    pub fn all_peers(&self) -> Vec<P> {
        self.peers
            .lock()
            .values()
            .map(|entry| entry.peer.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.peers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.lock().is_empty()
    }

    /// Split CHAT recipients into known peers and unknown user ids.
    /// An empty `to` list means everyone.
    pub fn resolve_recipients(&self, to: &[String]) -> (Vec<P>, Vec<String>) {
        let peers = self.peers.lock();
        if to.is_empty() {
            return (peers.values().map(|entry| entry.peer.clone()).collect(), Vec::new());
        }

        let mut resolved = Vec::with_capacity(to.len());
        let mut unknown = Vec::new();
        for user_id in to {
            match peers.get(user_id) {
                Some(entry) => resolved.push(entry.peer.clone()),
                None => unknown.push(user_id.clone()),
            }
        }
        (resolved, unknown)
    }
}
