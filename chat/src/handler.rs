//! Dispatch of decrypted application messages

use std::fmt::Debug;
use std::sync::Arc;

use crypto::hashes::fingerprint;

use crate::config::{ChatConfig, HelloPolicy};
use crate::error::{ChatError, Result};
use crate::peer_registry::PeerRegistry;
use crate::protocol::{
    decode_public_key, verify_chat, verify_hello, ChatMessage, HelloMessage, Message,
};

/// A parsed message plus whether it authenticated its sender id
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Incoming {
    Hello { message: HelloMessage, verified: bool },
    Chat { message: ChatMessage, verified: bool },
}

impl Incoming {
    pub fn is_verified(&self) -> bool {
        match self {
            Incoming::Hello { verified, .. } | Incoming::Chat { verified, .. } => *verified,
        }
    }
}

/// Turns session plaintexts into [`Incoming`] values and keeps the
/// [`PeerRegistry`] current.
pub struct MessageHandler<P> {
    config: ChatConfig,
    registry: Arc<PeerRegistry<P>>,
}

impl<P: Clone + Debug> MessageHandler<P> {
    pub fn new(config: ChatConfig, registry: Arc<PeerRegistry<P>>) -> Self {
        Self { config, registry }
    }

    pub fn registry(&self) -> &Arc<PeerRegistry<P>> {
        &self.registry
    }

    /// Handle one plaintext received from `peer`.
    pub fn handle(&self, peer: &P, raw: &[u8]) -> Result<Incoming> {
        match Message::from_json(raw)? {
            Message::Hello(message) => self.on_hello(peer, message),
            Message::Chat(message) => self.on_chat(peer, message),
        }
    }

    fn on_hello(&self, peer: &P, message: HelloMessage) -> Result<Incoming> {
        let signer = signer_key(verify_hello(&message), &message.public_key, &message.user_id);
        let verified = match signer {
            Some(key) if !self.id_matches_key(&message.user_id, &key) => {
                tracing::warn!(user_id = %message.user_id, ?peer, "user id is not the key fingerprint");
                false
            }
            Some(key) => match self.registry.register(message.user_id.clone(), &key, peer.clone()) {
                Ok(previous) => {
                    tracing::debug!(pseudo = %message.pseudo, user_id = %message.user_id, ?peer, "HELLO");
                    if let Some(previous) = previous {
                        tracing::debug!(user_id = %message.user_id, ?previous, "peer re-registered");
                    }
                    true
                }
                Err(e) => {
                    tracing::warn!(?peer, error = %e, "HELLO claims a user id held by another key");
                    false
                }
            },
            None => {
                tracing::warn!(user_id = %message.user_id, ?peer, "HELLO signature did not verify");
                false
            }
        };

        if verified {
            return Ok(Incoming::Hello { message, verified });
        }
        match self.config.hello_policy {
            HelloPolicy::Record => Ok(Incoming::Hello { message, verified }),
            HelloPolicy::Reject => Err(ChatError::HelloRejected {
                user_id: message.user_id,
            }),
        }
    }

    /// A CHAT is verified when its signature checks out and `from` is bound
    /// to the signing key: through a registered HELLO, or, for a sender with
    /// no HELLO on record, by `from` being the key fingerprint.
    fn on_chat(&self, peer: &P, message: ChatMessage) -> Result<Incoming> {
        let registered_key = self.registry.verify_key(&message.from);
        if self.config.require_registered_sender && registered_key.is_none() {
            tracing::warn!(from = %message.from, ?peer, "CHAT from unregistered sender");
            return Err(ChatError::UnregisteredSender(message.from));
        }

        let verified = match signer_key(verify_chat(&message), &message.public_key, &message.from) {
            Some(key) => match registered_key {
                Some(registered) => registered == key,
                None => message.from == fingerprint(&key),
            },
            None => false,
        };
        if !verified {
            tracing::warn!(from = %message.from, ?peer, "CHAT not authenticated");
        }
        Ok(Incoming::Chat { message, verified })
    }

    fn id_matches_key(&self, user_id: &str, key: &[u8]) -> bool {
        !self.config.require_key_fingerprint_ids || user_id == fingerprint(key)
    }
}

/// Signer's key bytes when the signature verifies. Malformed key or
/// signature encodings count as a failed check.
fn signer_key(outcome: Result<bool>, public_key: &str, signer: &str) -> Option<Vec<u8>> {
    let checked = outcome.and_then(|ok| {
        if ok {
            decode_public_key(public_key).map(Some)
        } else {
            Ok(None)
        }
    });
    match checked {
        Ok(key) => key,
        Err(e) => {
            tracing::debug!(signer, error = %e, "undecodable signature material");
            None
        }
    }
}
