//! Type definitions for the pqchat session protocol

use std::fmt;

/// Protocol identifier the transport layer negotiates before handing over a stream
pub const PROTOCOL_ID: &str = "/pqchat/1.0.0";

/// HKDF info label; both roles hard-code it, it is never negotiated
pub const HANDSHAKE_LABEL: &[u8] = b"pqchat-handshake";

/// Which side of the handshake this peer plays
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Accepted the stream; generates the ephemeral KEM keypair
    Server,
    /// Opened the stream; encapsulates to the server's public key
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Server => "server",
            Role::Client => "client",
        }
    }
}

/// Handshake progress. Transient: discarded once `Established` or `Failed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandshakeState {
    Init,
    /// Server has sent its public key and waits for the ciphertext
    KeySent,
    /// Client waits for the server public key
    AwaitingPub,
    /// Shared secret known on this side, session key not yet derived
    KeyMaterialExchanged,
    Established,
    Failed,
}

impl HandshakeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, HandshakeState::Established | HandshakeState::Failed)
    }
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandshakeState::Init => "Init",
            HandshakeState::KeySent => "KeySent",
            HandshakeState::AwaitingPub => "AwaitingPub",
            HandshakeState::KeyMaterialExchanged => "KeyMaterialExchanged",
            HandshakeState::Established => "Established",
            HandshakeState::Failed => "Failed",
        };
        f.write_str(name)
    }
}
