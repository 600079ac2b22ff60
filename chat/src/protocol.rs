//! HELLO and CHAT application messages
//!
//! Both travel as JSON inside an established session, tagged by `type`:
//!
//! ```text
//! {"type":"HELLO","pseudo":..,"user_id":..,"pub":<b64>,"sig":<b64>}
//! {"type":"CHAT","from":..,"to":[..],"body":..,"timestamp":<unix s>,"sig":<b64>,"pub":<b64>}
//! ```
//!
//! `sig` is an ML-DSA-65 signature over the JSON encoding of the same message
//! with `sig` set to the empty string. `pub` is the signer's verification key.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{ChatError, Result};
use crate::identity::Identity;

pub const HELLO_TYPE: &str = "HELLO";
pub const CHAT_TYPE: &str = "CHAT";

/// Identity announcement, sent once right after the session is established
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloMessage {
    pub pseudo: String,
    pub user_id: String,
    #[serde(rename = "pub")]
    pub public_key: String,
    #[serde(rename = "sig")]
    pub signature: String,
}

/// Chat line. `to` is for application routing; the session layer never reads it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub from: String,
    pub to: Vec<String>,
    pub body: String,
    pub timestamp: i64,
    #[serde(rename = "sig")]
    pub signature: String,
    #[serde(rename = "pub")]
    pub public_key: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    #[serde(rename = "HELLO")]
    Hello(HelloMessage),
    #[serde(rename = "CHAT")]
    Chat(ChatMessage),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Hello(_) => HELLO_TYPE,
            Message::Chat(_) => CHAT_TYPE,
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse a decrypted payload. A well-formed object with an unrecognised
    /// `type` is reported as [`ChatError::UnknownMessageType`].
    pub fn from_json(raw: &[u8]) -> Result<Self> {
        let envelope: Envelope = serde_json::from_slice(raw)?;
        match envelope.kind.as_str() {
            HELLO_TYPE | CHAT_TYPE => Ok(serde_json::from_slice(raw)?),
            _ => Err(ChatError::UnknownMessageType(envelope.kind)),
        }
    }

    /// Bytes covered by the signature: this message with `sig` emptied
    fn signing_bytes(&self) -> Result<Vec<u8>> {
        let mut unsigned = self.clone();
        match &mut unsigned {
            Message::Hello(m) => m.signature.clear(),
            Message::Chat(m) => m.signature.clear(),
        }
        unsigned.to_json()
    }

    fn verify_signature(&self, public_key: &str, signature: &str) -> Result<bool> {
        let public_key = decode_public_key(public_key)?;
        let signature = STANDARD.decode(signature)?;
        let signed = self.signing_bytes()?;
        Ok(crypto::ml_dsa::verify(&signed, &signature, &public_key))
    }
}

/// Build a signed HELLO for `identity`.
///
/// Returns the message and its final JSON encoding, ready for
/// `SecureSession::send`.
pub fn build_hello(identity: &Identity) -> Result<(HelloMessage, Vec<u8>)> {
    let mut hello = HelloMessage {
        pseudo: identity.pseudo().to_string(),
        user_id: identity.user_id().to_string(),
        public_key: identity.public_key_b64(),
        signature: String::new(),
    };
    let signed = Message::Hello(hello.clone()).signing_bytes()?;
    hello.signature = STANDARD.encode(identity.sign(&signed));
    let raw = Message::Hello(hello.clone()).to_json()?;
    Ok((hello, raw))
}

/// Build a signed CHAT from `identity` stamped with the current time.
pub fn build_chat(
    identity: &Identity,
    to: Vec<String>,
    body: impl Into<String>,
) -> Result<(ChatMessage, Vec<u8>)> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default();
    build_chat_at(identity, to, body, timestamp)
}

/// [`build_chat`] with an explicit Unix timestamp
pub fn build_chat_at(
    identity: &Identity,
    to: Vec<String>,
    body: impl Into<String>,
    timestamp: i64,
) -> Result<(ChatMessage, Vec<u8>)> {
    let mut chat = ChatMessage {
        from: identity.user_id().to_string(),
        to,
        body: body.into(),
        timestamp,
        signature: String::new(),
        public_key: identity.public_key_b64(),
    };
    let signed = Message::Chat(chat.clone()).signing_bytes()?;
    chat.signature = STANDARD.encode(identity.sign(&signed));
    let raw = Message::Chat(chat.clone()).to_json()?;
    Ok((chat, raw))
}

/// Raw verification key bytes from a `pub` field
pub fn decode_public_key(public_key: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(public_key)?)
}

/// Check a HELLO's signature against the key it carries.
///
/// This proves possession of `pub` only. Whether `user_id` belongs to that
/// key is decided by [`crate::MessageHandler`].
///
/// `Ok(false)` for a signature that does not verify; `Err` when `pub` or
/// `sig` is not valid base64.
pub fn verify_hello(message: &HelloMessage) -> Result<bool> {
    Message::Hello(message.clone()).verify_signature(&message.public_key, &message.signature)
}

/// Check a CHAT's signature against the key it carries. As with
/// [`verify_hello`], `from` is not checked here.
pub fn verify_chat(message: &ChatMessage) -> Result<bool> {
    Message::Chat(message.clone()).verify_signature(&message.public_key, &message.signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Identity {
        Identity::from_seed("alice", b"protocol-test-alice")
    }

    #[test]
    fn hello_wire_shape() {
        let (hello, raw) = build_hello(&alice()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(value["type"], "HELLO");
        assert_eq!(value["pseudo"], "alice");
        assert_eq!(value["user_id"], hello.user_id.as_str());
        assert!(value["pub"].as_str().unwrap().len() > 2000);
        assert!(!value["sig"].as_str().unwrap().is_empty());

        // Field order is part of what gets signed.
        let text = String::from_utf8(raw).unwrap();
        let positions: Vec<usize> = ["\"type\"", "\"pseudo\"", "\"user_id\"", "\"pub\"", "\"sig\""]
            .iter()
            .map(|key| text.find(key).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn hello_verifies_and_detects_tampering() {
        let (hello, _) = build_hello(&alice()).unwrap();
        assert!(verify_hello(&hello).unwrap());

        let mut renamed = hello.clone();
        renamed.pseudo = "mallory".into();
        assert!(!verify_hello(&renamed).unwrap());

        let other = Identity::from_seed("mallory", b"protocol-test-mallory");
        let mut swapped_key = hello;
        swapped_key.public_key = other.public_key_b64();
        assert!(!verify_hello(&swapped_key).unwrap());
    }

    #[test]
    fn bad_base64_is_an_error() {
        let (mut hello, _) = build_hello(&alice()).unwrap();
        hello.signature = "not base64!".into();
        assert!(matches!(verify_hello(&hello), Err(ChatError::Base64(_))));
    }

    #[test]
    fn chat_round_trip_and_verify() {
        let (chat, raw) =
            build_chat_at(&alice(), vec!["bob".into()], "hi bob", 1_700_000_000).unwrap();
        assert_eq!(chat.from, alice().user_id());
        assert!(verify_chat(&chat).unwrap());

        match Message::from_json(&raw).unwrap() {
            Message::Chat(parsed) => assert_eq!(parsed, chat),
            other => panic!("expected CHAT, got {}", other.kind()),
        }

        let mut edited = chat;
        edited.body = "hi eve".into();
        assert!(!verify_chat(&edited).unwrap());
    }

    #[test]
    fn build_chat_uses_current_time() {
        let (chat, _) = build_chat(&alice(), vec![], "now").unwrap();
        assert!(chat.timestamp > 1_600_000_000);
    }

    proptest::proptest! {
        #![proptest_config(proptest::prelude::ProptestConfig::with_cases(16))]

        #[test]
        fn any_chat_body_signs_and_parses(body in ".{0,200}", to in proptest::collection::vec("[a-z0-9]{1,16}", 0..4)) {
            let (chat, raw) = build_chat_at(&alice(), to, body, 42).unwrap();
            proptest::prop_assert!(verify_chat(&chat).unwrap());
            proptest::prop_assert_eq!(Message::from_json(&raw).unwrap(), Message::Chat(chat));
        }
    }

    #[test]
    fn unknown_type_is_reported() {
        let err = Message::from_json(br#"{"type":"PING","seq":1}"#).unwrap_err();
        assert!(matches!(err, ChatError::UnknownMessageType(kind) if kind == "PING"));

        assert!(matches!(
            Message::from_json(b"not json"),
            Err(ChatError::Json(_))
        ));
    }
}
