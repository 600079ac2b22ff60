//! Error types for the chat layer

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("unknown message type: {0:?}")]
    UnknownMessageType(String),

    /// HELLO did not authenticate its `user_id` and the policy is `Reject`
    #[error("HELLO from {user_id} rejected: not authenticated")]
    HelloRejected { user_id: String },

    #[error("user id {user_id} is already bound to a different key")]
    KeyMismatch { user_id: String },

    #[error("sender {0} has not announced itself with a verified HELLO")]
    UnregisteredSender(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] crypto::CryptoError),

    #[error("session error: {0}")]
    Session(#[from] pq_session::SessionError),
}

pub type Result<T> = std::result::Result<T, ChatError>;
