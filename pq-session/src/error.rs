//! Error types for the pqchat session layer

use std::io;

use thiserror::Error;

use crate::types::HandshakeState;

/// Errors raised by the length-prefixed framing layer
#[derive(Debug, Error)]
pub enum FrameError {
    /// Payload cannot be represented by a u16 length prefix
    #[error("frame too large: {len} bytes (max {})", crate::frame::MAX_FRAME_LEN)]
    FrameTooLarge { len: usize },

    /// Stream ended before a complete length prefix or payload arrived
    #[error("stream closed")]
    StreamClosed,

    /// Any other I/O failure (reset, broken pipe, ...)
    #[error("io error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for FrameError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => FrameError::StreamClosed,
            _ => FrameError::Io(e),
        }
    }
}

/// Protocol violations during the two-frame handshake
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// A frame arrived that cannot be the message expected at this step
    #[error("unexpected frame: expected {expected} ({expected_len} bytes), got {got_len} bytes")]
    UnexpectedFrame {
        expected: &'static str,
        expected_len: usize,
        got_len: usize,
    },

    /// Step invoked out of order
    #[error("invalid handshake state: {operation} not allowed in {state}")]
    InvalidState {
        state: HandshakeState,
        operation: &'static str,
    },
}

/// Top-level error for handshake and session operations
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("crypto error: {0}")]
    Crypto(#[from] crypto::CryptoError),

    #[error("handshake error: {0}")]
    Handshake(HandshakeError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Raised only by the optional timeout wrapper in [`crate::transport`]
    #[error("operation timed out")]
    Timeout,
}

impl From<HandshakeError> for SessionError {
    fn from(e: HandshakeError) -> Self {
        SessionError::Handshake(e)
    }
}

impl From<std::io::Error> for SessionError {
    fn from(e: std::io::Error) -> Self {
        SessionError::Frame(e.into())
    }
}

/// Coarse classification callers use to decide how to react to a failure.
/// Every category is terminal for the stream it occurred on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    Transport,
    Framing,
    Cryptographic,
    Protocol,
}

impl SessionError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SessionError::Frame(FrameError::FrameTooLarge { .. }) => ErrorCategory::Framing,
            SessionError::Frame(_) | SessionError::Timeout => ErrorCategory::Transport,
            SessionError::Crypto(_) => ErrorCategory::Cryptographic,
            SessionError::Handshake(_) | SessionError::Serialization(_) => ErrorCategory::Protocol,
        }
    }

    /// True for AEAD tag failures, which indicate tampering or a key mismatch
    /// rather than a transient fault.
    pub fn is_security_event(&self) -> bool {
        matches!(
            self,
            SessionError::Crypto(crypto::CryptoError::AuthenticationFailed)
        )
    }
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;
