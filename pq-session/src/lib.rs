//! Post-quantum session establishment for pqchat
//!
//! A connection is upgraded in two frames: the server sends an ephemeral
//! ML-KEM-768 public key, the client answers with an encapsulation. Both sides
//! derive an AES-256-GCM key from the shared secret with HKDF-SHA256, and all
//! further traffic is one AEAD payload per frame.
//!
//! # Protocol Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   pqchat session upgrade                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  1. S -> C  Frame{ ML-KEM-768 pk }   │  1184 bytes          │
//! │  2. C -> S  Frame{ ML-KEM-768 ct }   │  1088 bytes          │
//! │  3. key  = HKDF-SHA256(ss, "pqchat-handshake")              │
//! │  4. Frame{ nonce(12) || AES-256-GCM(key, msg) || tag(16) }  │
//! └─────────────────────────────────────────────────────────────┘
//!
//! Frame := LENGTH(u16 big-endian) PAYLOAD(LENGTH bytes)
//! ```
//!
//! The handshake does not authenticate either side. Callers that need peer
//! identity exchange signed messages over the established session.
//!
//! # Example
//!
//! ```rust,ignore
//! use pq_session::{PqTransport, SessionConfig};
//!
//! let transport = PqTransport::new(SessionConfig::new());
//! let mut session = transport.upgrade_outbound(tcp_stream).await?;
//! session.send(b"Hello, quantum world!").await?;
//! ```

pub mod cipher;
pub mod config;
pub mod error;
pub mod frame;
pub mod handshake;
pub mod session;
pub mod transport;
pub mod types;

pub use cipher::SessionCipher;
pub use config::{SessionConfig, SessionConfigBuilder};
pub use error::{ErrorCategory, FrameError, HandshakeError, SessionError};
pub use frame::{read_frame, write_frame, FrameCodec, MAX_FRAME_LEN};
pub use handshake::{client_handshake, server_handshake, ClientHandshake, ServerHandshake};
pub use session::{SecureSession, Session, SessionReceiver, SessionSender};
pub use transport::PqTransport;
pub use types::{HandshakeState, Role, HANDSHAKE_LABEL, PROTOCOL_ID};
