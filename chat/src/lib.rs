//! pqchat application layer
//!
//! Runs on top of a [`pq_session::SecureSession`]. Right after the session is
//! up each side sends a signed HELLO binding its display name and user id to
//! an ML-DSA-65 key. CHAT messages are signed the same way. Received messages
//! go through [`MessageHandler`], which checks signatures, applies the
//! configured [`HelloPolicy`] and keeps the [`PeerRegistry`] current.
//!
//! ```rust,ignore
//! let mut session = PqTransport::new(SessionConfig::new())
//!     .upgrade_outbound(stream)
//!     .await?;
//! send_hello(&mut session, &identity).await?;
//! send_chat(&mut session, &identity, vec![bob_id], "hello").await?;
//! ```

pub mod config;
pub mod error;
pub mod exchange;
pub mod handler;
pub mod identity;
pub mod peer_registry;
pub mod protocol;

pub use config::{ChatConfig, HelloPolicy};
pub use error::ChatError;
pub use exchange::{recv_incoming, send_chat, send_hello};
pub use handler::{Incoming, MessageHandler};
pub use identity::Identity;
pub use peer_registry::PeerRegistry;
pub use pq_session::PROTOCOL_ID;
pub use protocol::{
    build_chat, build_chat_at, build_hello, verify_chat, verify_hello, ChatMessage, HelloMessage,
    Message,
};
