//! Sending and receiving chat messages over a [`SecureSession`]

use std::fmt::Debug;

use pq_session::SecureSession;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;
use crate::handler::{Incoming, MessageHandler};
use crate::identity::Identity;
use crate::protocol::{build_chat, build_hello, ChatMessage, HelloMessage};

/// Announce `identity` on a freshly established session
pub async fn send_hello<S>(session: &mut SecureSession<S>, identity: &Identity) -> Result<HelloMessage>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (hello, raw) = build_hello(identity)?;
    session.send(&raw).await?;
    Ok(hello)
}

pub async fn send_chat<S>(
    session: &mut SecureSession<S>,
    identity: &Identity,
    to: Vec<String>,
    body: impl Into<String>,
) -> Result<ChatMessage>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (chat, raw) = build_chat(identity, to, body)?;
    session.send(&raw).await?;
    Ok(chat)
}

/// Receive and dispatch the next message. `Ok(None)` once the peer has
/// closed the stream.
pub async fn recv_incoming<S, P>(
    session: &mut SecureSession<S>,
    handler: &MessageHandler<P>,
    peer: &P,
) -> Result<Option<Incoming>>
where
    S: AsyncRead + AsyncWrite + Unpin,
    P: Clone + Debug,
{
    match session.recv().await? {
        Some(raw) => handler.handle(peer, &raw).map(Some),
        None => Ok(None),
    }
}
