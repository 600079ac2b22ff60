//! Established sessions and the encrypted message channel built on them

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use crypto::{CryptoError, SessionKey};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;

use crate::cipher::SessionCipher;
use crate::error::{Result, SessionError};
use crate::frame::FrameCodec;
use crate::types::Role;

/// Result of a completed handshake: the AEAD cipher keyed with the derived
/// session key, plus which side of the handshake we were.
///
/// Both methods take `&self`, so one `Session` can be shared between a
/// sending and a receiving task.
pub struct Session {
    cipher: SessionCipher,
    role: Role,
}

impl Session {
    pub fn new(key: &SessionKey, role: Role) -> Self {
        Self {
            cipher: SessionCipher::new(key),
            role,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Encrypt one application message into a `nonce || ct || tag` payload.
    pub fn encrypt(&self, plaintext: &[u8]) -> std::result::Result<Vec<u8>, CryptoError> {
        self.cipher.encrypt(plaintext)
    }

    /// Decrypt one payload produced by the peer's [`Session::encrypt`].
    pub fn decrypt(&self, payload: &[u8]) -> std::result::Result<Vec<u8>, CryptoError> {
        self.cipher.decrypt(payload)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

fn open(session: &Session, frame: &[u8]) -> Result<Vec<u8>> {
    session.decrypt(frame).map_err(|e| {
        tracing::warn!(
            role = session.role().as_str(),
            len = frame.len(),
            error = %e,
            "pqchat frame rejected, dropping connection"
        );
        SessionError::from(e)
    })
}

/// Encrypted, framed channel over a stream that has completed a handshake.
///
/// Each `send` produces exactly one frame and each `recv` consumes exactly
/// one frame. Any error is terminal: the session should be dropped.
pub struct SecureSession<S> {
    stream: Framed<S, FrameCodec>,
    session: Arc<Session>,
    bytes_sent: u64,
    bytes_received: u64,
}

impl<S> fmt::Debug for SecureSession<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureSession")
            .field("role", &self.session.role())
            .field("bytes_sent", &self.bytes_sent)
            .field("bytes_received", &self.bytes_received)
            .finish_non_exhaustive()
    }
}

impl<S> SecureSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap `socket`, which must be positioned right after the handshake's
    /// last frame.
    pub fn new(socket: S, session: Session) -> Self {
        Self {
            stream: Framed::new(socket, FrameCodec::new()),
            session: Arc::new(session),
            bytes_sent: 0,
            bytes_received: 0,
        }
    }

    pub fn role(&self) -> Role {
        self.session.role()
    }

    /// Wire bytes (payloads, excluding length prefixes) sent so far
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Wire bytes (payloads, excluding length prefixes) received so far
    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    /// Encrypt and send one message
    pub async fn send(&mut self, data: &[u8]) -> Result<()> {
        let encrypted = self.session.encrypt(data)?;
        let len = encrypted.len() as u64;
        self.stream.send(Bytes::from(encrypted)).await?;
        self.bytes_sent += len;
        Ok(())
    }

    /// Receive and decrypt one message. `Ok(None)` means the peer closed the
    /// stream cleanly between frames.
    pub async fn recv(&mut self) -> Result<Option<Vec<u8>>> {
        match self.stream.next().await {
            Some(Ok(frame)) => {
                self.bytes_received += frame.len() as u64;
                open(&self.session, &frame).map(Some)
            }
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    /// Send a message serialized as JSON
    pub async fn send_message<M: serde::Serialize>(&mut self, message: &M) -> Result<()> {
        let data = serde_json::to_vec(message)?;
        self.send(&data).await
    }

    /// Receive a JSON message
    pub async fn recv_message<M: serde::de::DeserializeOwned>(&mut self) -> Result<Option<M>> {
        match self.recv().await? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    /// Split into independently owned halves for a read loop and a write
    /// loop. Both halves share the same session key.
    pub fn split(self) -> (SessionSender<S>, SessionReceiver<S>) {
        let (sink, stream) = self.stream.split();
        (
            SessionSender {
                sink,
                session: Arc::clone(&self.session),
            },
            SessionReceiver {
                stream,
                session: self.session,
            },
        )
    }

    /// Flush and shut down the write side
    pub async fn close(mut self) -> Result<()> {
        self.stream.close().await?;
        Ok(())
    }

    /// Get the underlying stream (consumes the session)
    pub fn into_inner(self) -> S {
        self.stream.into_inner()
    }
}

/// Write half of a split [`SecureSession`]
pub struct SessionSender<S> {
    sink: SplitSink<Framed<S, FrameCodec>, Bytes>,
    session: Arc<Session>,
}

impl<S> SessionSender<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub async fn send(&mut self, data: &[u8]) -> Result<()> {
        let encrypted = self.session.encrypt(data)?;
        self.sink.send(Bytes::from(encrypted)).await?;
        Ok(())
    }

    pub async fn send_message<M: serde::Serialize>(&mut self, message: &M) -> Result<()> {
        let data = serde_json::to_vec(message)?;
        self.send(&data).await
    }

    pub async fn close(mut self) -> Result<()> {
        self.sink.close().await?;
        Ok(())
    }
}

/// Read half of a split [`SecureSession`]
pub struct SessionReceiver<S> {
    stream: SplitStream<Framed<S, FrameCodec>>,
    session: Arc<Session>,
}

impl<S> SessionReceiver<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub async fn recv(&mut self) -> Result<Option<Vec<u8>>> {
        match self.stream.next().await {
            Some(Ok(frame)) => open(&self.session, &frame).map(Some),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    pub async fn recv_message<M: serde::de::DeserializeOwned>(&mut self) -> Result<Option<M>> {
        match self.recv().await? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }
}
