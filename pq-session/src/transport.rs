//! Stream upgrade: handshake plus session setup in one call

use std::future::Future;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::timeout;

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::handshake::{client_handshake, server_handshake};
use crate::session::SecureSession;
use crate::types::Role;

/// Upgrades raw byte streams into [`SecureSession`]s
#[derive(Clone, Debug, Default)]
pub struct PqTransport {
    config: SessionConfig,
}

impl PqTransport {
    /// Create a new transport with the given configuration
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Upgrade a stream we opened. Runs the client role.
    pub async fn upgrade_outbound<S>(&self, socket: S) -> Result<SecureSession<S>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        self.with_timeout(Role::Client, self.upgrade(socket, Role::Client))
            .await
    }

    /// Upgrade a stream we accepted. Runs the server role.
    pub async fn upgrade_inbound<S>(&self, socket: S) -> Result<SecureSession<S>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        self.with_timeout(Role::Server, self.upgrade(socket, Role::Server))
            .await
    }

    async fn upgrade<S>(&self, mut socket: S, role: Role) -> Result<SecureSession<S>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let session = match role {
            Role::Server => server_handshake(&mut socket, &self.config).await?,
            Role::Client => client_handshake(&mut socket, &self.config).await?,
        };

        if self.config.verbose_logging {
            tracing::info!(role = role.as_str(), "PQ handshake complete with ML-KEM-768");
        }

        Ok(SecureSession::new(socket, session))
    }

    async fn with_timeout<T>(
        &self,
        role: Role,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match self.config.handshake_timeout {
            Some(limit) => timeout(limit, fut).await.map_err(|_| {
                tracing::warn!(
                    role = role.as_str(),
                    timeout_ms = limit.as_millis() as u64,
                    "pqchat handshake timed out"
                );
                SessionError::Timeout
            })?,
            None => fut.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::duplex;
    use tokio::net::{TcpListener, TcpStream};

    #[tokio::test]
    async fn test_transport_upgrade_duplex() {
        let transport = PqTransport::new(SessionConfig::new().with_verbose_logging());
        let (server_stream, client_stream) = duplex(8192);

        let (server_result, client_result) = tokio::join!(
            transport.upgrade_inbound(server_stream),
            transport.upgrade_outbound(client_stream)
        );
        let mut server = server_result.unwrap();
        let mut client = client_result.unwrap();
        assert_eq!(server.role(), Role::Server);
        assert_eq!(client.role(), Role::Client);

        let message = b"Test message via transport";
        let (send_result, recv_result) = tokio::join!(client.send(message), server.recv());
        send_result.unwrap();
        assert_eq!(recv_result.unwrap().unwrap(), message.to_vec());
    }

    #[tokio::test]
    async fn test_transport_upgrade_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let transport = PqTransport::new(SessionConfig::new().with_timeout(Duration::from_secs(10)));

        let server_transport = transport.clone();
        let server_handle = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            server_transport.upgrade_inbound(socket).await
        });

        let socket = TcpStream::connect(addr).await.unwrap();
        let mut client = transport.upgrade_outbound(socket).await.unwrap();
        let mut server = server_handle.await.unwrap().unwrap();

        client.send(b"ping").await.unwrap();
        assert_eq!(server.recv().await.unwrap().unwrap(), b"ping".to_vec());

        server.send(b"pong").await.unwrap();
        assert_eq!(client.recv().await.unwrap().unwrap(), b"pong".to_vec());
    }

    #[tokio::test]
    async fn test_transport_timeout() {
        use std::io;
        use std::pin::Pin;
        use std::task::{Context, Poll};

        // Swallows writes, never produces a byte.
        struct HangingStream;

        impl AsyncRead for HangingStream {
            fn poll_read(
                self: Pin<&mut Self>,
                _cx: &mut Context<'_>,
                _buf: &mut tokio::io::ReadBuf<'_>,
            ) -> Poll<io::Result<()>> {
                Poll::Pending
            }
        }

        impl AsyncWrite for HangingStream {
            fn poll_write(
                self: Pin<&mut Self>,
                _cx: &mut Context<'_>,
                buf: &[u8],
            ) -> Poll<io::Result<usize>> {
                Poll::Ready(Ok(buf.len()))
            }

            fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
                Poll::Ready(Ok(()))
            }

            fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
                Poll::Ready(Ok(()))
            }
        }

        let config = SessionConfig::new().with_timeout(Duration::from_millis(50));
        let transport = PqTransport::new(config);

        let result = transport.upgrade_inbound(HangingStream).await;
        assert!(matches!(result, Err(SessionError::Timeout)));

        let result = transport.upgrade_outbound(HangingStream).await;
        assert!(matches!(result, Err(SessionError::Timeout)));
    }

    #[tokio::test]
    async fn peer_hangup_is_an_error_not_a_hang() {
        let transport = PqTransport::default();
        let (server_stream, client_stream) = duplex(8192);
        drop(client_stream);
        assert!(transport.upgrade_inbound(server_stream).await.is_err());
    }
}
