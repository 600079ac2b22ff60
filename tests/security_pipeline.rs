//! Adversarial end-to-end flows
//!
//! A frame-aware relay sits between client and server and tampers with
//! traffic; every manipulation must surface as a terminal error on the
//! receiving side, never as corrupted plaintext.

use crypto::ml_kem::{ML_KEM_CIPHERTEXT_LEN, ML_KEM_PUBLIC_KEY_LEN};
use pq_session::{
    read_frame, write_frame, ErrorCategory, FrameError, PqTransport, SecureSession,
    SessionConfig, SessionError,
};
use pqchat::{
    build_hello, ChatConfig, ChatError, HelloPolicy, Identity, Message, MessageHandler,
    PeerRegistry,
};
use std::sync::Arc;
use tokio::io::{duplex, AsyncWriteExt, DuplexStream};

async fn sessions_through_relay<C, S>(
    client_to_server: C,
    server_to_client: S,
) -> (
    Result<SecureSession<DuplexStream>, SessionError>,
    Result<SecureSession<DuplexStream>, SessionError>,
)
where
    C: FnMut(usize, &mut Vec<u8>) + Send + 'static,
    S: FnMut(usize, &mut Vec<u8>) + Send + 'static,
{
    let (client_io, client_relay) = duplex(1 << 17);
    let (server_io, server_relay) = duplex(1 << 17);
    let (client_relay_read, client_relay_write) = tokio::io::split(client_relay);
    let (server_relay_read, server_relay_write) = tokio::io::split(server_relay);

    tokio::spawn(pump(client_relay_read, server_relay_write, client_to_server));
    tokio::spawn(pump(server_relay_read, client_relay_write, server_to_client));

    let transport = PqTransport::new(SessionConfig::new());
    tokio::join!(
        transport.upgrade_outbound(client_io),
        transport.upgrade_inbound(server_io)
    )
}

/// Forward frames from `from` to `to`, passing each through `tamper` with its
/// index. Stops at the first read error and then hangs up on `to`.
async fn pump<R, W, F>(mut from: R, mut to: W, mut tamper: F)
where
    R: tokio::io::AsyncRead + Unpin,
    W: tokio::io::AsyncWrite + Unpin,
    F: FnMut(usize, &mut Vec<u8>),
{
    let mut index = 0;
    while let Ok(mut frame) = read_frame(&mut from).await {
        tamper(index, &mut frame);
        if write_frame(&mut to, &frame).await.is_err() {
            break;
        }
        index += 1;
    }
    let _ = to.shutdown().await;
}

#[tokio::test]
async fn honest_relay_is_transparent() {
    let (client, server) = sessions_through_relay(|_, _| {}, |_, _| {}).await;
    let mut client = client.unwrap();
    let mut server = server.unwrap();

    client.send(b"hello").await.unwrap();
    assert_eq!(server.recv().await.unwrap().unwrap(), b"hello");
}

#[tokio::test]
async fn flipped_bit_in_application_frame_is_detected() {
    // Frame 0 client->server is the KEM ciphertext; frame 1 is the first message.
    let (client, server) = sessions_through_relay(
        |index, frame| {
            if index == 1 {
                let last = frame.len() - 1;
                frame[last] ^= 0x01;
            }
        },
        |_, _| {},
    )
    .await;
    let mut client = client.unwrap();
    let mut server = server.unwrap();

    client.send(b"transfer 10 coins").await.unwrap();
    let err = server.recv().await.unwrap_err();
    assert!(err.is_security_event());
    assert_eq!(err.category(), ErrorCategory::Cryptographic);
}

#[tokio::test]
async fn tampered_ciphertext_breaks_the_session_not_the_handshake() {
    let (client, server) = sessions_through_relay(
        |index, frame| {
            if index == 0 {
                assert_eq!(frame.len(), ML_KEM_CIPHERTEXT_LEN);
                frame[0] ^= 0xFF;
            }
        },
        |_, _| {},
    )
    .await;
    let mut client = client.unwrap();
    let mut server = server.unwrap();

    // ML-KEM implicit rejection: both sides "succeed" with different keys.
    client.send(b"hello").await.unwrap();
    assert!(server.recv().await.unwrap_err().is_security_event());
}

#[tokio::test]
async fn truncated_public_key_is_a_protocol_error() {
    let (client, server) = sessions_through_relay(
        |_, _| {},
        |index, frame| {
            if index == 0 {
                assert_eq!(frame.len(), ML_KEM_PUBLIC_KEY_LEN);
                frame.truncate(ML_KEM_CIPHERTEXT_LEN);
            }
        },
    )
    .await;

    let err = client.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Protocol);
    // The client never answers, so the server sees the relay hang up.
    assert!(matches!(
        server.unwrap_err(),
        SessionError::Frame(FrameError::StreamClosed)
    ));
}

#[tokio::test]
async fn cut_connection_mid_frame_is_stream_closed() {
    let (server_io, mut attacker) = duplex(1 << 16);
    let transport = PqTransport::new(SessionConfig::new());
    let server = tokio::spawn(async move {
        let mut session = transport.upgrade_inbound(server_io).await?;
        session.recv().await
    });

    // Complete the handshake honestly, then cut a message short.
    let public_key = read_frame(&mut attacker).await.unwrap();
    let (ciphertext, _) = crypto::ml_kem::encapsulate(&public_key).unwrap();
    write_frame(&mut attacker, ciphertext.as_bytes()).await.unwrap();
    attacker.write_all(&[0x00, 0x40, 1, 2, 3]).await.unwrap();
    drop(attacker);

    assert!(matches!(
        server.await.unwrap(),
        Err(SessionError::Frame(FrameError::StreamClosed))
    ));
}

#[tokio::test]
async fn relayed_hello_with_swapped_name_is_not_trusted() {
    let alice = Identity::from_seed("alice", b"pipeline-alice");
    let (hello, _) = build_hello(&alice).unwrap();

    let mut forged = hello.clone();
    forged.pseudo = "bank-support".into();
    let forged = Message::Hello(forged).to_json().unwrap();

    let registry = Arc::new(PeerRegistry::<u8>::new());
    let strict = MessageHandler::new(
        ChatConfig::new().with_hello_policy(HelloPolicy::Reject),
        Arc::clone(&registry),
    );
    assert!(matches!(
        strict.handle(&1, &forged),
        Err(ChatError::HelloRejected { .. })
    ));
    assert!(registry.is_empty());

    let raw = serde_json::to_vec(&serde_json::json!({
        "type": "HELLO",
        "pseudo": hello.pseudo,
        "user_id": hello.user_id,
        "pub": hello.public_key,
        "sig": hello.signature,
    }))
    .unwrap();
    assert!(strict.handle(&1, &raw).unwrap().is_verified());
    assert_eq!(registry.lookup(alice.user_id()), Some(1));
}
