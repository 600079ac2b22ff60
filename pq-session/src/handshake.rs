//! Two-frame ML-KEM-768 handshake
//!
//! ```text
//! Server -> Client: Frame{ ML-KEM-768 public key  (1184 bytes) }
//! Client -> Server: Frame{ ML-KEM-768 ciphertext  (1088 bytes) }
//! ```
//!
//! Both sides then run HKDF-SHA256 over the shared secret with the fixed
//! [`HANDSHAKE_LABEL`] and build a [`Session`]. The exchange is not
//! authenticated; peer identity is layered on afterwards by a signed HELLO.
//!
//! [`ServerHandshake`] and [`ClientHandshake`] are pure state machines that
//! never touch I/O. [`server_handshake`] and [`client_handshake`] drive them
//! over a stream with [`write_frame`]/[`read_frame`].
//!
//! Secret material (the ephemeral decapsulation key and the raw shared secret)
//! lives in `Option` fields of the state machine. Every failure clears them,
//! and dropping the state machine wipes whatever is left, so there is no exit
//! path that leaves key material behind.

use crypto::ml_kem::{
    MlKemCiphertext, MlKemKeyPair, MlKemPublicKey, MlKemSharedSecret, ML_KEM_CIPHERTEXT_LEN,
    ML_KEM_PUBLIC_KEY_LEN,
};
use crypto::traits::{KemKeyPair, KemPublicKey};
use crypto::derive_key;
use crypto::hashes::fingerprint;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::SessionConfig;
use crate::error::{HandshakeError, Result, SessionError};
use crate::frame::{read_frame, write_frame};
use crate::session::Session;
use crate::types::{HandshakeState, Role, HANDSHAKE_LABEL};

fn expect_frame_len(frame: &[u8], expected: &'static str, expected_len: usize) -> Result<()> {
    if frame.len() != expected_len {
        return Err(HandshakeError::UnexpectedFrame {
            expected,
            expected_len,
            got_len: frame.len(),
        }
        .into());
    }
    Ok(())
}

fn establish(shared_secret: MlKemSharedSecret, role: Role) -> Result<Session> {
    let key = derive_key(shared_secret.as_bytes(), HANDSHAKE_LABEL)?;
    Ok(Session::new(&key, role))
}

/// Server side: owns the ephemeral KEM keypair from keygen to decapsulation.
pub struct ServerHandshake {
    state: HandshakeState,
    keypair: Option<MlKemKeyPair>,
    shared_secret: Option<MlKemSharedSecret>,
}

impl Default for ServerHandshake {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerHandshake {
    pub fn new() -> Self {
        Self {
            state: HandshakeState::Init,
            keypair: None,
            shared_secret: None,
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// `Init -> KeySent`. Generates the ephemeral keypair and returns the
    /// public key to send as the first frame.
    pub fn start(&mut self) -> Result<Vec<u8>> {
        self.guarded(|hs| {
            hs.expect_state(HandshakeState::Init, "start")?;
            let keypair = MlKemKeyPair::generate()?;
            let public_key = keypair.public_key().to_bytes();
            hs.keypair = Some(keypair);
            hs.state = HandshakeState::KeySent;
            Ok(public_key)
        })
    }

    /// `KeySent -> KeyMaterialExchanged`. Decapsulates the client's
    /// ciphertext. The ephemeral keypair is released here whatever the outcome.
    pub fn receive_ciphertext(&mut self, frame: &[u8]) -> Result<()> {
        self.guarded(|hs| {
            hs.expect_state(HandshakeState::KeySent, "receive_ciphertext")?;
            let keypair = hs
                .keypair
                .take()
                .ok_or(HandshakeError::InvalidState {
                    state: hs.state,
                    operation: "receive_ciphertext",
                })?;

            expect_frame_len(frame, "ciphertext", ML_KEM_CIPHERTEXT_LEN)?;
            let ciphertext = MlKemCiphertext::from_bytes(frame)?;
            let shared_secret = keypair.decapsulate(&ciphertext)?;
            drop(keypair);

            hs.shared_secret = Some(shared_secret);
            hs.state = HandshakeState::KeyMaterialExchanged;
            Ok(())
        })
    }

    /// `KeyMaterialExchanged -> Established`.
    pub fn finish(&mut self) -> Result<Session> {
        self.guarded(|hs| {
            hs.expect_state(HandshakeState::KeyMaterialExchanged, "finish")?;
            let shared_secret = hs.shared_secret.take().ok_or(HandshakeError::InvalidState {
                state: hs.state,
                operation: "finish",
            })?;
            let session = establish(shared_secret, Role::Server)?;
            hs.state = HandshakeState::Established;
            Ok(session)
        })
    }

    /// Move to `Failed` and wipe any key material. Used by drivers when the
    /// stream fails between steps.
    pub fn abort(&mut self) {
        self.state = HandshakeState::Failed;
        self.keypair = None;
        self.shared_secret = None;
    }

    #[cfg(test)]
    fn holds_secrets(&self) -> bool {
        self.keypair.is_some() || self.shared_secret.is_some()
    }

    fn expect_state(&self, expected: HandshakeState, operation: &'static str) -> Result<()> {
        if self.state != expected {
            return Err(HandshakeError::InvalidState {
                state: self.state,
                operation,
            }
            .into());
        }
        Ok(())
    }

    fn guarded<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let result = op(self);
        if result.is_err() {
            self.abort();
        }
        result
    }
}

/// Client side: encapsulates against the server's public key.
pub struct ClientHandshake {
    state: HandshakeState,
    shared_secret: Option<MlKemSharedSecret>,
}

impl Default for ClientHandshake {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientHandshake {
    pub fn new() -> Self {
        Self {
            state: HandshakeState::Init,
            shared_secret: None,
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// `Init -> AwaitingPub`.
    pub fn await_public_key(&mut self) -> Result<()> {
        self.guarded(|hs| {
            hs.expect_state(HandshakeState::Init, "await_public_key")?;
            hs.state = HandshakeState::AwaitingPub;
            Ok(())
        })
    }

    /// `AwaitingPub -> KeyMaterialExchanged`. Returns the ciphertext to send
    /// back as the second frame.
    pub fn receive_public_key(&mut self, frame: &[u8]) -> Result<Vec<u8>> {
        self.guarded(|hs| {
            hs.expect_state(HandshakeState::AwaitingPub, "receive_public_key")?;
            expect_frame_len(frame, "public key", ML_KEM_PUBLIC_KEY_LEN)?;

            let public_key = MlKemPublicKey::from_bytes(frame)?;
            let (ciphertext, shared_secret) = public_key.encapsulate()?;

            hs.shared_secret = Some(shared_secret);
            hs.state = HandshakeState::KeyMaterialExchanged;
            Ok(ciphertext.as_bytes().to_vec())
        })
    }

    /// `KeyMaterialExchanged -> Established`.
    pub fn finish(&mut self) -> Result<Session> {
        self.guarded(|hs| {
            hs.expect_state(HandshakeState::KeyMaterialExchanged, "finish")?;
            let shared_secret = hs.shared_secret.take().ok_or(HandshakeError::InvalidState {
                state: hs.state,
                operation: "finish",
            })?;
            let session = establish(shared_secret, Role::Client)?;
            hs.state = HandshakeState::Established;
            Ok(session)
        })
    }

    pub fn abort(&mut self) {
        self.state = HandshakeState::Failed;
        self.shared_secret = None;
    }

    #[cfg(test)]
    fn holds_secrets(&self) -> bool {
        self.shared_secret.is_some()
    }

    fn expect_state(&self, expected: HandshakeState, operation: &'static str) -> Result<()> {
        if self.state != expected {
            return Err(HandshakeError::InvalidState {
                state: self.state,
                operation,
            }
            .into());
        }
        Ok(())
    }

    fn guarded<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let result = op(self);
        if result.is_err() {
            self.abort();
        }
        result
    }
}

fn log_failure(role: Role, state_before: HandshakeState, err: &SessionError) {
    tracing::warn!(
        role = role.as_str(),
        state = %state_before,
        category = ?err.category(),
        error = %err,
        "pqchat handshake failed"
    );
}

/// Run the server role over `stream`: send the public key, read the
/// ciphertext, derive the session.
pub async fn server_handshake<S>(stream: &mut S, config: &SessionConfig) -> Result<Session>
where
    S: AsyncRead + AsyncWrite + Unpin + ?Sized,
{
    let mut handshake = ServerHandshake::new();
    let verbose = config.verbose_logging;

    let result = async {
        let public_key = handshake.start()?;
        write_frame(stream, &public_key).await?;
        if verbose {
            tracing::debug!(
                key = %fingerprint(&public_key),
                "sent ML-KEM public key"
            );
        }

        let ciphertext = read_frame(stream).await?;
        if verbose {
            tracing::debug!(len = ciphertext.len(), "received ML-KEM ciphertext");
        }
        handshake.receive_ciphertext(&ciphertext)?;
        handshake.finish()
    }
    .await;

    let state = handshake.state();
    match &result {
        Ok(_) => tracing::debug!(role = "server", "pqchat session established"),
        Err(err) => {
            handshake.abort();
            log_failure(Role::Server, state, err);
        }
    }
    result
}

/// Run the client role over `stream`: read the public key, send the
/// ciphertext, derive the session.
pub async fn client_handshake<S>(stream: &mut S, config: &SessionConfig) -> Result<Session>
where
    S: AsyncRead + AsyncWrite + Unpin + ?Sized,
{
    let mut handshake = ClientHandshake::new();
    let verbose = config.verbose_logging;

    let result = async {
        handshake.await_public_key()?;
        let public_key = read_frame(stream).await?;
        if verbose {
            tracing::debug!(
                key = %fingerprint(&public_key),
                len = public_key.len(),
                "received ML-KEM public key"
            );
        }

        let ciphertext = handshake.receive_public_key(&public_key)?;
        write_frame(stream, &ciphertext).await?;
        if verbose {
            tracing::debug!(len = ciphertext.len(), "sent ML-KEM ciphertext");
        }
        handshake.finish()
    }
    .await;

    let state = handshake.state();
    match &result {
        Ok(_) => tracing::debug!(role = "client", "pqchat session established"),
        Err(err) => {
            handshake.abort();
            log_failure(Role::Client, state, err);
        }
    }
    result
}
