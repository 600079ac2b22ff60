//! AES-256-GCM session cipher with per-message random nonces

use aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use crypto::{CryptoError, SessionKey, SESSION_KEY_LEN};
use rand::RngCore;

/// GCM standard nonce size
pub const NONCE_LEN: usize = 12;

/// GCM authentication tag size
pub const TAG_LEN: usize = 16;

/// AEAD wrapper producing `nonce || ciphertext || tag` payloads.
///
/// Stateless between calls: every `encrypt` draws a fresh nonce from the OS
/// RNG, so the cipher can be shared by reference between a sending and a
/// receiving task. There are no sequence numbers; ordering and replay are
/// left to the reliable transport underneath.
pub struct SessionCipher {
    cipher: Aes256Gcm,
}

impl SessionCipher {
    pub fn new(key: &SessionKey) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes())),
        }
    }

    /// Build from raw key bytes; anything other than 32 bytes is rejected.
    pub fn from_key_bytes(key: &[u8]) -> Result<Self, CryptoError> {
        let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::InvalidKeySize {
            expected: SESSION_KEY_LEN,
            actual: key.len(),
        })?;
        Ok(Self { cipher })
    }

    /// Encrypt with empty associated data.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|_| CryptoError::EncryptionFailed)?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Decrypt a `nonce || ciphertext || tag` payload.
    ///
    /// Any error here means the stream is compromised or desynchronized; the
    /// caller must drop the connection rather than retry.
    pub fn decrypt(&self, frame: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if frame.len() < NONCE_LEN {
            return Err(CryptoError::ShortCiphertext {
                minimum: NONCE_LEN,
                actual: frame.len(),
            });
        }

        let (nonce, ciphertext) = frame.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::AuthenticationFailed)
    }
}
