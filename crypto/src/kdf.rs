//! HKDF-SHA256 session key derivation.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// AES-256-GCM key size.
pub const SESSION_KEY_LEN: usize = 32;

/// Symmetric key owned by exactly one session; wiped on drop.
pub struct SessionKey {
    bytes: Zeroizing<[u8; SESSION_KEY_LEN]>,
}

impl SessionKey {
    pub fn as_bytes(&self) -> &[u8; SESSION_KEY_LEN] {
        &self.bytes
    }
}

impl core::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionKey").finish_non_exhaustive()
    }
}

/// Extract-and-expand `secret` into a 32-byte key bound to `label`.
///
/// No salt is used; `label` goes into the HKDF info field. Both handshake
/// roles must pass the same label byte-for-byte to converge.
pub fn derive_key(secret: &[u8], label: &[u8]) -> Result<SessionKey, CryptoError> {
    if secret.is_empty() {
        return Err(CryptoError::EmptySecret);
    }

    let hk = Hkdf::<Sha256>::new(None, secret);
    let mut bytes = Zeroizing::new([0u8; SESSION_KEY_LEN]);
    hk.expand(label, &mut bytes[..])
        .map_err(|_| CryptoError::KeyDerivation)?;

    Ok(SessionKey { bytes })
}
