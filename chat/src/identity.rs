//! Long-lived chat identity: a display name bound to an ML-DSA-65 key

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use crypto::hashes::fingerprint;
use crypto::ml_dsa::{MlDsaPublicKey, MlDsaSecretKey};
use crypto::traits::{Signature, SigningKey, VerifyKey};

/// Local user identity.
///
/// `user_id` defaults to the fingerprint of the verification key, so two
/// identities only share an id if they share a key.
#[derive(Clone)]
pub struct Identity {
    pseudo: String,
    user_id: String,
    signing_key: MlDsaSecretKey,
    verify_key: MlDsaPublicKey,
}

impl Identity {
    /// Fresh identity with a random signing key
    pub fn generate(pseudo: impl Into<String>) -> Self {
        Self::from_signing_key(pseudo, MlDsaSecretKey::generate())
    }

    /// Identity whose key is derived from `seed`; the same seed always gives
    /// the same key and user id.
    pub fn from_seed(pseudo: impl Into<String>, seed: &[u8]) -> Self {
        Self::from_signing_key(pseudo, MlDsaSecretKey::generate_deterministic(seed))
    }

    pub fn from_signing_key(pseudo: impl Into<String>, signing_key: MlDsaSecretKey) -> Self {
        let verify_key = signing_key.verify_key();
        Self {
            pseudo: pseudo.into(),
            user_id: fingerprint(verify_key.as_bytes()),
            signing_key,
            verify_key,
        }
    }

    /// Replace the derived user id with an application-chosen one
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn pseudo(&self) -> &str {
        &self.pseudo
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn verify_key(&self) -> &MlDsaPublicKey {
        &self.verify_key
    }

    /// Verification key as carried in the `pub` field of HELLO/CHAT
    pub fn public_key_b64(&self) -> String {
        STANDARD.encode(self.verify_key.to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key.sign(message).to_vec()
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("pseudo", &self.pseudo)
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}
