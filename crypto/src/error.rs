use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("invalid length: expected {expected} bytes, found {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("empty shared secret")]
    EmptySecret,

    #[error("invalid key size: expected {expected} bytes, found {actual}")]
    InvalidKeySize { expected: usize, actual: usize },

    #[error("key derivation failed")]
    KeyDerivation,

    #[error("encapsulation failed")]
    EncapsulationFailed,

    #[error("decapsulation failed")]
    DecapsulationFailed,

    #[error("verification failed")]
    VerificationFailed,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("encryption failed")]
    EncryptionFailed,

    #[error("ciphertext too short: {actual} bytes, need at least {minimum}")]
    ShortCiphertext { minimum: usize, actual: usize },

    /// AEAD tag did not verify: tampering or a mismatched key.
    #[error("authentication failed")]
    AuthenticationFailed,
}
