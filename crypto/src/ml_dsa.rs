//! ML-DSA-65 (FIPS 204) signatures.
//!
//! Used only to bind a display name to a long-lived signing key in HELLO
//! announcements; session keys never depend on it.

use ml_dsa::signature::{Signer, Verifier};
use ml_dsa::{KeyGen, MlDsa65, B32};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::hashes::domain_hash;
use crate::traits::{Signature as SigTrait, SigningKey as SigningKeyTrait, VerifyKey};

/// ML-DSA-65 parameter sizes (FIPS 204)
pub const ML_DSA_PUBLIC_KEY_LEN: usize = 1952;
pub const ML_DSA_SIGNATURE_LEN: usize = 3309;
pub const ML_DSA_SEED_LEN: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MlDsaSignature {
    bytes: Vec<u8>,
}

impl MlDsaSignature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != ML_DSA_SIGNATURE_LEN {
            return Err(CryptoError::InvalidLength {
                expected: ML_DSA_SIGNATURE_LEN,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }
}

impl SigTrait for MlDsaSignature {
    fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// ML-DSA-65 verification key
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MlDsaPublicKey {
    bytes: [u8; ML_DSA_PUBLIC_KEY_LEN],
}

impl MlDsaPublicKey {
    fn to_inner(&self) -> ml_dsa::VerifyingKey<MlDsa65> {
        ml_dsa::VerifyingKey::<MlDsa65>::decode(&self.bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl VerifyKey for MlDsaPublicKey {
    type Signature = MlDsaSignature;

    fn verify(&self, message: &[u8], signature: &Self::Signature) -> Result<(), CryptoError> {
        let sig_bytes: [u8; ML_DSA_SIGNATURE_LEN] = signature
            .bytes
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::InvalidSignature)?;
        let sig = ml_dsa::Signature::<MlDsa65>::decode(&sig_bytes.into())
            .ok_or(CryptoError::InvalidSignature)?;

        self.to_inner()
            .verify(message, &sig)
            .map_err(|_| CryptoError::VerificationFailed)
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; ML_DSA_PUBLIC_KEY_LEN] =
            bytes.try_into().map_err(|_| CryptoError::InvalidLength {
                expected: ML_DSA_PUBLIC_KEY_LEN,
                actual: bytes.len(),
            })?;
        Ok(Self { bytes })
    }
}

/// ML-DSA-65 signing key, stored as its 32-byte FIPS 204 seed.
#[derive(Clone)]
pub struct MlDsaSecretKey {
    seed: Zeroizing<[u8; ML_DSA_SEED_LEN]>,
}

impl MlDsaSecretKey {
    fn to_inner(&self) -> ml_dsa::KeyPair<MlDsa65> {
        let xi: B32 = (*self.seed).into();
        MlDsa65::key_gen_internal(&xi)
    }

    pub fn from_seed(seed: [u8; ML_DSA_SEED_LEN]) -> Self {
        Self {
            seed: Zeroizing::new(seed),
        }
    }
}

impl core::fmt::Debug for MlDsaSecretKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MlDsaSecretKey").finish_non_exhaustive()
    }
}

impl SigningKeyTrait for MlDsaSecretKey {
    type VerifyKey = MlDsaPublicKey;
    type Signature = MlDsaSignature;

    fn generate() -> Self {
        let mut seed = [0u8; ML_DSA_SEED_LEN];
        rand::rngs::OsRng.fill_bytes(&mut seed);
        let key = Self::from_seed(seed);
        zeroize::Zeroize::zeroize(&mut seed);
        key
    }

    fn generate_deterministic(seed: &[u8]) -> Self {
        Self::from_seed(domain_hash(b"pqchat-ml-dsa-65-xi", seed))
    }

    fn sign(&self, message: &[u8]) -> Self::Signature {
        let sig = self.to_inner().signing_key().sign(message);
        MlDsaSignature {
            bytes: sig.encode().to_vec(),
        }
    }

    fn verify_key(&self) -> Self::VerifyKey {
        let encoded = self.to_inner().verifying_key().encode();
        let mut bytes = [0u8; ML_DSA_PUBLIC_KEY_LEN];
        bytes.copy_from_slice(encoded.as_ref());
        MlDsaPublicKey { bytes }
    }
}

/// Verify a signature given raw public key and signature bytes.
///
/// Malformed inputs and bad signatures both yield `Ok(false)`; only callers
/// that need to tell them apart should use [`VerifyKey::verify`] directly.
pub fn verify(message: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
    let Ok(pk) = MlDsaPublicKey::from_bytes(public_key) else {
        return false;
    };
    let Ok(sig) = MlDsaSignature::from_bytes(signature) else {
        return false;
    };
    pk.verify(message, &sig).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ml_dsa_sign_verify() {
        let signing_key = MlDsaSecretKey::generate_deterministic(b"test seed for ml-dsa");
        let verify_key = signing_key.verify_key();

        let message = b"Hello, post-quantum world!";
        let signature = signing_key.sign(message);

        assert!(verify_key.verify(message, &signature).is_ok());
        assert!(verify_key.verify(b"Wrong message", &signature).is_err());
    }

    #[test]
    fn test_parameter_sizes() {
        let sk = MlDsaSecretKey::generate();
        assert_eq!(sk.verify_key().to_bytes().len(), ML_DSA_PUBLIC_KEY_LEN);
        assert_eq!(sk.sign(b"m").as_bytes().len(), ML_DSA_SIGNATURE_LEN);
    }

    #[test]
    fn test_deterministic_keygen() {
        let sk1 = MlDsaSecretKey::generate_deterministic(b"deterministic test seed");
        let sk2 = MlDsaSecretKey::generate_deterministic(b"deterministic test seed");
        assert_eq!(sk1.verify_key(), sk2.verify_key());
    }

    #[test]
    fn raw_verify_helper() {
        let sk = MlDsaSecretKey::generate_deterministic(b"raw-helper");
        let pk = sk.verify_key().to_bytes();
        let sig = sk.sign(b"announce");

        assert!(verify(b"announce", sig.as_bytes(), &pk));
        assert!(!verify(b"announce!", sig.as_bytes(), &pk));
        assert!(!verify(b"announce", &sig.as_bytes()[1..], &pk));
        assert!(!verify(b"announce", sig.as_bytes(), &pk[..100]));
    }

    #[test]
    fn other_key_does_not_verify() {
        let alice = MlDsaSecretKey::generate_deterministic(b"alice");
        let bob = MlDsaSecretKey::generate_deterministic(b"bob");
        let sig = alice.sign(b"msg");
        assert!(matches!(
            bob.verify_key().verify(b"msg", &sig),
            Err(CryptoError::VerificationFailed)
        ));
    }
}
