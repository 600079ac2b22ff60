//! ML-KEM-768 (FIPS 203) key agreement.
//!
//! Thin wrapper over the RustCrypto `ml-kem` crate. Secret material (the
//! decapsulation key and every shared secret) is held in `Zeroizing`
//! buffers so it is wiped whenever the owning value is dropped, on success
//! and error paths alike.

use kem::{Decapsulate, Encapsulate};
use ml_kem::kem::{DecapsulationKey, EncapsulationKey};
use ml_kem::{EncodedSizeUser, KemCore, MlKem768, MlKem768Params, B32};
use zeroize::{Zeroize, Zeroizing};

use crate::error::CryptoError;
use crate::hashes::domain_hash;
use crate::traits::{KemKeyPair, KemPublicKey};

pub const ML_KEM_PUBLIC_KEY_LEN: usize = 1184;
pub const ML_KEM_SECRET_KEY_LEN: usize = 2400;
pub const ML_KEM_CIPHERTEXT_LEN: usize = 1088;
pub const ML_KEM_SHARED_SECRET_LEN: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MlKemCiphertext {
    bytes: [u8; ML_KEM_CIPHERTEXT_LEN],
}

impl MlKemCiphertext {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; ML_KEM_CIPHERTEXT_LEN] =
            bytes.try_into().map_err(|_| CryptoError::InvalidLength {
                expected: ML_KEM_CIPHERTEXT_LEN,
                actual: bytes.len(),
            })?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Raw KEM output. Used once as HKDF input, then dropped (and wiped).
pub struct MlKemSharedSecret {
    bytes: Zeroizing<[u8; ML_KEM_SHARED_SECRET_LEN]>,
}

impl MlKemSharedSecret {
    fn from_slice(raw: &[u8]) -> Self {
        let mut bytes = Zeroizing::new([0u8; ML_KEM_SHARED_SECRET_LEN]);
        bytes.copy_from_slice(raw);
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..]
    }
}

impl core::fmt::Debug for MlKemSharedSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MlKemSharedSecret").finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MlKemPublicKey {
    bytes: [u8; ML_KEM_PUBLIC_KEY_LEN],
}

impl MlKemPublicKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn to_inner(&self) -> EncapsulationKey<MlKem768Params> {
        EncapsulationKey::<MlKem768Params>::from_bytes(&self.bytes.into())
    }
}

impl KemPublicKey for MlKemPublicKey {
    type Ciphertext = MlKemCiphertext;
    type SharedSecret = MlKemSharedSecret;

    fn encapsulate(&self) -> Result<(Self::Ciphertext, Self::SharedSecret), CryptoError> {
        let mut rng = rand::rngs::OsRng;
        let (ct, mut ss) = self
            .to_inner()
            .encapsulate(&mut rng)
            .map_err(|_| CryptoError::EncapsulationFailed)?;

        let secret = MlKemSharedSecret::from_slice(&ss[..]);
        ss[..].zeroize();
        Ok((MlKemCiphertext::from_bytes(&ct[..])?, secret))
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; ML_KEM_PUBLIC_KEY_LEN] =
            bytes.try_into().map_err(|_| CryptoError::InvalidLength {
                expected: ML_KEM_PUBLIC_KEY_LEN,
                actual: bytes.len(),
            })?;
        Ok(Self { bytes })
    }
}

/// Ephemeral ML-KEM-768 keypair.
///
/// Deliberately not `Clone`: exactly one owner holds the decapsulation key,
/// from keygen until the handshake that created it finishes.
pub struct MlKemKeyPair {
    decapsulation_key_bytes: Zeroizing<[u8; ML_KEM_SECRET_KEY_LEN]>,
    public: MlKemPublicKey,
}

impl MlKemKeyPair {
    fn from_parts(
        dk: DecapsulationKey<MlKem768Params>,
        ek: EncapsulationKey<MlKem768Params>,
    ) -> Self {
        let mut encoded = dk.as_bytes();
        let mut dk_bytes = Zeroizing::new([0u8; ML_KEM_SECRET_KEY_LEN]);
        dk_bytes.copy_from_slice(&encoded[..]);
        encoded[..].zeroize();
        let mut ek_bytes = [0u8; ML_KEM_PUBLIC_KEY_LEN];
        ek_bytes.copy_from_slice(&ek.as_bytes()[..]);
        Self {
            decapsulation_key_bytes: dk_bytes,
            public: MlKemPublicKey { bytes: ek_bytes },
        }
    }
}

impl core::fmt::Debug for MlKemKeyPair {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MlKemKeyPair")
            .field("public", &crate::hashes::fingerprint(self.public.as_bytes()))
            .finish_non_exhaustive()
    }
}

impl KemKeyPair for MlKemKeyPair {
    type PublicKey = MlKemPublicKey;
    type Ciphertext = MlKemCiphertext;
    type SharedSecret = MlKemSharedSecret;

    fn generate() -> Result<Self, CryptoError> {
        let mut rng = rand::rngs::OsRng;
        let (dk, ek) = MlKem768::generate(&mut rng);
        Ok(Self::from_parts(dk, ek))
    }

    fn generate_deterministic(seed: &[u8]) -> Self {
        let d: B32 = domain_hash(b"pqchat-ml-kem-d", seed).into();
        let z: B32 = domain_hash(b"pqchat-ml-kem-z", seed).into();
        let (dk, ek) = MlKem768::generate_deterministic(&d, &z);
        Self::from_parts(dk, ek)
    }

    fn decapsulate(
        &self,
        ciphertext: &Self::Ciphertext,
    ) -> Result<Self::SharedSecret, CryptoError> {
        // `dk` wipes itself on drop; the encoded copy is cleared by hand.
        let mut encoded = (*self.decapsulation_key_bytes).into();
        let dk = DecapsulationKey::<MlKem768Params>::from_bytes(&encoded);
        encoded[..].zeroize();

        let mut ss = dk
            .decapsulate(&ciphertext.bytes.into())
            .map_err(|_| CryptoError::DecapsulationFailed)?;
        let secret = MlKemSharedSecret::from_slice(&ss[..]);
        ss[..].zeroize();
        Ok(secret)
    }

    fn public_key(&self) -> Self::PublicKey {
        self.public.clone()
    }
}

/// One-shot encapsulation against raw peer public key bytes.
pub fn encapsulate(
    peer_public_key: &[u8],
) -> Result<(MlKemCiphertext, MlKemSharedSecret), CryptoError> {
    MlKemPublicKey::from_bytes(peer_public_key)?.encapsulate()
}
