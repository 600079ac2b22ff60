//! Post-quantum primitive adapters used by the pqchat session layer.
//!
//! - [`ml_kem`]: ML-KEM-768 (FIPS 203) key agreement
//! - [`ml_dsa`]: ML-DSA-65 (FIPS 204) signatures for identity announcements
//! - [`kdf`]: HKDF-SHA256 session key derivation

pub mod error;
pub mod hashes;
pub mod kdf;
pub mod ml_dsa;
pub mod ml_kem;
pub mod traits;

pub use error::CryptoError;
pub use kdf::{derive_key, SessionKey, SESSION_KEY_LEN};
