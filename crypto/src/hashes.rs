use sha2::{Digest, Sha256};

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA-256 over a domain label followed by the input, used to stretch test
/// seeds into independent key-generation seeds.
pub fn domain_hash(domain: &[u8], data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(data);
    hasher.finalize().into()
}

/// Short hex fingerprint of a public key for log lines.
pub fn fingerprint(public_key: &[u8]) -> String {
    hex::encode(&sha256(public_key)[..8])
}
