use hex::encode;
use pqchat_crypto::derive_key;
use pqchat_crypto::ml_dsa::{MlDsaSecretKey, ML_DSA_PUBLIC_KEY_LEN, ML_DSA_SIGNATURE_LEN};
use pqchat_crypto::ml_kem::{
    encapsulate, MlKemKeyPair, ML_KEM_CIPHERTEXT_LEN, ML_KEM_PUBLIC_KEY_LEN,
    ML_KEM_SHARED_SECRET_LEN,
};
use pqchat_crypto::traits::{KemKeyPair, KemPublicKey, Signature, SigningKey, VerifyKey};

/// RFC 5869 test case 3 (SHA-256, empty salt, empty info), first 32 bytes of OKM.
#[test]
fn hkdf_rfc5869_case3_prefix() {
    let ikm = [0x0bu8; 22];
    let key = derive_key(&ikm, b"").expect("non-empty secret");
    assert_eq!(
        encode(key.as_bytes()),
        "8da4e775a563c18f715f802a063c5a31b8a11f5c5ee1879ec3454e5f3c738d2d"
    );
}

#[test]
fn ml_kem_deterministic_keys_converge() {
    let server = MlKemKeyPair::generate_deterministic(b"vector-server");
    let public = server.public_key();
    assert_eq!(public.to_bytes().len(), ML_KEM_PUBLIC_KEY_LEN);

    let (ct, client_ss) = encapsulate(&public.to_bytes()).expect("encapsulate");
    assert_eq!(ct.as_bytes().len(), ML_KEM_CIPHERTEXT_LEN);
    assert_eq!(client_ss.as_bytes().len(), ML_KEM_SHARED_SECRET_LEN);

    let server_ss = server.decapsulate(&ct).expect("decapsulate");
    assert_eq!(client_ss.as_bytes(), server_ss.as_bytes());

    let client_key = derive_key(client_ss.as_bytes(), b"pqchat-handshake").unwrap();
    let server_key = derive_key(server_ss.as_bytes(), b"pqchat-handshake").unwrap();
    assert_eq!(client_key.as_bytes(), server_key.as_bytes());
}

#[test]
fn fresh_encapsulations_differ() {
    let server = MlKemKeyPair::generate().expect("keygen");
    let (ct1, ss1) = server.public_key().encapsulate().unwrap();
    let (ct2, ss2) = server.public_key().encapsulate().unwrap();
    assert_ne!(ct1, ct2);
    assert_ne!(ss1.as_bytes(), ss2.as_bytes());
}

#[test]
fn ml_dsa_deterministic_vectors() {
    let seed = b"pqchat-ml-dsa-seed";
    let message = b"pqchat message for ml-dsa";
    let sk = MlDsaSecretKey::generate_deterministic(seed);
    let pk = sk.verify_key();
    let signature = sk.sign(message);
    pk.verify(message, &signature)
        .expect("signature must verify");

    assert_eq!(pk.to_bytes().len(), ML_DSA_PUBLIC_KEY_LEN);
    assert_eq!(signature.as_bytes().len(), ML_DSA_SIGNATURE_LEN);

    let same_key = MlDsaSecretKey::generate_deterministic(seed).verify_key();
    assert_eq!(same_key, pk);
    same_key
        .verify(message, &signature)
        .expect("re-derived key verifies");
}
