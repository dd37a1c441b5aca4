//! Authenticated key wrapping using XChaCha20-Poly1305.
//!
//! Wrapped values travel and persist as base64 strings with the 24-byte
//! random nonce prepended to the ciphertext. Wrapping keys may be of any
//! length (the operator master key is a human-readable string); they are
//! normalized to a 256-bit cipher key with Blake2b before use.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use chacha20poly1305::{
    aead::{generic_array::GenericArray, Aead, AeadCore, KeyInit, OsRng},
    XChaCha20Poly1305,
};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use keepvault_common::{Error, Result};

/// Nonce size for XChaCha20-Poly1305 (24 bytes).
pub const NONCE_SIZE: usize = 24;

/// Authentication tag size (16 bytes).
pub const TAG_SIZE: usize = 16;

/// Normalize arbitrary-length key bytes to a 256-bit cipher key.
fn cipher_key(key: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(key);
    hasher.update(b"wrapkey");

    let result = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    out
}

/// Encrypt plaintext under `key`, returning base64.
///
/// # Postconditions
/// - Output decodes to nonce || ciphertext || tag
/// - The nonce is freshly random, so two encryptions of the same input differ
///
/// # Errors
/// - Returns `Error::Crypto` if encryption fails
pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<String> {
    let cipher = XChaCha20Poly1305::new(GenericArray::from_slice(&cipher_key(key)));
    let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| Error::Crypto(format!("Encryption failed: {}", e)))?;

    // Prepend nonce to ciphertext
    let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);

    Ok(STANDARD.encode(sealed))
}

/// Decrypt a base64 value produced by [`encrypt`].
///
/// # Errors
/// - Returns `Error::Integrity` on undecodable input, too-short input, or
///   authentication failure. No plaintext-adjacent detail is leaked.
pub fn decrypt(key: &[u8], encoded: &str) -> Result<Vec<u8>> {
    let sealed = STANDARD
        .decode(encoded)
        .map_err(|_| Error::Integrity("Ciphertext is not valid base64".to_string()))?;

    if sealed.len() < NONCE_SIZE + TAG_SIZE {
        return Err(Error::Integrity("Ciphertext too short".to_string()));
    }

    let (nonce_bytes, encrypted) = sealed.split_at(NONCE_SIZE);
    let nonce = GenericArray::from_slice(nonce_bytes);

    let cipher = XChaCha20Poly1305::new(GenericArray::from_slice(&cipher_key(key)));

    cipher
        .decrypt(nonce, encrypted)
        .map_err(|_| Error::Integrity("Decryption failed".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = b"master key of arbitrary length";
        let plaintext = b"Hello, World!";

        let sealed = encrypt(key, plaintext).unwrap();
        let decrypted = decrypt(key, &sealed).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_different_nonce_each_time() {
        let key = b"some key";
        let plaintext = b"Same plaintext";

        let ct1 = encrypt(key, plaintext).unwrap();
        let ct2 = encrypt(key, plaintext).unwrap();

        assert_ne!(ct1, ct2);
        assert_eq!(decrypt(key, &ct1).unwrap(), decrypt(key, &ct2).unwrap());
    }

    #[test]
    fn test_wrong_key_fails() {
        let sealed = encrypt(b"key one", b"Secret data").unwrap();

        assert!(matches!(
            decrypt(b"key two", &sealed),
            Err(Error::Integrity(_))
        ));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = b"key";
        let sealed = encrypt(key, b"Important data").unwrap();

        let mut raw = STANDARD.decode(&sealed).unwrap();
        raw[NONCE_SIZE + 3] ^= 0xFF;
        let tampered = STANDARD.encode(raw);

        assert!(matches!(decrypt(key, &tampered), Err(Error::Integrity(_))));
    }

    #[test]
    fn test_not_base64_fails() {
        assert!(matches!(
            decrypt(b"key", "not base64!!!"),
            Err(Error::Integrity(_))
        ));
    }

    #[test]
    fn test_too_short_fails() {
        let short = STANDARD.encode([0u8; NONCE_SIZE + TAG_SIZE - 1]);
        assert!(matches!(decrypt(b"key", &short), Err(Error::Integrity(_))));
    }

    #[test]
    fn test_empty_plaintext() {
        let key = b"key";
        let sealed = encrypt(key, b"").unwrap();
        assert_eq!(decrypt(key, &sealed).unwrap(), b"");
    }

    proptest! {
        #[test]
        fn prop_roundtrip(key in proptest::collection::vec(any::<u8>(), 1..64),
                          plaintext in proptest::collection::vec(any::<u8>(), 0..512)) {
            let sealed = encrypt(&key, &plaintext).unwrap();
            prop_assert_eq!(decrypt(&key, &sealed).unwrap(), plaintext);
        }
    }
}
