//! Password hashing for account authentication.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

// Single global salt shared by every account. Kept as-is for compatibility
// with existing stores; a per-account salt would invalidate every stored
// hash. Known weakness: identical passwords produce identical hashes.
const HASH_SALT: &str = "mXv0q.TRsnl!e29dKu";

/// One-way digest of `password` with the fixed global salt, hex-encoded.
///
/// Also used by the store self-check to fingerprint the master key.
pub fn hash_password(password: &[u8]) -> String {
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(password);
    hasher.update(HASH_SALT.as_bytes());

    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash_password(b"secret"), hash_password(b"secret"));
    }

    #[test]
    fn test_different_passwords_differ() {
        assert_ne!(hash_password(b"secret"), hash_password(b"Secret"));
    }

    #[test]
    fn test_hash_is_hex_of_256_bits() {
        let hash = hash_password(b"anything");
        assert_eq!(hash.len(), 64);
        assert!(hash.bytes().all(|b| b.is_ascii_hexdigit()));
    }
}
