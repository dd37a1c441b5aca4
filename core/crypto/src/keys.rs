//! Key types with secure memory handling.
//!
//! Key material is automatically zeroized on drop and never appears in
//! `Debug` output.

use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of generated user keys in bytes.
pub const USER_KEY_LENGTH: usize = 24;

/// Alphabet for operator-facing keys: alphanumeric without 'O' (61 symbols).
const READABLE_ALPHABET: &[u8; 61] =
    b"ABCDEFGHIJKLMNPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Server-wide master key.
///
/// Wraps every user key and signs session tokens. Operator-supplied, so the
/// length is arbitrary; the AEAD layer normalizes it before use. Fixed for
/// the lifetime of the process.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    key: Vec<u8>,
}

impl MasterKey {
    /// Create a master key from raw bytes.
    pub fn from_bytes(key: Vec<u8>) -> Self {
        Self { key }
    }

    /// Get the key bytes.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MasterKey([REDACTED])")
    }
}

/// Per-account symmetric key.
///
/// Generated at signup, persisted only wrapped by the master key, and handed
/// unwrapped to an authenticated session for client-side payload crypto.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct UserKey {
    key: Vec<u8>,
}

impl UserKey {
    /// Generate `n` cryptographically random key bytes.
    pub fn generate(n: usize) -> Self {
        let mut key = vec![0u8; n];
        OsRng.fill_bytes(&mut key);
        Self { key }
    }

    /// Create a user key from raw bytes.
    pub fn from_bytes(key: Vec<u8>) -> Self {
        Self { key }
    }

    /// Get the key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }
}

impl fmt::Debug for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserKey([REDACTED])")
    }
}

/// Generate `n` characters from the fixed 61-symbol alphabet.
///
/// Used for the operator-facing master key when none is supplied on startup:
/// readable enough to note down, random enough to wrap keys with. The modulo
/// mapping is slightly biased and acceptable for this purpose.
pub fn generate_readable_key(n: usize) -> String {
    let mut out = String::with_capacity(n);
    let mut byte = [0u8; 1];
    for _ in 0..n {
        OsRng.fill_bytes(&mut byte);
        out.push(READABLE_ALPHABET[byte[0] as usize % READABLE_ALPHABET.len()] as char);
    }
    out
}
