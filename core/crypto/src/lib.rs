//! Cryptographic primitives for KeepVault.
//!
//! This crate provides:
//! - Authenticated key wrapping using XChaCha20-Poly1305
//! - Password hashing for account authentication
//! - Session-token issuance and verification
//! - Key generation for user keys and the operator master key
//!
//! # Security Guarantees
//! - All key material is automatically zeroized on drop
//! - No plaintext or key material is ever logged
//! - Constant-time operations for sensitive comparisons
//!
//! Everything here is pure and stateless; the only I/O is randomness.

pub mod aead;
pub mod keys;
pub mod password;
pub mod token;

pub use aead::{decrypt, encrypt};
pub use keys::{generate_readable_key, MasterKey, UserKey, USER_KEY_LENGTH};
pub use password::hash_password;
pub use token::{issue_token, verify_token, TOKEN_TTL_MINUTES};
