//! Common error types for KeepVault.

use thiserror::Error;

/// Top-level error type for KeepVault operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad credentials, reserved login, or missing/invalid/expired token.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Secret or account absent where one is required.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Decryption or authentication-tag failure on stored ciphertext.
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// Master key does not match the hash recorded in the store.
    #[error("Configuration mismatch: {0}")]
    ConfigMismatch(String),

    /// Optimistic-lock contention exhausted its retry budget.
    #[error("Retries exhausted: {0}")]
    RetryExhausted(String),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Cryptographic operation failed.
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
