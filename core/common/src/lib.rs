//! Common types shared across KeepVault crates.
//!
//! This crate provides the error taxonomy and the storage record model used
//! by every other crate, ensuring consistent error mapping from the vault
//! core out to the transport layer.

pub mod error;
pub mod record;

pub use error::{Error, Result};
pub use record::{secret_key, user_key, Record, SecretKind, BOOKKEEPING_KEY, RESERVED_LOGINS};
