//! Vault core for KeepVault.
//!
//! This crate orchestrates the crypto engine and the secret store to
//! implement the account lifecycle (signup, login, key issuance) and the
//! secret lifecycle (add/get/remove/rename/update/copy/list), enforcing
//! per-login namespacing and type tagging.
//!
//! # Architecture
//! The vault core sits between the transport layer and the storage backend.
//! It receives the caller's login already resolved by the transport's
//! session authority and never inspects tokens itself.

pub mod service;

pub use service::{AuthGrant, VaultService};
