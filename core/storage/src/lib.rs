//! Persistence layer for KeepVault.
//!
//! This crate provides:
//! - The [`SecretStore`] trait over opaque `<namespace>/<name>` string keys
//! - The encoded key-list wire format shared by every backend
//! - An in-process versioned hash-map backend
//!
//! Any atomic hash-map-capable store may sit behind the trait, provided it
//! preserves the optimistic-copy contract: watch the source, read its value,
//! commit the destination only if the source is unchanged, retry a bounded
//! number of times.

pub mod memory;
pub mod store;

pub use memory::MemoryStore;
pub use store::{encode_key_list, SecretStore, COPY_RETRY_LIMIT};
