//! Storage record model and key namespacing.
//!
//! Accounts and secrets share one four-field record schema. Accounts populate
//! `pass_hash` and `wrapped_key`, secrets populate `data` and `kind`; empty
//! strings mark unused fields, and a fully empty record means the key is
//! absent in the store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logins that can never be signed up: the bookkeeping key itself and the
/// account-namespace prefix.
pub const RESERVED_LOGINS: [&str; 2] = ["server", "/users"];

/// The single un-prefixed key holding the master-key consistency hash.
pub const BOOKKEEPING_KEY: &str = "server";

/// Storage key of the account record for `login`.
pub fn user_key(login: &str) -> String {
    format!("/users/{}", login)
}

/// Storage key of the secret `name` owned by `login`.
///
/// Every secret key is prefixed by its owner's login, which is what enforces
/// tenant isolation at the storage layer.
pub fn secret_key(login: &str, name: &str) -> String {
    format!("{}/{}", login, name)
}

/// Type tag of a stored secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecretKind {
    /// Login/password credential pair.
    Login,
    /// Free-form text.
    Text,
    /// Opaque binary blob.
    Binary,
    /// Payment-card record.
    Cart,
}

impl SecretKind {
    /// Wire/storage representation of the tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            SecretKind::Login => "LOGIN",
            SecretKind::Text => "TEXT",
            SecretKind::Binary => "BINARY",
            SecretKind::Cart => "CART",
        }
    }
}

impl FromStr for SecretKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "LOGIN" => Ok(SecretKind::Login),
            "TEXT" => Ok(SecretKind::Text),
            "BINARY" => Ok(SecretKind::Binary),
            "CART" => Ok(SecretKind::Cart),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown secret kind: {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for SecretKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One stored record, shared by account and secret entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Salted password hash (accounts) or master-key hash (bookkeeping).
    #[serde(default)]
    pub pass_hash: String,
    /// Base64 ciphertext of the user key wrapped by the master key.
    #[serde(default)]
    pub wrapped_key: String,
    /// Opaque secret ciphertext; its plaintext schema is owned by the caller.
    #[serde(default)]
    pub data: String,
    /// Secret type tag, empty for account and bookkeeping records.
    #[serde(default)]
    pub kind: String,
}

impl Record {
    /// Build an account record.
    pub fn account(pass_hash: impl Into<String>, wrapped_key: impl Into<String>) -> Self {
        Self {
            pass_hash: pass_hash.into(),
            wrapped_key: wrapped_key.into(),
            ..Self::default()
        }
    }

    /// Build a secret record.
    pub fn secret(kind: SecretKind, data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            kind: kind.as_str().to_string(),
            ..Self::default()
        }
    }

    /// An account with an empty password hash is treated as non-existent.
    pub fn has_account(&self) -> bool {
        !self.pass_hash.is_empty()
    }

    /// A secret with an empty type tag is treated as non-existent.
    pub fn has_secret(&self) -> bool {
        !self.kind.is_empty()
    }

    /// Parsed secret kind, if the tag is set and recognized.
    pub fn secret_kind(&self) -> Option<SecretKind> {
        self.kind.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in [
            SecretKind::Login,
            SecretKind::Text,
            SecretKind::Binary,
            SecretKind::Cart,
        ] {
            assert_eq!(kind.as_str().parse::<SecretKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert!("PASSWORD".parse::<SecretKind>().is_err());
        assert!("".parse::<SecretKind>().is_err());
    }

    #[test]
    fn test_empty_record_is_absent() {
        let record = Record::default();
        assert!(!record.has_account());
        assert!(!record.has_secret());
        assert!(record.secret_kind().is_none());
    }

    #[test]
    fn test_account_and_secret_constructors() {
        let account = Record::account("abc123", "wrapped");
        assert!(account.has_account());
        assert!(!account.has_secret());

        let secret = Record::secret(SecretKind::Text, "ciphertext");
        assert!(secret.has_secret());
        assert_eq!(secret.secret_kind(), Some(SecretKind::Text));
        assert!(!secret.has_account());
    }

    #[test]
    fn test_key_namespacing() {
        assert_eq!(user_key("alice"), "/users/alice");
        assert_eq!(secret_key("alice", "mail"), "alice/mail");
    }
}
