//! Secret store trait definition and the key-list wire format.

use async_trait::async_trait;

use keepvault_common::{Record, Result};

/// Retry budget for the optimistic-lock loop in [`SecretStore::copy`].
pub const COPY_RETRY_LIMIT: usize = 100;

/// Storage backend for account and secret records.
///
/// Keys are opaque strings of the form `<namespace>/<name>`; the single
/// bookkeeping record lives at an un-prefixed key. All operations are a
/// single round trip and rely on the backend's per-key atomicity, except
/// [`copy`](SecretStore::copy) which carries its own optimistic-locking
/// contract. There is no cross-key serialization: concurrent writers of the
/// same key interleave with last-write-wins semantics.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Upsert all fields of `record` at `key` in one operation.
    async fn put(&self, key: &str, record: &Record) -> Result<()>;

    /// Fetch the record at `key` into `record`.
    ///
    /// # Postconditions
    /// - An absent key leaves `record` empty; absence is signaled by empty
    ///   fields, never by an error.
    async fn get_into(&self, key: &str, record: &mut Record) -> Result<()>;

    /// Delete the record at `key`. Idempotent.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Atomically duplicate `src` to `dst`.
    ///
    /// # Postconditions
    /// - `dst` holds a consistent snapshot of `src`, never a mix of
    ///   concurrent writes
    ///
    /// # Errors
    /// - Returns `Error::RetryExhausted` after [`COPY_RETRY_LIMIT`] lost
    ///   optimistic locks
    async fn copy(&self, src: &str, dst: &str) -> Result<()>;

    /// Encoded list of key suffixes under `<namespace>/`.
    ///
    /// Returns the exact client wire format produced by [`encode_key_list`];
    /// an empty namespace or zero matches yield `""`.
    async fn list_keys(&self, namespace: &str) -> Result<String>;

    /// Health-check the backend, then self-check the master key.
    ///
    /// Reads the bookkeeping record: if absent, records a hash of
    /// `master_key`; if present, verifies the hash matches.
    ///
    /// # Errors
    /// - Returns `Error::ConfigMismatch` when the store was initialized with
    ///   a different master key. Fatal at startup; the server refuses to
    ///   serve a store it cannot read.
    async fn ping(&self, master_key: &[u8]) -> Result<()>;

    /// Release the backend. Subsequent operations fail.
    async fn close(&self) -> Result<()>;
}

/// Join key suffixes into the encoded list returned to clients.
///
/// Each suffix is single-quoted with embedded quotes backslash-escaped, and
/// entries are comma-joined: keys `a` and `b'c` encode as `'a','b\'c'`.
/// This exact format is a client contract.
pub fn encode_key_list<'a>(suffixes: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for suffix in suffixes {
        if !out.is_empty() {
            out.push(',');
        }
        out.push('\'');
        for c in suffix.chars() {
            if c == '\'' {
                out.push('\\');
            }
            out.push(c);
        }
        out.push('\'');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_plain_keys() {
        assert_eq!(encode_key_list(["a", "b"]), "'a','b'");
    }

    #[test]
    fn test_encode_escapes_quotes() {
        assert_eq!(encode_key_list(["a", "b'c"]), r"'a','b\'c'");
        assert_eq!(encode_key_list(["''"]), r"'\'\''");
    }

    #[test]
    fn test_encode_empty() {
        assert_eq!(encode_key_list([]), "");
    }

    #[test]
    fn test_encode_single() {
        assert_eq!(encode_key_list(["only"]), "'only'");
    }
}
