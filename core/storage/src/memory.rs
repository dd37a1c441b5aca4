//! In-process versioned hash-map backend.
//!
//! The default backend for a single-node server and for tests. Every write
//! and delete stamps a fresh version from a monotonic counter, which is what
//! lets [`copy`](SecretStore::copy) detect concurrent modification the way a
//! remote watch would. All data is lost on drop.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;
use tracing::debug;

use crate::store::{encode_key_list, SecretStore, COPY_RETRY_LIMIT};
use keepvault_common::{Error, Record, Result, BOOKKEEPING_KEY};
use keepvault_crypto::hash_password;

/// A record plus the version stamp of its last write.
struct Versioned {
    record: Record,
    version: u64,
}

/// In-memory secret store.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Versioned>>,
    versions: AtomicU64,
    closed: AtomicBool,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            versions: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    fn next_version(&self) -> u64 {
        self.versions.fetch_add(1, Ordering::SeqCst)
    }

    fn check_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::Storage("store is closed".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn put(&self, key: &str, record: &Record) -> Result<()> {
        self.check_open()?;
        let version = self.next_version();
        self.entries.write().unwrap().insert(
            key.to_string(),
            Versioned {
                record: record.clone(),
                version,
            },
        );
        Ok(())
    }

    async fn get_into(&self, key: &str, record: &mut Record) -> Result<()> {
        self.check_open()?;
        let entries = self.entries.read().unwrap();
        *record = match entries.get(key) {
            Some(entry) => entry.record.clone(),
            None => Record::default(),
        };
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check_open()?;
        self.entries.write().unwrap().remove(key);
        Ok(())
    }

    async fn copy(&self, src: &str, dst: &str) -> Result<()> {
        for attempt in 0..COPY_RETRY_LIMIT {
            self.check_open()?;

            // Watch: snapshot the source version and value under a read lock.
            let (watched, snapshot) = {
                let entries = self.entries.read().unwrap();
                match entries.get(src) {
                    Some(entry) => (Some(entry.version), entry.record.clone()),
                    None => (None, Record::default()),
                }
            };

            // The read lock is released before the commit, like a remote
            // watch followed by a conditional transaction.
            tokio::task::yield_now().await;

            let mut entries = self.entries.write().unwrap();
            let current = entries.get(src).map(|entry| entry.version);
            if current != watched {
                // Optimistic lock lost. Retry.
                debug!(src, attempt, "copy lost optimistic lock");
                continue;
            }
            let version = self.next_version();
            entries.insert(
                dst.to_string(),
                Versioned {
                    record: snapshot,
                    version,
                },
            );
            return Ok(());
        }

        Err(Error::RetryExhausted(format!(
            "copy of {:?} reached maximum number of retries",
            src
        )))
    }

    async fn list_keys(&self, namespace: &str) -> Result<String> {
        self.check_open()?;
        if namespace.is_empty() {
            return Ok(String::new());
        }
        let prefix = format!("{}/", namespace);

        let entries = self.entries.read().unwrap();
        let mut suffixes: Vec<&str> = entries
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .collect();
        suffixes.sort_unstable();

        Ok(encode_key_list(suffixes))
    }

    async fn ping(&self, master_key: &[u8]) -> Result<()> {
        self.check_open()?;

        let mut bookkeeping = Record::default();
        self.get_into(BOOKKEEPING_KEY, &mut bookkeeping).await?;

        let master_hash = hash_password(master_key);
        if bookkeeping.pass_hash.is_empty() {
            bookkeeping.pass_hash = master_hash;
            self.put(BOOKKEEPING_KEY, &bookkeeping).await?;
        } else if bookkeeping.pass_hash != master_hash {
            return Err(Error::ConfigMismatch(
                "master key does not match the hash recorded in the store".to_string(),
            ));
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keepvault_common::SecretKind;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let store = MemoryStore::new();
        let record = Record::secret(SecretKind::Text, "ciphertext");

        store.put("alice/mail", &record).await.unwrap();

        let mut loaded = Record::default();
        store.get_into("alice/mail", &mut loaded).await.unwrap();
        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn test_get_absent_leaves_record_empty() {
        let store = MemoryStore::new();

        let mut record = Record::secret(SecretKind::Text, "stale");
        store.get_into("alice/nothing", &mut record).await.unwrap();

        assert_eq!(record, Record::default());
        assert!(!record.has_secret());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        store
            .put("alice/mail", &Record::secret(SecretKind::Text, "x"))
            .await
            .unwrap();

        store.delete("alice/mail").await.unwrap();
        store.delete("alice/mail").await.unwrap();

        let mut record = Record::default();
        store.get_into("alice/mail", &mut record).await.unwrap();
        assert!(!record.has_secret());
    }

    #[tokio::test]
    async fn test_copy_duplicates_record() {
        let store = MemoryStore::new();
        let record = Record::secret(SecretKind::Login, "creds");
        store.put("alice/old", &record).await.unwrap();

        store.copy("alice/old", "alice/new").await.unwrap();

        let mut copied = Record::default();
        store.get_into("alice/new", &mut copied).await.unwrap();
        assert_eq!(copied, record);

        // Source untouched
        let mut original = Record::default();
        store.get_into("alice/old", &mut original).await.unwrap();
        assert_eq!(original, record);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_copy_is_consistent_under_concurrent_writers() {
        let store = Arc::new(MemoryStore::new());
        store
            .put("alice/src", &Record::secret(SecretKind::Text, "v0"))
            .await
            .unwrap();

        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                for i in 1..200u32 {
                    let record = Record::secret(SecretKind::Text, format!("v{}", i));
                    store.put("alice/src", &record).await.unwrap();
                    tokio::task::yield_now().await;
                }
            })
        };

        for i in 0..50 {
            let dst = format!("alice/dst{}", i);
            store.copy("alice/src", &dst).await.unwrap();

            // Destination must be a complete snapshot of some written value.
            let mut copied = Record::default();
            store.get_into(&dst, &mut copied).await.unwrap();
            assert_eq!(copied.secret_kind(), Some(SecretKind::Text));
            assert!(copied.data.starts_with('v'));
            assert!(copied.pass_hash.is_empty());
        }

        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_list_keys_encoding() {
        let store = MemoryStore::new();
        store
            .put("alice/a", &Record::secret(SecretKind::Text, "1"))
            .await
            .unwrap();
        store
            .put("alice/b'c", &Record::secret(SecretKind::Text, "2"))
            .await
            .unwrap();
        // Another tenant's key must not leak into the listing.
        store
            .put("bob/a", &Record::secret(SecretKind::Text, "3"))
            .await
            .unwrap();

        let keys = store.list_keys("alice").await.unwrap();
        assert_eq!(keys, r"'a','b\'c'");
    }

    #[tokio::test]
    async fn test_list_keys_empty_cases() {
        let store = MemoryStore::new();
        assert_eq!(store.list_keys("alice").await.unwrap(), "");
        assert_eq!(store.list_keys("").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_ping_records_then_verifies_master_key() {
        let store = MemoryStore::new();

        // Fresh store: hash is recorded.
        store.ping(b"master one").await.unwrap();
        // Same key: fine.
        store.ping(b"master one").await.unwrap();
        // Different key: refuse.
        assert!(matches!(
            store.ping(b"master two").await,
            Err(Error::ConfigMismatch(_))
        ));
    }

    #[tokio::test]
    async fn test_closed_store_rejects_operations() {
        let store = MemoryStore::new();
        store.close().await.unwrap();

        let mut record = Record::default();
        assert!(matches!(
            store.get_into("alice/mail", &mut record).await,
            Err(Error::Storage(_))
        ));
        assert!(matches!(
            store.put("alice/mail", &Record::default()).await,
            Err(Error::Storage(_))
        ));
        assert!(matches!(store.ping(b"key").await, Err(Error::Storage(_))));
    }
}
