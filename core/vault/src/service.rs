//! Account and secret lifecycle on top of the secret store.

use std::sync::Arc;
use tracing::debug;
use zeroize::Zeroizing;

use keepvault_common::{
    secret_key, user_key, Error, Record, Result, SecretKind, RESERVED_LOGINS,
};
use keepvault_crypto::{
    decrypt, encrypt, hash_password, issue_token, verify_token, MasterKey, UserKey,
    USER_KEY_LENGTH,
};
use keepvault_storage::SecretStore;

/// Result of a successful signup or login: the unwrapped user key for
/// client-side payload crypto, and a fresh bearer token.
pub struct AuthGrant {
    pub user_key: Zeroizing<Vec<u8>>,
    pub token: String,
}

/// The vault service.
///
/// Holds the process-wide master key and the shared store handle. All
/// namespaced operations take the caller's login as resolved by the
/// transport layer; tenant isolation comes from the `<login>/` key prefix.
pub struct VaultService {
    store: Arc<dyn SecretStore>,
    master_key: MasterKey,
}

impl VaultService {
    /// Create a vault service over `store` with the given master key.
    pub fn new(store: Arc<dyn SecretStore>, master_key: MasterKey) -> Self {
        Self { store, master_key }
    }

    /// The shared store handle, for startup ping and shutdown close.
    pub fn store(&self) -> &Arc<dyn SecretStore> {
        &self.store
    }

    /// Resolve the login asserted by a bearer token.
    ///
    /// # Errors
    /// - Returns `Error::Auth` on a malformed, forged, or expired token
    pub fn authenticate(&self, token: &str) -> Result<String> {
        verify_token(token, self.master_key.as_bytes())
    }

    /// Create an account and log it in.
    ///
    /// Signup is idempotent with login: an existing account (non-empty
    /// password hash) delegates straight to [`log_in`](Self::log_in), so a
    /// repeated signup with the right password succeeds and one with the
    /// wrong password fails exactly like a login would.
    ///
    /// # Errors
    /// - Returns `Error::Auth` for reserved logins and wrong passwords
    pub async fn sign_up(&self, login: &str, password: &str) -> Result<AuthGrant> {
        if RESERVED_LOGINS.contains(&login) {
            debug!(login, "signup rejected: reserved login");
            return Err(Error::Auth("wrong login or password".to_string()));
        }

        let mut account = Record::default();
        self.store.get_into(&user_key(login), &mut account).await?;
        if account.has_account() {
            return self.log_in(login, password).await;
        }

        let fresh_key = UserKey::generate(USER_KEY_LENGTH);
        let wrapped = encrypt(self.master_key.as_bytes(), fresh_key.as_bytes())?;
        let account = Record::account(hash_password(password.as_bytes()), wrapped);
        self.store.put(&user_key(login), &account).await?;

        self.log_in(login, password).await
    }

    /// Authenticate and return the unwrapped user key plus a fresh token.
    ///
    /// # Errors
    /// - Returns `Error::Auth` for an absent account or wrong password, with
    ///   one indistinguishable message for both
    /// - Returns `Error::Integrity` when the stored wrapped key fails to
    ///   unwrap; that is corruption or a master-key problem, never the
    ///   caller's fault
    pub async fn log_in(&self, login: &str, password: &str) -> Result<AuthGrant> {
        let mut account = Record::default();
        self.store.get_into(&user_key(login), &mut account).await?;
        if !account.has_account() {
            debug!(login, "login rejected: unknown account");
            return Err(Error::Auth("wrong login or password".to_string()));
        }

        let token = issue_token(login, password, &account.pass_hash, self.master_key.as_bytes())?;
        let key = decrypt(self.master_key.as_bytes(), &account.wrapped_key)?;

        Ok(AuthGrant {
            user_key: Zeroizing::new(key),
            token,
        })
    }

    /// Unwrapped user key for an already-authenticated login.
    ///
    /// Lets a session re-derive its client-side crypto material without
    /// re-sending the password.
    pub async fn get_key(&self, login: &str) -> Result<Zeroizing<Vec<u8>>> {
        let mut account = Record::default();
        self.store.get_into(&user_key(login), &mut account).await?;
        if !account.has_account() {
            debug!(login, "key request for unknown account");
            return Err(Error::Auth("wrong login or password".to_string()));
        }

        let key = decrypt(self.master_key.as_bytes(), &account.wrapped_key)?;
        Ok(Zeroizing::new(key))
    }

    /// Store a secret at `<login>/<name>`, overwriting any existing record.
    pub async fn add(&self, login: &str, name: &str, kind: SecretKind, data: &str) -> Result<()> {
        let record = Record::secret(kind, data);
        self.store.put(&secret_key(login, name), &record).await
    }

    /// Fetch a secret's ciphertext and type tag.
    ///
    /// # Errors
    /// - Returns `Error::NotFound` when the record is absent or its type tag
    ///   is unrecognized
    pub async fn get(&self, login: &str, name: &str) -> Result<(SecretKind, String)> {
        let mut record = Record::default();
        self.store
            .get_into(&secret_key(login, name), &mut record)
            .await?;

        match record.secret_kind() {
            Some(kind) => Ok((kind, record.data)),
            None => Err(Error::NotFound("key doesn't exist".to_string())),
        }
    }

    /// Overwrite an existing secret.
    ///
    /// # Errors
    /// - Returns `Error::NotFound` when there is no record to update
    pub async fn update(
        &self,
        login: &str,
        name: &str,
        kind: SecretKind,
        data: &str,
    ) -> Result<()> {
        let key = secret_key(login, name);
        let mut existing = Record::default();
        self.store.get_into(&key, &mut existing).await?;
        if !existing.has_secret() {
            return Err(Error::NotFound("key doesn't exist".to_string()));
        }

        self.store.put(&key, &Record::secret(kind, data)).await
    }

    /// Delete a secret. Idempotent; always succeeds.
    pub async fn remove(&self, login: &str, name: &str) -> Result<()> {
        self.store.delete(&secret_key(login, name)).await
    }

    /// Move a secret to a new name.
    ///
    /// The copy to the new key is atomic against concurrent writers of the
    /// old one; the delete that follows is not part of that transaction. A
    /// delete failure after a successful copy surfaces as an error with both
    /// keys left in place; there is no rollback.
    ///
    /// # Errors
    /// - Returns `Error::NotFound` when the old key is absent
    pub async fn rename(&self, login: &str, old: &str, new: &str) -> Result<()> {
        let old_key = secret_key(login, old);
        let mut existing = Record::default();
        self.store.get_into(&old_key, &mut existing).await?;
        if !existing.has_secret() {
            return Err(Error::NotFound("key doesn't exist".to_string()));
        }

        self.store.copy(&old_key, &secret_key(login, new)).await?;
        if let Err(err) = self.store.delete(&old_key).await {
            debug!(login, old, new, "rename left both keys after failed delete");
            return Err(err);
        }
        Ok(())
    }

    /// Duplicate a secret to a new name.
    ///
    /// A plain read followed by a single write; unlike
    /// [`rename`](Self::rename) nothing is deleted, so no extra atomicity is
    /// needed beyond the write itself.
    ///
    /// # Errors
    /// - Returns `Error::NotFound` when the old key is absent
    pub async fn copy(&self, login: &str, old: &str, new: &str) -> Result<()> {
        let mut existing = Record::default();
        self.store
            .get_into(&secret_key(login, old), &mut existing)
            .await?;
        if !existing.has_secret() {
            return Err(Error::NotFound("key doesn't exist".to_string()));
        }

        self.store.put(&secret_key(login, new), &existing).await
    }

    /// Encoded list of the caller's secret names, exactly as the store
    /// formats it.
    pub async fn list(&self, login: &str) -> Result<String> {
        self.store.list_keys(login).await
    }
}
