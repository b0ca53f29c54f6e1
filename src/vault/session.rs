//! An unlocked vault for one user.
//!
//! `VaultSession` holds the storage handle and the encryption key that
//! `login` rebuilt from the master password.  The key lives only in
//! this struct and is zeroized when the session is dropped.
//!
//! The `VaultCryptoService` passed to `register_user` only shapes new
//! identities.  `login` uses the params stored with the credentials.

use chrono::Utc;
use zeroize::Zeroizing;

use crate::crypto::DerivedKey;
use crate::errors::{KeySealError, Result};

use super::entry::{DecryptedEntry, EntryMetadata, EntryUpdate, NewEntry, VaultEntry, DEFAULT_CATEGORY};
use super::service::VaultCryptoService;
use super::storage::{IdentityStorage, VaultStorage};

/// Create a new identity and store its credentials.
pub fn register_user<S: IdentityStorage>(
    storage: &mut S,
    service: &VaultCryptoService,
    user_id: &str,
    password: &str,
) -> Result<()> {
    validate_user_id(user_id)?;
    if password.is_empty() {
        return Err(KeySealError::InvalidInput("password cannot be empty".into()));
    }
    if storage.user_exists(user_id)? {
        return Err(KeySealError::UserAlreadyExists(user_id.to_string()));
    }

    let credentials = service.register(password)?;
    storage.store_credentials(user_id, &credentials)?;
    tracing::info!(user = user_id, "user registered");
    Ok(())
}

fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.trim().is_empty() {
        return Err(KeySealError::InvalidInput("user id cannot be empty".into()));
    }
    Ok(())
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(KeySealError::InvalidInput(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn normalize_category(category: Option<String>) -> String {
    match category {
        Some(c) if !c.trim().is_empty() => c.trim().to_string(),
        _ => DEFAULT_CATEGORY.to_string(),
    }
}

/// A logged-in user's view of the vault.
pub struct VaultSession<S> {
    storage: S,
    service: VaultCryptoService,
    user_id: String,
    key: DerivedKey,
}

impl<S: IdentityStorage + VaultStorage> VaultSession<S> {
    /// Verify the master password and unlock the vault.
    ///
    /// Unknown users and wrong passwords fail the same way.
    pub fn login(storage: S, user_id: &str, password: &str) -> Result<Self> {
        let credentials = match storage.fetch_credentials(user_id) {
            Ok(c) => c,
            Err(KeySealError::UserNotFound(_)) => {
                tracing::warn!(user = user_id, "login for unknown user");
                return Err(KeySealError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        let service = VaultCryptoService::from_params(&credentials.params)?;
        if !service.authenticate(password, &credentials.salt, &credentials.auth_hash)? {
            tracing::warn!(user = user_id, "wrong master password");
            return Err(KeySealError::InvalidCredentials);
        }

        let key = service.encryption_key(password, &credentials.salt)?;
        tracing::info!(user = user_id, "vault unlocked");

        Ok(Self {
            storage,
            service,
            user_id: user_id.to_string(),
            key,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Close the session and hand the storage back.  The key is dropped.
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Seal and store a new entry.  Returns its id.
    pub fn add_entry(&mut self, new: NewEntry) -> Result<i64> {
        require("site", &new.site)?;
        require("account", &new.account)?;
        if new.secret.is_empty() {
            return Err(KeySealError::InvalidInput("secret cannot be empty".into()));
        }

        let envelope = self.service.encrypt_secret(&new.secret, &self.key)?;
        let now = Utc::now();
        let entry = VaultEntry {
            id: 0,
            site: new.site.trim().to_string(),
            account: new.account.trim().to_string(),
            envelope,
            notes: new.notes.filter(|n| !n.is_empty()),
            category: normalize_category(new.category),
            favorite: new.favorite,
            created_at: now,
            updated_at: now,
        };

        let id = self.storage.insert(&self.user_id, &entry)?;
        tracing::debug!(entry_id = id, "entry added");
        Ok(id)
    }

    /// Apply a partial update.  A new secret is sealed with a fresh nonce.
    pub fn update_entry(&mut self, entry_id: i64, update: EntryUpdate) -> Result<()> {
        if update.is_empty() {
            return Err(KeySealError::InvalidInput("nothing to update".into()));
        }

        let mut entry = self.storage.fetch(&self.user_id, entry_id)?;

        if let Some(site) = update.site {
            require("site", &site)?;
            entry.site = site.trim().to_string();
        }
        if let Some(account) = update.account {
            require("account", &account)?;
            entry.account = account.trim().to_string();
        }
        if let Some(secret) = update.secret {
            if secret.is_empty() {
                return Err(KeySealError::InvalidInput("secret cannot be empty".into()));
            }
            entry.envelope = self.service.encrypt_secret(&secret, &self.key)?;
        }
        if let Some(notes) = update.notes {
            entry.notes = Some(notes).filter(|n| !n.is_empty());
        }
        if update.category.is_some() {
            entry.category = normalize_category(update.category);
        }
        if let Some(favorite) = update.favorite {
            entry.favorite = favorite;
        }
        entry.updated_at = Utc::now();

        self.storage.update(&self.user_id, &entry)?;
        tracing::debug!(entry_id, "entry updated");
        Ok(())
    }

    /// Decrypt a single entry's secret.
    pub fn get_secret(&self, entry_id: i64) -> Result<Zeroizing<String>> {
        let entry = self.storage.fetch(&self.user_id, entry_id)?;
        self.service.decrypt_secret(&entry.envelope, &self.key)
    }

    /// All entries' metadata, newest first.  No decryption happens.
    pub fn list_metadata(&self) -> Result<Vec<EntryMetadata>> {
        Ok(self
            .storage
            .list(&self.user_id)?
            .iter()
            .map(VaultEntry::metadata)
            .collect())
    }

    /// All entries with their secrets, newest first.
    ///
    /// Each entry carries its own decryption result.
    pub fn list_entries(&self) -> Result<Vec<DecryptedEntry>> {
        let entries = self.storage.list(&self.user_id)?;
        Ok(self.service.decrypt_entries(&entries, &self.key))
    }

    pub fn delete_entry(&mut self, entry_id: i64) -> Result<()> {
        self.storage.delete(&self.user_id, entry_id)?;
        tracing::debug!(entry_id, "entry deleted");
        Ok(())
    }

    /// Rotate the master password.
    ///
    /// Every entry is decrypted with the current key and resealed under
    /// the new one before anything is written.  The new credentials and
    /// entries are then committed together.  If any entry cannot be
    /// decrypted, or the commit fails, nothing changes.  The identity
    /// keeps the params it was registered with.
    pub fn change_password(&mut self, current: &str, new_password: &str) -> Result<()> {
        if new_password.is_empty() {
            return Err(KeySealError::InvalidInput("password cannot be empty".into()));
        }

        let credentials = self.storage.fetch_credentials(&self.user_id)?;
        if !self
            .service
            .authenticate(current, &credentials.salt, &credentials.auth_hash)?
        {
            return Err(KeySealError::InvalidCredentials);
        }

        let new_credentials = self.service.register(new_password)?;
        let new_key = self
            .service
            .encryption_key(new_password, &new_credentials.salt)?;

        let mut resealed = Vec::new();
        for mut entry in self.storage.list(&self.user_id)? {
            let secret = self
                .service
                .decrypt_secret(&entry.envelope, &self.key)
                .map_err(|e| {
                    tracing::error!(entry_id = entry.id, error = %e, "cannot reseal entry");
                    KeySealError::CommandFailed(format!(
                        "entry {} could not be decrypted; password unchanged",
                        entry.id
                    ))
                })?;
            entry.envelope = self.service.encrypt_secret(&secret, &new_key)?;
            resealed.push(entry);
        }

        self.storage
            .commit_rotation(&self.user_id, &new_credentials, &resealed)?;
        self.key = new_key;

        tracing::info!(user = %self.user_id, entries = resealed.len(), "master password changed");
        Ok(())
    }
}
