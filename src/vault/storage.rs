//! Storage collaborators consumed by the vault.
//!
//! The crypto core only ever hands these traits opaque envelopes and
//! credential blobs.  `MemoryStorage` keeps everything in process
//! memory; `SqliteStorage` (in `sqlite.rs`) persists to disk.

use std::collections::HashMap;

use crate::errors::{KeySealError, Result};

use super::entry::VaultEntry;
use super::service::Credentials;

/// Where per-user login credentials live.
pub trait IdentityStorage {
    /// Insert or replace the credentials for `user_id`.
    fn store_credentials(&mut self, user_id: &str, credentials: &Credentials) -> Result<()>;

    /// Fails with `UserNotFound` when nothing is stored for `user_id`.
    fn fetch_credentials(&self, user_id: &str) -> Result<Credentials>;

    fn user_exists(&self, user_id: &str) -> Result<bool> {
        match self.fetch_credentials(user_id) {
            Ok(_) => Ok(true),
            Err(KeySealError::UserNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Where sealed vault entries live, scoped per user.
pub trait VaultStorage {
    /// Store a new entry and return its assigned id.  `entry.id` is ignored.
    fn insert(&mut self, user_id: &str, entry: &VaultEntry) -> Result<i64>;

    /// Replace an existing entry.  Fails with `EntryNotFound`.
    fn update(&mut self, user_id: &str, entry: &VaultEntry) -> Result<()>;

    /// Fails with `EntryNotFound`, including for another user's entry.
    fn fetch(&self, user_id: &str, entry_id: i64) -> Result<VaultEntry>;

    /// All entries for `user_id`, newest first.
    fn list(&self, user_id: &str) -> Result<Vec<VaultEntry>>;

    fn delete(&mut self, user_id: &str, entry_id: i64) -> Result<()>;

    /// Replace `user_id`'s credentials and rewrite every entry in
    /// `entries` as one unit.  On error nothing has changed.
    fn commit_rotation(
        &mut self,
        user_id: &str,
        credentials: &Credentials,
        entries: &[VaultEntry],
    ) -> Result<()>;
}

/// In-memory storage backend.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    credentials: HashMap<String, Credentials>,
    entries: HashMap<String, Vec<VaultEntry>>,
    next_id: i64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityStorage for MemoryStorage {
    fn store_credentials(&mut self, user_id: &str, credentials: &Credentials) -> Result<()> {
        self.credentials
            .insert(user_id.to_string(), credentials.clone());
        Ok(())
    }

    fn fetch_credentials(&self, user_id: &str) -> Result<Credentials> {
        self.credentials
            .get(user_id)
            .cloned()
            .ok_or_else(|| KeySealError::UserNotFound(user_id.to_string()))
    }
}

impl VaultStorage for MemoryStorage {
    fn insert(&mut self, user_id: &str, entry: &VaultEntry) -> Result<i64> {
        self.next_id += 1;
        let mut stored = entry.clone();
        stored.id = self.next_id;
        self.entries
            .entry(user_id.to_string())
            .or_default()
            .push(stored);
        Ok(self.next_id)
    }

    fn update(&mut self, user_id: &str, entry: &VaultEntry) -> Result<()> {
        let slot = self
            .entries
            .get_mut(user_id)
            .and_then(|list| list.iter_mut().find(|e| e.id == entry.id))
            .ok_or(KeySealError::EntryNotFound(entry.id))?;
        *slot = entry.clone();
        Ok(())
    }

    fn fetch(&self, user_id: &str, entry_id: i64) -> Result<VaultEntry> {
        self.entries
            .get(user_id)
            .and_then(|list| list.iter().find(|e| e.id == entry_id))
            .cloned()
            .ok_or(KeySealError::EntryNotFound(entry_id))
    }

    fn list(&self, user_id: &str) -> Result<Vec<VaultEntry>> {
        let mut list = self.entries.get(user_id).cloned().unwrap_or_default();
        list.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(list)
    }

    fn delete(&mut self, user_id: &str, entry_id: i64) -> Result<()> {
        let list = self
            .entries
            .get_mut(user_id)
            .ok_or(KeySealError::EntryNotFound(entry_id))?;
        let before = list.len();
        list.retain(|e| e.id != entry_id);
        if list.len() == before {
            return Err(KeySealError::EntryNotFound(entry_id));
        }
        Ok(())
    }

    fn commit_rotation(
        &mut self,
        user_id: &str,
        credentials: &Credentials,
        entries: &[VaultEntry],
    ) -> Result<()> {
        if !self.credentials.contains_key(user_id) {
            return Err(KeySealError::UserNotFound(user_id.to_string()));
        }

        // Build the replacement list first, then swap.
        let mut staged = self.entries.get(user_id).cloned().unwrap_or_default();
        for entry in entries {
            let slot = staged
                .iter_mut()
                .find(|e| e.id == entry.id)
                .ok_or(KeySealError::EntryNotFound(entry.id))?;
            *slot = entry.clone();
        }

        self.entries.insert(user_id.to_string(), staged);
        self.credentials
            .insert(user_id.to_string(), credentials.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::crypto::Envelope;
    use crate::vault::service::VaultParams;

    fn entry(site: &str) -> VaultEntry {
        let now = Utc::now();
        VaultEntry {
            id: 0,
            site: site.into(),
            account: "acct".into(),
            envelope: Envelope::from_bytes(vec![9; 40]),
            notes: None,
            category: "Work".into(),
            favorite: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn credentials_roundtrip_and_missing_user() {
        let mut store = MemoryStorage::new();
        let creds = Credentials {
            auth_hash: vec![1; 32],
            salt: vec![2; 32],
            params: VaultParams::default(),
        };
        store.store_credentials("alice", &creds).unwrap();
        assert_eq!(store.fetch_credentials("alice").unwrap(), creds);
        assert!(store.user_exists("alice").unwrap());
        assert!(!store.user_exists("bob").unwrap());
        assert!(matches!(
            store.fetch_credentials("bob"),
            Err(KeySealError::UserNotFound(_))
        ));
    }

    #[test]
    fn entries_are_scoped_per_user() {
        let mut store = MemoryStorage::new();
        let id = store.insert("alice", &entry("a.example")).unwrap();
        assert_eq!(store.fetch("alice", id).unwrap().site, "a.example");
        assert!(matches!(
            store.fetch("bob", id),
            Err(KeySealError::EntryNotFound(_))
        ));
        assert!(store.list("bob").unwrap().is_empty());
    }

    #[test]
    fn list_is_newest_first() {
        let mut store = MemoryStorage::new();
        store.insert("alice", &entry("first")).unwrap();
        store.insert("alice", &entry("second")).unwrap();
        let sites: Vec<_> = store
            .list("alice")
            .unwrap()
            .into_iter()
            .map(|e| e.site)
            .collect();
        assert_eq!(sites, ["second", "first"]);
    }

    #[test]
    fn update_and_delete() {
        let mut store = MemoryStorage::new();
        let id = store.insert("alice", &entry("old")).unwrap();
        let mut changed = store.fetch("alice", id).unwrap();
        changed.site = "new".into();
        store.update("alice", &changed).unwrap();
        assert_eq!(store.fetch("alice", id).unwrap().site, "new");

        store.delete("alice", id).unwrap();
        assert!(matches!(
            store.delete("alice", id),
            Err(KeySealError::EntryNotFound(_))
        ));
    }

    #[test]
    fn rotation_with_unknown_entry_changes_nothing() {
        let mut store = MemoryStorage::new();
        let old = Credentials {
            auth_hash: vec![1; 32],
            salt: vec![2; 32],
            params: VaultParams::default(),
        };
        store.store_credentials("alice", &old).unwrap();
        let id = store.insert("alice", &entry("kept")).unwrap();

        let mut rewritten = store.fetch("alice", id).unwrap();
        rewritten.envelope = Envelope::from_bytes(vec![3; 40]);
        let mut missing = rewritten.clone();
        missing.id = id + 100;

        let new = Credentials {
            auth_hash: vec![4; 32],
            salt: vec![5; 32],
            params: VaultParams::default(),
        };
        assert!(matches!(
            store.commit_rotation("alice", &new, &[rewritten.clone(), missing]),
            Err(KeySealError::EntryNotFound(_))
        ));
        assert_eq!(store.fetch_credentials("alice").unwrap(), old);
        assert_eq!(store.fetch("alice", id).unwrap().envelope.as_bytes(), &[9u8; 40][..]);

        store.commit_rotation("alice", &new, &[rewritten]).unwrap();
        assert_eq!(store.fetch_credentials("alice").unwrap(), new);
        assert_eq!(store.fetch("alice", id).unwrap().envelope.as_bytes(), &[3u8; 40][..]);
    }
}
