//! SQLite-backed storage for credentials and sealed entries.
//!
//! Two tables live in one database file:
//!
//! - `users`: user id, auth hash, salt, registration params (JSON)
//! - `entries`: site, account, envelope BLOB, metadata, timestamps
//!
//! Only envelopes and auth hashes are written.  The encryption key
//! never reaches this layer.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::crypto::Envelope;
use crate::errors::{KeySealError, Result};

use super::entry::VaultEntry;
use super::service::{Credentials, VaultParams};
use super::storage::{IdentityStorage, VaultStorage};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    auth_hash   BLOB NOT NULL,
    salt        BLOB NOT NULL,
    params      TEXT NOT NULL,
    created_at  TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS entries (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     TEXT NOT NULL REFERENCES users(user_id),
    site        TEXT NOT NULL,
    account     TEXT NOT NULL,
    envelope    BLOB NOT NULL,
    notes       TEXT,
    category    TEXT NOT NULL,
    favorite    INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS entries_user ON entries(user_id);
";

const ENTRY_COLUMNS: &str =
    "id, site, account, envelope, notes, category, favorite, created_at, updated_at";

/// SQLite storage backend.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // Set restrictive permissions on the database (owner-only).
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(path, perms)?;
        }

        Self::init(conn)
    }

    /// A private database that disappears with the handle.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        tracing::debug!("sqlite storage ready");
        Ok(Self { conn })
    }
}

fn parse_timestamp(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))
}

fn update_entry_row(conn: &Connection, user_id: &str, entry: &VaultEntry) -> Result<()> {
    let changed = conn.execute(
        "UPDATE entries SET site = ?1, account = ?2, envelope = ?3, notes = ?4,
                category = ?5, favorite = ?6, updated_at = ?7
         WHERE user_id = ?8 AND id = ?9",
        params![
            entry.site,
            entry.account,
            entry.envelope.as_bytes(),
            entry.notes,
            entry.category,
            entry.favorite,
            entry.updated_at.to_rfc3339(),
            user_id,
            entry.id,
        ],
    )?;
    if changed == 0 {
        return Err(KeySealError::EntryNotFound(entry.id));
    }
    Ok(())
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<VaultEntry> {
    let created: String = row.get(7)?;
    let updated: String = row.get(8)?;
    Ok(VaultEntry {
        id: row.get(0)?,
        site: row.get(1)?,
        account: row.get(2)?,
        envelope: Envelope::from_bytes(row.get(3)?),
        notes: row.get(4)?,
        category: row.get(5)?,
        favorite: row.get(6)?,
        created_at: parse_timestamp(&created)?,
        updated_at: parse_timestamp(&updated)?,
    })
}

impl IdentityStorage for SqliteStorage {
    fn store_credentials(&mut self, user_id: &str, credentials: &Credentials) -> Result<()> {
        self.conn.execute(
            "INSERT INTO users (user_id, auth_hash, salt, params, created_at) VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id) DO UPDATE SET
                auth_hash = excluded.auth_hash, salt = excluded.salt, params = excluded.params",
            params![
                user_id,
                credentials.auth_hash,
                credentials.salt,
                credentials.params.to_json()?,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    fn fetch_credentials(&self, user_id: &str) -> Result<Credentials> {
        let row: Option<(Vec<u8>, Vec<u8>, String)> = self
            .conn
            .query_row(
                "SELECT auth_hash, salt, params FROM users WHERE user_id = ?1",
                params![user_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let (auth_hash, salt, raw_params) =
            row.ok_or_else(|| KeySealError::UserNotFound(user_id.to_string()))?;
        Ok(Credentials {
            auth_hash,
            salt,
            params: VaultParams::from_json(&raw_params)?,
        })
    }
}

impl VaultStorage for SqliteStorage {
    fn insert(&mut self, user_id: &str, entry: &VaultEntry) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO entries (user_id, site, account, envelope, notes, category, favorite, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                user_id,
                entry.site,
                entry.account,
                entry.envelope.as_bytes(),
                entry.notes,
                entry.category,
                entry.favorite,
                entry.created_at.to_rfc3339(),
                entry.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&mut self, user_id: &str, entry: &VaultEntry) -> Result<()> {
        update_entry_row(&self.conn, user_id, entry)
    }

    fn fetch(&self, user_id: &str, entry_id: i64) -> Result<VaultEntry> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE user_id = ?1 AND id = ?2");
        self.conn
            .query_row(&sql, params![user_id, entry_id], entry_from_row)
            .optional()?
            .ok_or(KeySealError::EntryNotFound(entry_id))
    }

    fn list(&self, user_id: &str) -> Result<Vec<VaultEntry>> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE user_id = ?1 ORDER BY id DESC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], entry_from_row)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    fn delete(&mut self, user_id: &str, entry_id: i64) -> Result<()> {
        let changed = self.conn.execute(
            "DELETE FROM entries WHERE user_id = ?1 AND id = ?2",
            params![user_id, entry_id],
        )?;
        if changed == 0 {
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
        let tx = self.conn.transaction()?;

        let changed = tx.execute(
            "UPDATE users SET auth_hash = ?1, salt = ?2, params = ?3 WHERE user_id = ?4",
            params![
                credentials.auth_hash,
                credentials.salt,
                credentials.params.to_json()?,
                user_id
            ],
        )?;
        if changed == 0 {
            return Err(KeySealError::UserNotFound(user_id.to_string()));
        }

        for entry in entries {
            update_entry_row(&tx, user_id, entry)?;
        }

        tx.commit()?;
        tracing::debug!(entries = entries.len(), "rotation committed");
        Ok(())
    }
}
