//! Per-user encrypted credential storage.
//!
//! This module provides:
//! - Entry types (`entry`)
//! - `VaultCryptoService`: credentials and per-entry sealing (`service`)
//! - Storage traits and the in-memory backend (`storage`)
//! - The SQLite backend (`sqlite`)
//! - `VaultSession`: an unlocked vault for one user (`session`)

pub mod entry;
pub mod service;
pub mod session;
pub mod sqlite;
pub mod storage;

// Re-export the most commonly used items.
pub use entry::{DecryptedEntry, EntryMetadata, EntryUpdate, NewEntry, VaultEntry, DEFAULT_CATEGORY};
pub use service::{Credentials, VaultCryptoService, VaultParams};
pub use session::{register_user, VaultSession};
pub use sqlite::SqliteStorage;
pub use storage::{IdentityStorage, MemoryStorage, VaultStorage};
