//! Vault entry types.
//!
//! Each entry holds the site and account it belongs to, the sealed
//! secret (as an `Envelope`), and descriptive metadata.  Only the
//! secret value is encrypted; everything else is stored in the clear
//! so entries can be listed without the encryption key.

use chrono::{DateTime, Utc};
use serde::Serialize;
use zeroize::Zeroizing;

use crate::crypto::Envelope;
use crate::errors::Result;

/// Category assigned when none is given.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// A single stored credential.
#[derive(Debug, Clone)]
pub struct VaultEntry {
    /// Storage-assigned id (0 until inserted).
    pub id: i64,

    /// Site or service identifier (e.g. "github.com").
    pub site: String,

    /// Account identifier at that site (e.g. a username or email).
    pub account: String,

    /// The sealed secret value (nonce + ciphertext + tag).
    pub envelope: Envelope,

    pub notes: Option<String>,

    pub category: String,

    pub favorite: bool,

    /// When this entry was first created.
    pub created_at: DateTime<Utc>,

    /// When this entry was last updated.
    pub updated_at: DateTime<Utc>,
}

impl VaultEntry {
    /// Metadata view without the envelope.
    pub fn metadata(&self) -> EntryMetadata {
        EntryMetadata {
            id: self.id,
            site: self.site.clone(),
            account: self.account.clone(),
            notes: self.notes.clone(),
            category: self.category.clone(),
            favorite: self.favorite,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Lightweight metadata about an entry (no envelope).
///
/// Returned by listings so callers can display entries without
/// touching any ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryMetadata {
    pub id: i64,
    pub site: String,
    pub account: String,
    pub notes: Option<String>,
    pub category: String,
    pub favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of decrypting one entry during a listing.
///
/// A failure here is local to this entry; the rest of the listing is
/// unaffected.
pub struct DecryptedEntry {
    pub metadata: EntryMetadata,
    pub secret: Result<Zeroizing<String>>,
}

/// Fields for a new entry.
#[derive(Clone, Default)]
pub struct NewEntry {
    pub site: String,
    pub account: String,
    pub secret: Zeroizing<String>,
    pub notes: Option<String>,
    pub category: Option<String>,
    pub favorite: bool,
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Clone, Default)]
pub struct EntryUpdate {
    pub site: Option<String>,
    pub account: Option<String>,
    pub secret: Option<Zeroizing<String>>,
    pub notes: Option<String>,
    pub category: Option<String>,
    pub favorite: Option<bool>,
}

impl EntryUpdate {
    pub fn is_empty(&self) -> bool {
        self.site.is_none()
            && self.account.is_none()
            && self.secret.is_none()
            && self.notes.is_none()
            && self.category.is_none()
            && self.favorite.is_none()
    }
}
