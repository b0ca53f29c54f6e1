//! Password-derived credentials and per-entry encryption.
//!
//! `VaultCryptoService` derives two unrelated keys from one master
//! password and salt:
//!
//! - the **auth hash** (`ContextTag::Auth`), stored for login checks;
//! - the **encryption key** (`ContextTag::Encryption`), never stored and
//!   rebuilt from the password for every session.
//!
//! A leaked auth hash therefore tells an attacker nothing about the
//! encryption key beyond what brute-forcing the password would.
//!
//! The derivation and cipher parameters a user registered with are kept
//! in `Credentials::params`; later logins rebuild the service from them
//! rather than from current configuration.

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::envelope::{base64_decode, base64_encode};
use crate::crypto::kdf::{generate_salt, KEY_LEN};
use crate::crypto::{
    CipherMode, ContextTag, DerivedKey, Envelope, KdfAlgorithm, KeyDerivationService,
    SymmetricEnvelope,
};
use crate::errors::{KeySealError, Result};

use super::entry::{DecryptedEntry, VaultEntry};

/// Derivation and cipher settings an identity was registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultParams {
    pub kdf: KdfAlgorithm,
    pub key_length: usize,
    pub cipher_mode: CipherMode,
}

impl Default for VaultParams {
    fn default() -> Self {
        VaultCryptoService::default().params()
    }
}

impl VaultParams {
    /// Encode for a storage column.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| KeySealError::SerializationError(format!("vault params: {e}")))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| KeySealError::SerializationError(format!("vault params: {e}")))
    }
}

/// What the identity store persists for a user.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Auth-context derivation of the master password (base64 in JSON).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub auth_hash: Vec<u8>,

    /// Per-identity random salt (base64 in JSON).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,

    /// Settings needed to re-derive the same keys at login.
    pub params: VaultParams,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("auth_hash", &"[REDACTED]")
            .field("salt_len", &self.salt.len())
            .field("params", &self.params)
            .finish()
    }
}

/// Vault-side composition of key derivation and envelopes.
#[derive(Debug, Clone, Copy)]
pub struct VaultCryptoService {
    kdf: KeyDerivationService,
    envelope: SymmetricEnvelope,
    key_length: usize,
}

impl Default for VaultCryptoService {
    fn default() -> Self {
        Self {
            kdf: KeyDerivationService::default(),
            envelope: SymmetricEnvelope::authenticated(),
            key_length: KEY_LEN,
        }
    }
}

impl VaultCryptoService {
    /// `key_length` must be a valid AES key size (16 or 32).
    pub fn new(
        kdf: KeyDerivationService,
        envelope: SymmetricEnvelope,
        key_length: usize,
    ) -> Result<Self> {
        if key_length != 16 && key_length != 32 {
            return Err(KeySealError::InvalidInput(format!(
                "key length must be 16 or 32 bytes (got {key_length})"
            )));
        }
        Ok(Self {
            kdf,
            envelope,
            key_length,
        })
    }

    /// Rebuild the service an identity was registered with.
    pub fn from_params(params: &VaultParams) -> Result<Self> {
        Self::new(
            KeyDerivationService::new(params.kdf)?,
            SymmetricEnvelope::new(params.cipher_mode),
            params.key_length,
        )
    }

    pub fn params(&self) -> VaultParams {
        VaultParams {
            kdf: self.kdf.algorithm(),
            key_length: self.key_length,
            cipher_mode: self.envelope.mode(),
        }
    }

    pub fn envelope(&self) -> &SymmetricEnvelope {
        &self.envelope
    }

    /// Create credentials for a new identity: fresh salt + auth hash.
    pub fn register(&self, password: &str) -> Result<Credentials> {
        let salt = generate_salt()?;
        let auth = self
            .kdf
            .derive(password, &salt, ContextTag::Auth, self.key_length)?;

        tracing::info!("registered new vault credentials");

        Ok(Credentials {
            auth_hash: auth.to_vec(),
            salt: salt.to_vec(),
            params: self.params(),
        })
    }

    /// Recompute the auth hash and compare it in constant time.
    pub fn authenticate(&self, password: &str, salt: &[u8], auth_hash: &[u8]) -> Result<bool> {
        let candidate = self
            .kdf
            .derive(password, salt, ContextTag::Auth, self.key_length)?;

        let matched: bool = candidate.as_bytes().ct_eq(auth_hash).into();
        tracing::debug!(matched, "checked master password");
        Ok(matched)
    }

    /// Rebuild the session encryption key from the master password.
    pub fn encryption_key(&self, password: &str, salt: &[u8]) -> Result<DerivedKey> {
        self.kdf
            .derive(password, salt, ContextTag::Encryption, self.key_length)
    }

    /// Seal one secret value.
    pub fn encrypt_secret(&self, secret: &str, key: &DerivedKey) -> Result<Envelope> {
        self.envelope.seal(key.as_bytes(), secret.as_bytes())
    }

    /// Open one secret value.
    ///
    /// Non-UTF-8 output (possible only in the unauthenticated mode, with
    /// a wrong key) is reported as the same generic decryption failure.
    pub fn decrypt_secret(&self, envelope: &Envelope, key: &DerivedKey) -> Result<Zeroizing<String>> {
        let plaintext = self.envelope.open(key.as_bytes(), envelope)?;

        // On error, zeroize the bytes inside the error before discarding.
        String::from_utf8(plaintext).map(Zeroizing::new).map_err(|e| {
            let mut bad_bytes = e.into_bytes();
            bad_bytes.zeroize();
            KeySealError::AuthenticationFailure
        })
    }

    /// Decrypt every entry, keeping each failure with its own entry.
    pub fn decrypt_entries(&self, entries: &[VaultEntry], key: &DerivedKey) -> Vec<DecryptedEntry> {
        entries
            .iter()
            .map(|entry| {
                let secret = self.decrypt_secret(&entry.envelope, key);
                if let Err(ref e) = secret {
                    tracing::warn!(entry_id = entry.id, error = %e, "entry could not be decrypted");
                }
                DecryptedEntry {
                    metadata: entry.metadata(),
                    secret,
                }
            })
            .collect()
    }
}
