//! Symmetric encryption of opaque payloads into self-contained envelopes.
//!
//! Every call to `seal` draws a fresh random nonce (or IV) and prepends
//! it to the ciphertext, so opening needs nothing but the envelope bytes
//! and the key.
//!
//! Envelope layout:
//!
//! ```text
//! AesGcm                  [ 12-byte nonce | ciphertext | 16-byte tag ]
//! UnauthenticatedAesCbc   [ 16-byte IV    | PKCS#7 padded ciphertext ]
//! ```
//!
//! AES-128 or AES-256 is picked from the key length (16 or 32 bytes).
//!
//! `UnauthenticatedAesCbc` provides confidentiality WITHOUT integrity.
//! Opening with the wrong key may "succeed" and return garbage, and a
//! tampered envelope is not detected.  It exists only for reading
//! legacy data and must be selected by name.

use std::fmt;
use std::str::FromStr;

use aes::{Aes128, Aes256};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes128Gcm, Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, InvalidLength, KeyIvInit};
use serde::{Deserialize, Serialize};

use super::random::fill_random;
use crate::errors::{KeySealError, Result};

/// Size of the AES-GCM nonce in bytes.
pub const GCM_NONCE_LEN: usize = 12;

/// Size of the AES-GCM authentication tag in bytes.
pub const GCM_TAG_LEN: usize = 16;

/// AES block size, which is also the CBC IV size.
pub const AES_BLOCK_LEN: usize = 16;

/// Cipher policy used by a `SymmetricEnvelope`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CipherMode {
    /// AES-GCM, authenticated.
    #[default]
    #[serde(rename = "aes-gcm")]
    AesGcm,
    /// Legacy AES-CBC with PKCS#7 padding.  No tamper detection.
    #[serde(rename = "aes-cbc-unauthenticated")]
    UnauthenticatedAesCbc,
}

impl CipherMode {
    pub const fn nonce_len(self) -> usize {
        match self {
            Self::AesGcm => GCM_NONCE_LEN,
            Self::UnauthenticatedAesCbc => AES_BLOCK_LEN,
        }
    }

    pub const fn tag_len(self) -> usize {
        match self {
            Self::AesGcm => GCM_TAG_LEN,
            Self::UnauthenticatedAesCbc => 0,
        }
    }

    /// Shortest envelope that is structurally valid for this mode.
    pub const fn min_envelope_len(self) -> usize {
        self.nonce_len() + self.tag_len()
    }

    pub const fn is_authenticated(self) -> bool {
        matches!(self, Self::AesGcm)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::AesGcm => "aes-gcm",
            Self::UnauthenticatedAesCbc => "aes-cbc-unauthenticated",
        }
    }
}

impl fmt::Display for CipherMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CipherMode {
    type Err = KeySealError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aes-gcm" | "aes-256-gcm" => Ok(Self::AesGcm),
            "aes-cbc-unauthenticated" => Ok(Self::UnauthenticatedAesCbc),
            other => Err(KeySealError::ConfigError(format!(
                "unknown cipher mode '{other}' (expected aes-gcm or aes-cbc-unauthenticated)"
            ))),
        }
    }
}

/// Sealed payload: nonce/IV, ciphertext, and tag (if authenticated).
///
/// Serializes as a base64 string.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope(
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")] Vec<u8>,
);

impl Envelope {
    /// Wrap bytes read from storage.  Structure is checked on `open`.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encode for transport across a text boundary.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.0)
    }

    /// Decode an envelope received as base64 text.
    pub fn from_base64(text: &str) -> Result<Self> {
        BASE64
            .decode(text.trim())
            .map(Self)
            .map_err(|e| KeySealError::MalformedEnvelope(format!("invalid base64: {e}")))
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Envelope({} bytes)", self.0.len())
    }
}

/// Seals and opens envelopes under one cipher policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SymmetricEnvelope {
    mode: CipherMode,
}

impl SymmetricEnvelope {
    pub fn new(mode: CipherMode) -> Self {
        if !mode.is_authenticated() {
            tracing::warn!(
                mode = %mode,
                "unauthenticated cipher mode selected; envelopes are not tamper-evident"
            );
        }
        Self { mode }
    }

    /// The authenticated default.
    pub fn authenticated() -> Self {
        Self::new(CipherMode::AesGcm)
    }

    /// Legacy AES-CBC.  Confidentiality only: a successful `open` does
    /// not prove the key was right or the data untouched.
    pub fn unauthenticated_legacy() -> Self {
        Self::new(CipherMode::UnauthenticatedAesCbc)
    }

    pub fn mode(&self) -> CipherMode {
        self.mode
    }

    /// Encrypt `plaintext` under `key` with a fresh random nonce.
    pub fn seal(&self, key: &[u8], plaintext: &[u8]) -> Result<Envelope> {
        check_key_len(key)?;

        let mut nonce = vec![0u8; self.mode.nonce_len()];
        fill_random(&mut nonce)?;

        let body = match self.mode {
            CipherMode::AesGcm => gcm_encrypt(key, &nonce, plaintext)?,
            CipherMode::UnauthenticatedAesCbc => cbc_encrypt(key, &nonce, plaintext)?,
        };

        tracing::trace!(mode = %self.mode, plaintext_len = plaintext.len(), "sealed envelope");

        // Prepend the nonce so the caller only needs to store one blob.
        let mut output = Vec::with_capacity(nonce.len() + body.len());
        output.extend_from_slice(&nonce);
        output.extend_from_slice(&body);
        Ok(Envelope(output))
    }

    /// Decrypt an envelope produced by `seal` under the same mode.
    pub fn open(&self, key: &[u8], envelope: &Envelope) -> Result<Vec<u8>> {
        let data = envelope.as_bytes();

        // Structural checks happen before any key is touched.
        let min = self.mode.min_envelope_len();
        if data.len() < min {
            return Err(KeySealError::MalformedEnvelope(format!(
                "{} bytes is shorter than the {min}-byte minimum for {}",
                data.len(),
                self.mode
            )));
        }

        let (nonce, body) = data.split_at(self.mode.nonce_len());

        if self.mode == CipherMode::UnauthenticatedAesCbc
            && (body.is_empty() || body.len() % AES_BLOCK_LEN != 0)
        {
            return Err(KeySealError::MalformedEnvelope(format!(
                "CBC body of {} bytes is not a whole number of blocks",
                body.len()
            )));
        }

        check_key_len(key)?;

        match self.mode {
            CipherMode::AesGcm => gcm_decrypt(key, nonce, body),
            CipherMode::UnauthenticatedAesCbc => cbc_decrypt(key, nonce, body),
        }
    }
}

fn check_key_len(key: &[u8]) -> Result<()> {
    match key.len() {
        16 | 32 => Ok(()),
        n => Err(KeySealError::InvalidInput(format!(
            "cipher key must be 16 or 32 bytes (got {n})"
        ))),
    }
}

fn gcm_encrypt(key: &[u8], nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let nonce = Nonce::from_slice(nonce);
    let sealed = match key.len() {
        16 => Aes128Gcm::new_from_slice(key)
            .map_err(|e| KeySealError::InvalidInput(format!("invalid key length: {e}")))?
            .encrypt(nonce, plaintext),
        _ => Aes256Gcm::new_from_slice(key)
            .map_err(|e| KeySealError::InvalidInput(format!("invalid key length: {e}")))?
            .encrypt(nonce, plaintext),
    };
    sealed.map_err(|e| KeySealError::EncryptionFailed(format!("encryption error: {e}")))
}

fn gcm_decrypt(key: &[u8], nonce: &[u8], body: &[u8]) -> Result<Vec<u8>> {
    let nonce = Nonce::from_slice(nonce);
    let opened = match key.len() {
        16 => Aes128Gcm::new_from_slice(key)
            .map_err(|_| KeySealError::AuthenticationFailure)?
            .decrypt(nonce, body),
        _ => Aes256Gcm::new_from_slice(key)
            .map_err(|_| KeySealError::AuthenticationFailure)?
            .decrypt(nonce, body),
    };
    // Wrong key and tampered data take the same path.
    opened.map_err(|_| KeySealError::AuthenticationFailure)
}

fn cbc_encrypt(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let invalid = |e: InvalidLength| KeySealError::InvalidInput(format!("invalid key or IV length: {e}"));
    Ok(match key.len() {
        16 => cbc::Encryptor::<Aes128>::new_from_slices(key, iv)
            .map_err(invalid)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        _ => cbc::Encryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(invalid)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
    })
}

fn cbc_decrypt(key: &[u8], iv: &[u8], body: &[u8]) -> Result<Vec<u8>> {
    let opened = match key.len() {
        16 => cbc::Decryptor::<Aes128>::new_from_slices(key, iv)
            .map_err(|_| KeySealError::AuthenticationFailure)?
            .decrypt_padded_vec_mut::<Pkcs7>(body),
        _ => cbc::Decryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(|_| KeySealError::AuthenticationFailure)?
            .decrypt_padded_vec_mut::<Pkcs7>(body),
    };
    // Bad padding reports the same generic failure as a bad tag.
    opened.map_err(|_| KeySealError::AuthenticationFailure)
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

pub(crate) fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let encoded = BASE64.encode(data);
    serializer.serialize_str(&encoded)
}

pub(crate) fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}
