//! In-memory key material and HKDF-SHA256 expansion.
//!
//! `DerivedKey` and `SharedSecret` wipe their bytes on drop and never
//! print their contents through `Debug`.  Keys derived from a password
//! or an ECDH exchange live only as long as the operation (or session)
//! that needed them.

use std::fmt;

use hkdf::Hkdf;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::errors::{KeySealError, Result};

/// Fixed-length symmetric key material produced by a KDF.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    bytes: Vec<u8>,
}

impl DerivedKey {
    /// Wrap raw key bytes.  The caller's buffer is moved, not copied.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Access the raw key bytes (e.g. to hand to a cipher).
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Copy the key out as a plain vector, e.g. for persisting an auth hash.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

impl ConstantTimeEq for DerivedKey {
    fn ct_eq(&self, other: &Self) -> subtle::Choice {
        self.bytes.as_slice().ct_eq(other.bytes.as_slice())
    }
}

impl PartialEq for DerivedKey {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for DerivedKey {}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DerivedKey([REDACTED; {}])", self.bytes.len())
    }
}

/// Raw ECDH output.  Never used directly as a cipher key.
pub struct SharedSecret {
    bytes: Zeroizing<Vec<u8>>,
}

impl SharedSecret {
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Zeroizing::new(bytes),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret([REDACTED])")
    }
}

/// Maximum HKDF-SHA256 output length (255 * hash length).
const HKDF_MAX_LEN: usize = 255 * 32;

/// Run HKDF-SHA256 extract + expand over `ikm` with the given `info`.
///
/// `salt` is `None`, so HKDF uses a zero-filled salt internally; the
/// `info` string is what separates independent keys drawn from one
/// input.
pub fn hkdf_expand(ikm: &[u8], info: &[u8], length: usize) -> Result<DerivedKey> {
    if length == 0 || length > HKDF_MAX_LEN {
        return Err(KeySealError::InvalidInput(format!(
            "HKDF output length must be between 1 and {HKDF_MAX_LEN} (got {length})"
        )));
    }

    let hk = Hkdf::<Sha256>::new(None, ikm);

    let mut okm = vec![0u8; length];
    hk.expand(info, &mut okm)
        .map_err(|e| KeySealError::InvalidInput(format!("HKDF expand failed: {e}")))?;

    Ok(DerivedKey::new(okm))
}
