//! Password-based key derivation with context separation.
//!
//! A master password and a per-identity salt are stretched by a slow,
//! salted KDF.  The `ContextTag` label is appended to the salt before
//! stretching, so the same password + salt yields unrelated keys for
//! login verification and for vault encryption.
//!
//! Two algorithms are supported:
//! - PBKDF2-HMAC-SHA256 (default, iteration count configurable)
//! - Argon2id (memory-hard, parameters configurable)

use std::fmt;
use std::str::FromStr;

use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use super::keys::DerivedKey;
use super::random::random_array;
use crate::errors::{KeySealError, Result};

/// Length of generated salts in bytes (256 bits).
pub const SALT_LEN: usize = 32;

/// Shortest salt accepted by `derive`.
pub const MIN_SALT_LEN: usize = 16;

/// Default derived key length in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// Accepted range for `output_length`.
const MIN_OUTPUT_LEN: usize = 16;
const MAX_OUTPUT_LEN: usize = 64;

/// Default PBKDF2 iteration count.
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 200_000;

/// Lowest PBKDF2 iteration count we are willing to run.
pub const MIN_PBKDF2_ITERATIONS: u32 = 10_000;

/// Minimum safe Argon2 memory cost in KiB (8 MB).
const MIN_MEMORY_KIB: u32 = 8_192;

/// Purpose a derived key is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextTag {
    /// Login verification hash.
    Auth,
    /// Vault entry encryption key.
    Encryption,
}

impl ContextTag {
    /// Bytes mixed into the salt for this context.
    pub const fn label(self) -> &'static [u8] {
        match self {
            Self::Auth => b"keyseal-auth",
            Self::Encryption => b"keyseal-encryption",
        }
    }
}

/// Configurable Argon2id parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argon2Params {
    /// Memory cost in KiB (default: 65 536 = 64 MB).
    pub memory_kib: u32,
    /// Number of iterations (default: 3).
    pub iterations: u32,
    /// Parallelism lanes (default: 4).
    pub parallelism: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_kib: 65_536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

/// Name of a KDF algorithm as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KdfKind {
    #[default]
    #[serde(rename = "pbkdf2-sha256")]
    Pbkdf2Sha256,
    #[serde(rename = "argon2id")]
    Argon2id,
}

impl FromStr for KdfKind {
    type Err = KeySealError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pbkdf2-sha256" | "pbkdf2" => Ok(Self::Pbkdf2Sha256),
            "argon2id" | "argon2" => Ok(Self::Argon2id),
            other => Err(KeySealError::ConfigError(format!(
                "unknown KDF '{other}' (expected pbkdf2-sha256 or argon2id)"
            ))),
        }
    }
}

impl fmt::Display for KdfKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pbkdf2Sha256 => f.write_str("pbkdf2-sha256"),
            Self::Argon2id => f.write_str("argon2id"),
        }
    }
}

/// A fully parameterised derivation algorithm.
///
/// Serialized with an `algorithm` tag so a stored identity records the
/// exact parameters it was registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "algorithm")]
pub enum KdfAlgorithm {
    #[serde(rename = "pbkdf2-sha256")]
    Pbkdf2Sha256 { iterations: u32 },
    #[serde(rename = "argon2id")]
    Argon2id(Argon2Params),
}

impl Default for KdfAlgorithm {
    fn default() -> Self {
        Self::Pbkdf2Sha256 {
            iterations: DEFAULT_PBKDF2_ITERATIONS,
        }
    }
}

impl KdfAlgorithm {
    /// Reject parameters too weak to impose a meaningful cost per guess.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Pbkdf2Sha256 { iterations } => {
                if *iterations < MIN_PBKDF2_ITERATIONS {
                    return Err(KeySealError::InvalidInput(format!(
                        "PBKDF2 iterations must be at least {MIN_PBKDF2_ITERATIONS} (got {iterations})"
                    )));
                }
            }
            Self::Argon2id(p) => {
                if p.memory_kib < MIN_MEMORY_KIB {
                    return Err(KeySealError::InvalidInput(format!(
                        "Argon2 memory_kib must be at least {MIN_MEMORY_KIB} (got {})",
                        p.memory_kib
                    )));
                }
                if p.iterations < 1 {
                    return Err(KeySealError::InvalidInput(
                        "Argon2 iterations must be at least 1".into(),
                    ));
                }
                if p.parallelism < 1 {
                    return Err(KeySealError::InvalidInput(
                        "Argon2 parallelism must be at least 1".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    fn kind(&self) -> KdfKind {
        match self {
            Self::Pbkdf2Sha256 { .. } => KdfKind::Pbkdf2Sha256,
            Self::Argon2id(_) => KdfKind::Argon2id,
        }
    }
}

/// Stateless password-to-key derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDerivationService {
    algorithm: KdfAlgorithm,
}

impl Default for KeyDerivationService {
    fn default() -> Self {
        Self {
            algorithm: KdfAlgorithm::default(),
        }
    }
}

impl KeyDerivationService {
    /// Build a service, validating the algorithm parameters once up front.
    pub fn new(algorithm: KdfAlgorithm) -> Result<Self> {
        algorithm.validate()?;
        Ok(Self { algorithm })
    }

    pub fn algorithm(&self) -> KdfAlgorithm {
        self.algorithm
    }

    /// Derive `output_length` bytes from `password`, `salt`, and `context`.
    ///
    /// Identical inputs always produce identical output.  A wrong
    /// password is not an error here; it just produces a different key.
    pub fn derive(
        &self,
        password: &str,
        salt: &[u8],
        context: ContextTag,
        output_length: usize,
    ) -> Result<DerivedKey> {
        if password.is_empty() {
            return Err(KeySealError::InvalidInput(
                "password must not be empty".into(),
            ));
        }
        if salt.len() < MIN_SALT_LEN {
            return Err(KeySealError::InvalidInput(format!(
                "salt must be at least {MIN_SALT_LEN} bytes (got {})",
                salt.len()
            )));
        }
        if !(MIN_OUTPUT_LEN..=MAX_OUTPUT_LEN).contains(&output_length) {
            return Err(KeySealError::InvalidInput(format!(
                "output length must be between {MIN_OUTPUT_LEN} and {MAX_OUTPUT_LEN} (got {output_length})"
            )));
        }

        tracing::debug!(
            algorithm = %self.algorithm.kind(),
            ?context,
            output_length,
            "deriving password key"
        );

        // salt || context label
        let label = context.label();
        let mut salted = Zeroizing::new(Vec::with_capacity(salt.len() + label.len()));
        salted.extend_from_slice(salt);
        salted.extend_from_slice(label);

        let mut out = vec![0u8; output_length];
        match self.algorithm {
            KdfAlgorithm::Pbkdf2Sha256 { iterations } => {
                pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), &salted, iterations, &mut out);
            }
            KdfAlgorithm::Argon2id(p) => {
                let params = Params::new(p.memory_kib, p.iterations, p.parallelism, Some(output_length))
                    .map_err(|e| KeySealError::InvalidInput(format!("invalid Argon2 params: {e}")))?;
                Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
                    .hash_password_into(password.as_bytes(), &salted, &mut out)
                    .map_err(|e| {
                        KeySealError::InvalidInput(format!("Argon2id hashing failed: {e}"))
                    })?;
            }
        }

        Ok(DerivedKey::new(out))
    }
}

/// Generate a cryptographically random 32-byte salt.
pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    random_array()
}
