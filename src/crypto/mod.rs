//! Cryptographic primitives for keyseal.
//!
//! This module provides:
//! - OS randomness with a typed failure (`random`)
//! - Zeroizing key containers and HKDF expansion (`keys`)
//! - Password-based key derivation with context tags (`kdf`)
//! - Nonce-prefixed symmetric envelopes (`envelope`)
//! - ECDH key pairs, PEM import/export, and session keys (`agreement`)

pub mod agreement;
pub mod envelope;
pub mod kdf;
pub mod keys;
pub mod random;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{SymmetricEnvelope, KeyDerivationService, ...};
pub use agreement::{
    agree, derive_session_key, export_private, export_public, generate_keypair, import_private,
    import_public, Curve, KeyAgreement, KeyPair, PublicKey, SESSION_KEY_INFO,
};
pub use envelope::{CipherMode, Envelope, SymmetricEnvelope};
pub use kdf::{
    generate_salt, Argon2Params, ContextTag, KdfAlgorithm, KdfKind, KeyDerivationService,
};
pub use keys::{DerivedKey, SharedSecret};
