//! Two-party message encryption over an ECDH session key.
//!
//! The sender combines their own private key with the recipient's
//! public key; the recipient does the reverse.  Both sides land on the
//! same HKDF-derived session key and exchange ordinary envelopes.

use crate::config::Settings;
use crate::crypto::kdf::KEY_LEN;
use crate::crypto::{DerivedKey, Envelope, KeyAgreement, KeyPair, PublicKey, SymmetricEnvelope};
use crate::errors::{KeySealError, Result};

/// Sends and receives envelopes between two key holders.
#[derive(Debug, Clone, Copy)]
pub struct MessagingCryptoService {
    agreement: KeyAgreement,
    envelope: SymmetricEnvelope,
    key_length: usize,
}

impl Default for MessagingCryptoService {
    fn default() -> Self {
        Self {
            agreement: KeyAgreement::default(),
            envelope: SymmetricEnvelope::authenticated(),
            key_length: KEY_LEN,
        }
    }
}

impl MessagingCryptoService {
    /// `key_length` must be a valid AES key size (16 or 32).
    pub fn new(
        agreement: KeyAgreement,
        envelope: SymmetricEnvelope,
        key_length: usize,
    ) -> Result<Self> {
        if key_length != 16 && key_length != 32 {
            return Err(KeySealError::InvalidInput(format!(
                "key length must be 16 or 32 bytes (got {key_length})"
            )));
        }
        Ok(Self {
            agreement,
            envelope,
            key_length,
        })
    }

    /// Build from loaded settings (curve, cipher mode, key length).
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            KeyAgreement::new(settings.curve),
            SymmetricEnvelope::new(settings.cipher_mode),
            settings.key_length,
        )
    }

    pub fn agreement(&self) -> &KeyAgreement {
        &self.agreement
    }

    /// The key for one direction of the exchange.
    pub fn session_key(&self, own: &KeyPair, peer: &PublicKey) -> Result<DerivedKey> {
        self.agreement.session_key(own, peer, self.key_length)
    }

    /// Encrypt `message` for the holder of `peer`.
    pub fn send(&self, own: &KeyPair, peer: &PublicKey, message: &[u8]) -> Result<Envelope> {
        let key = self.session_key(own, peer)?;
        let sealed = self.envelope.seal(key.as_bytes(), message)?;
        tracing::debug!(
            curve = %self.agreement.curve(),
            peer = %peer.fingerprint(),
            bytes = sealed.len(),
            "message sealed"
        );
        Ok(sealed)
    }

    /// Decrypt an envelope sent by the holder of `peer`.
    ///
    /// Tampering yields `AuthenticationFailure`; truncation yields
    /// `MalformedEnvelope`.  Show users `user_message()`, which is the
    /// same for both.
    pub fn receive(&self, own: &KeyPair, peer: &PublicKey, envelope: &Envelope) -> Result<Vec<u8>> {
        let key = self.session_key(own, peer)?;
        self.envelope.open(key.as_bytes(), envelope).map_err(|e| {
            tracing::warn!(peer = %peer.fingerprint(), error = %e, "message rejected");
            e
        })
    }

    /// `send` for UTF-8 text, returning base64.
    pub fn send_text(&self, own: &KeyPair, peer: &PublicKey, message: &str) -> Result<String> {
        Ok(self.send(own, peer, message.as_bytes())?.to_base64())
    }

    /// `receive` for base64 input carrying UTF-8 text.
    pub fn receive_text(&self, own: &KeyPair, peer: &PublicKey, encoded: &str) -> Result<String> {
        let envelope = Envelope::from_base64(encoded.trim())?;
        let plaintext = self.receive(own, peer, &envelope)?;
        String::from_utf8(plaintext).map_err(|_| KeySealError::AuthenticationFailure)
    }
}
