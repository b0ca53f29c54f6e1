use thiserror::Error;

/// All errors that can occur in keyseal.
#[derive(Debug, Error)]
pub enum KeySealError {
    // --- Crypto errors ---
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Tag verification failed. Wrong key and tampered data are
    /// deliberately indistinguishable.
    #[error("Could not decrypt: wrong key or corrupted data")]
    AuthenticationFailure,

    #[error("Incompatible curve: own key is {own}, peer key is {peer}")]
    IncompatibleCurve { own: String, peer: String },

    #[error("Invalid key encoding: {0}")]
    InvalidKeyEncoding(String),

    #[error("Entropy source unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    // --- Identity / vault errors ---
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User '{0}' not found")]
    UserNotFound(String),

    #[error("User '{0}' already exists")]
    UserAlreadyExists(String),

    #[error("Entry {0} not found")]
    EntryNotFound(i64),

    #[error("Storage error: {0}")]
    Storage(String),

    // --- Config errors ---
    #[error("Config error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

impl KeySealError {
    /// Text safe to show an end user.
    ///
    /// Decryption and credential failures collapse to fixed messages so
    /// nothing about salts, parameters, or tag-vs-key mismatches leaks.
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthenticationFailure | Self::MalformedEnvelope(_) => {
                "could not decrypt".to_string()
            }
            Self::InvalidCredentials | Self::UserNotFound(_) => "invalid credentials".to_string(),
            other => other.to_string(),
        }
    }

    /// Returns `true` when the process should stop issuing key material.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::EntropyUnavailable(_))
    }
}

impl From<rusqlite::Error> for KeySealError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

/// Convenience type alias for keyseal results.
pub type Result<T> = std::result::Result<T, KeySealError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decryption_failures_share_one_user_message() {
        let tag = KeySealError::AuthenticationFailure.user_message();
        let short = KeySealError::MalformedEnvelope("3 bytes".into()).user_message();
        assert_eq!(tag, short);
        assert_eq!(tag, "could not decrypt");
    }

    #[test]
    fn unknown_user_reads_like_wrong_password() {
        assert_eq!(
            KeySealError::UserNotFound("alice".into()).user_message(),
            KeySealError::InvalidCredentials.user_message()
        );
    }

    #[test]
    fn only_entropy_failure_is_fatal() {
        assert!(KeySealError::EntropyUnavailable("no rng".into()).is_fatal());
        assert!(!KeySealError::AuthenticationFailure.is_fatal());
        assert!(!KeySealError::InvalidInput("x".into()).is_fatal());
    }
}
