//! Random password generation from the OS CSPRNG.

use rand::Rng;
use zeroize::Zeroizing;

use crate::crypto::random::os_seeded_rng;
use crate::errors::{KeySealError, Result};

pub const DEFAULT_LENGTH: usize = 16;
pub const MIN_LENGTH: usize = 8;
pub const MAX_LENGTH: usize = 128;

const LETTERS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";
const PUNCTUATION: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Which character classes a generated password draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub letters: bool,
    pub digits: bool,
    pub punctuation: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            letters: true,
            digits: true,
            punctuation: true,
        }
    }
}

impl PasswordPolicy {
    fn alphabet(&self) -> Vec<u8> {
        let mut out = Vec::new();
        if self.letters {
            out.extend_from_slice(LETTERS.as_bytes());
        }
        if self.digits {
            out.extend_from_slice(DIGITS.as_bytes());
        }
        if self.punctuation {
            out.extend_from_slice(PUNCTUATION.as_bytes());
        }
        out
    }
}

/// Generate a password of `length` characters.
///
/// Each character is drawn uniformly from the policy's alphabet.
pub fn generate_password(length: usize, policy: PasswordPolicy) -> Result<Zeroizing<String>> {
    if !(MIN_LENGTH..=MAX_LENGTH).contains(&length) {
        return Err(KeySealError::InvalidInput(format!(
            "password length must be between {MIN_LENGTH} and {MAX_LENGTH} (got {length})"
        )));
    }
    let alphabet = policy.alphabet();
    if alphabet.is_empty() {
        return Err(KeySealError::InvalidInput(
            "at least one character class must be enabled".into(),
        ));
    }

    let mut rng = os_seeded_rng()?;
    let mut out = Zeroizing::new(String::with_capacity(length));
    for _ in 0..length {
        out.push(alphabet[rng.random_range(0..alphabet.len())] as char);
    }

    tracing::debug!(length, "generated password");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn default_length_and_charset() {
        let pw = generate_password(DEFAULT_LENGTH, PasswordPolicy::default()).unwrap();
        assert_eq!(pw.len(), 16);
        assert!(pw.chars().all(|c| c.is_ascii_graphic()));
    }

    #[test]
    fn respects_policy() {
        let digits_only = PasswordPolicy {
            letters: false,
            digits: true,
            punctuation: false,
        };
        let pw = generate_password(32, digits_only).unwrap();
        assert!(pw.chars().all(|c| c.is_ascii_digit()));

        let alnum = PasswordPolicy {
            punctuation: false,
            ..PasswordPolicy::default()
        };
        let pw = generate_password(64, alnum).unwrap();
        assert!(pw.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn rejects_out_of_range_length() {
        assert!(generate_password(7, PasswordPolicy::default()).is_err());
        assert!(generate_password(129, PasswordPolicy::default()).is_err());
        assert!(generate_password(128, PasswordPolicy::default()).is_ok());
    }

    #[test]
    fn rejects_empty_policy() {
        let none = PasswordPolicy {
            letters: false,
            digits: false,
            punctuation: false,
        };
        assert!(matches!(
            generate_password(16, none),
            Err(KeySealError::InvalidInput(_))
        ));
    }

    #[test]
    fn every_class_shows_up_over_many_draws() {
        let pw = generate_password(MAX_LENGTH, PasswordPolicy::default()).unwrap();
        assert!(pw.chars().any(|c| c.is_ascii_alphabetic()));
        assert!(pw.chars().any(|c| c.is_ascii_digit()));
        assert!(pw.chars().any(|c| c.is_ascii_punctuation()));
    }

    #[test]
    fn outputs_differ() {
        let seen: HashSet<String> = (0..50)
            .map(|_| generate_password(16, PasswordPolicy::default()).unwrap().as_str().to_string())
            .collect();
        assert_eq!(seen.len(), 50);
    }
}
