use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::{Argon2Params, KdfAlgorithm, KdfKind, DEFAULT_PBKDF2_ITERATIONS, KEY_LEN};
use crate::crypto::{CipherMode, Curve, KeyAgreement, KeyDerivationService, SymmetricEnvelope};
use crate::errors::{KeySealError, Result};
use crate::messaging::MessagingCryptoService;
use crate::vault::VaultCryptoService;

/// Project-level configuration, loaded from `.keyseal.toml`.
///
/// Every field has a sensible default so KeySeal works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Password KDF used for both auth and encryption contexts.
    #[serde(default)]
    pub kdf: KdfKind,

    /// PBKDF2 iteration count (default: 200 000).
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Argon2 memory cost in KiB (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count (default: 3).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree (default: 4).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,

    /// ECDH curve for messaging keys.
    #[serde(default)]
    pub curve: Curve,

    /// Symmetric key length in bytes: 16 (AES-128) or 32 (AES-256).
    #[serde(default = "default_key_length")]
    pub key_length: usize,

    #[serde(default)]
    pub cipher_mode: CipherMode,

    /// Directory (relative to project root) holding `vault.db`.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_kdf_iterations() -> u32 {
    DEFAULT_PBKDF2_ITERATIONS
}

fn default_argon2_memory_kib() -> u32 {
    65_536 // 64 MB
}

fn default_argon2_iterations() -> u32 {
    3
}

fn default_argon2_parallelism() -> u32 {
    4
}

fn default_key_length() -> usize {
    KEY_LEN
}

fn default_data_dir() -> String {
    ".keyseal".to_string()
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            kdf: KdfKind::default(),
            kdf_iterations: default_kdf_iterations(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
            curve: Curve::default(),
            key_length: default_key_length(),
            cipher_mode: CipherMode::default(),
            data_dir: default_data_dir(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| KeySealError::ConfigError(format!("{name}: invalid value '{raw}'")))
}

impl Settings {
    /// Name of the config file we look for in the project root.
    const FILE_NAME: &'static str = ".keyseal.toml";

    /// Database file name inside `data_dir`.
    const DB_NAME: &'static str = "vault.db";

    /// Load settings from `<project_dir>/.keyseal.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    /// The result is validated either way.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        let settings = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            toml::from_str(&contents).map_err(|e| {
                KeySealError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
            })?
        } else {
            Self::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Apply `KEYSEAL_*` overrides from an arbitrary lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = lookup("KEYSEAL_KDF") {
            self.kdf = v.parse()?;
        }
        if let Some(v) = lookup("KEYSEAL_KDF_ITERATIONS") {
            self.kdf_iterations = parse_env("KEYSEAL_KDF_ITERATIONS", &v)?;
        }
        if let Some(v) = lookup("KEYSEAL_CURVE") {
            self.curve = v.parse()?;
        }
        if let Some(v) = lookup("KEYSEAL_KEY_LENGTH") {
            self.key_length = parse_env("KEYSEAL_KEY_LENGTH", &v)?;
        }
        if let Some(v) = lookup("KEYSEAL_CIPHER_MODE") {
            self.cipher_mode = v.parse()?;
        }
        self.validate()
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Reject values the crypto layer would refuse later.
    pub fn validate(&self) -> Result<()> {
        if self.key_length != 16 && self.key_length != 32 {
            return Err(KeySealError::ConfigError(format!(
                "key_length must be 16 or 32 (got {})",
                self.key_length
            )));
        }
        self.kdf_algorithm()
            .validate()
            .map_err(|e| KeySealError::ConfigError(e.to_string()))?;
        if self.data_dir.trim().is_empty() {
            return Err(KeySealError::ConfigError("data_dir cannot be empty".into()));
        }
        Ok(())
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn argon2_params(&self) -> Argon2Params {
        Argon2Params {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }

    pub fn kdf_algorithm(&self) -> KdfAlgorithm {
        match self.kdf {
            KdfKind::Pbkdf2Sha256 => KdfAlgorithm::Pbkdf2Sha256 {
                iterations: self.kdf_iterations,
            },
            KdfKind::Argon2id => KdfAlgorithm::Argon2id(self.argon2_params()),
        }
    }

    pub fn vault_service(&self) -> Result<VaultCryptoService> {
        VaultCryptoService::new(
            KeyDerivationService::new(self.kdf_algorithm())?,
            SymmetricEnvelope::new(self.cipher_mode),
            self.key_length,
        )
    }

    pub fn messaging_service(&self) -> Result<MessagingCryptoService> {
        MessagingCryptoService::new(
            KeyAgreement::new(self.curve),
            SymmetricEnvelope::new(self.cipher_mode),
            self.key_length,
        )
    }

    /// Build the full path to the vault database.
    ///
    /// Example: `project_dir/.keyseal/vault.db`
    pub fn db_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.data_dir).join(Self::DB_NAME)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.kdf, KdfKind::Pbkdf2Sha256);
        assert_eq!(s.kdf_iterations, 200_000);
        assert_eq!(s.curve, Curve::P256);
        assert_eq!(s.key_length, 32);
        assert_eq!(s.cipher_mode, CipherMode::AesGcm);
        assert_eq!(s.data_dir, ".keyseal");
        assert!(s.validate().is_ok());
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.kdf_iterations, 200_000);
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
kdf = "argon2id"
argon2_memory_kib = 131072
argon2_iterations = 5
argon2_parallelism = 8
curve = "secp256k1"
key_length = 16
cipher_mode = "aes-gcm"
data_dir = "secrets"
"#;
        fs::write(tmp.path().join(".keyseal.toml"), config).unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.kdf, KdfKind::Argon2id);
        assert_eq!(settings.curve, Curve::K256);
        assert_eq!(settings.key_length, 16);
        assert_eq!(settings.data_dir, "secrets");
        assert_eq!(
            settings.kdf_algorithm(),
            KdfAlgorithm::Argon2id(Argon2Params {
                memory_kib: 131_072,
                iterations: 5,
                parallelism: 8,
            })
        );
    }

    #[test]
    fn load_uses_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".keyseal.toml"), "kdf_iterations = 50000\n").unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.kdf_iterations, 50_000);
        // Rest should be defaults
        assert_eq!(settings.data_dir, ".keyseal");
        assert_eq!(settings.argon2_iterations, 3);
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".keyseal.toml"), "not valid {{toml").unwrap();
        assert!(Settings::load(tmp.path()).is_err());
    }

    #[test]
    fn load_rejects_unknown_enum_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".keyseal.toml"), "curve = \"ed25519\"\n").unwrap();
        assert!(Settings::load(tmp.path()).is_err());
    }

    #[test]
    fn load_rejects_weak_iterations() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".keyseal.toml"), "kdf_iterations = 1000\n").unwrap();
        assert!(matches!(
            Settings::load(tmp.path()),
            Err(KeySealError::ConfigError(_))
        ));
    }

    #[test]
    fn env_overrides_win_over_file() {
        let mut s = Settings::default();
        s.apply_overrides(lookup(&[
            ("KEYSEAL_KDF_ITERATIONS", "10000"),
            ("KEYSEAL_CURVE", "secp256k1"),
            ("KEYSEAL_KEY_LENGTH", "16"),
            ("KEYSEAL_CIPHER_MODE", "aes-cbc-unauthenticated"),
        ]))
        .unwrap();
        assert_eq!(s.kdf_iterations, 10_000);
        assert_eq!(s.curve, Curve::K256);
        assert_eq!(s.key_length, 16);
        assert_eq!(s.cipher_mode, CipherMode::UnauthenticatedAesCbc);
    }

    #[test]
    fn bad_env_values_are_config_errors() {
        let mut s = Settings::default();
        assert!(s
            .apply_overrides(lookup(&[("KEYSEAL_KEY_LENGTH", "24")]))
            .is_err());
        let mut s = Settings::default();
        assert!(s
            .apply_overrides(lookup(&[("KEYSEAL_KDF_ITERATIONS", "lots")]))
            .is_err());
        let mut s = Settings::default();
        assert!(s.apply_overrides(lookup(&[("KEYSEAL_KDF", "md5")])).is_err());
    }

    #[test]
    fn services_follow_settings() {
        let s = Settings {
            curve: Curve::K256,
            kdf_iterations: 10_000,
            ..Settings::default()
        };
        let messaging = s.messaging_service().unwrap();
        assert_eq!(messaging.agreement().curve(), Curve::K256);
        let vault = s.vault_service().unwrap();
        assert_eq!(vault.envelope().mode(), CipherMode::AesGcm);
    }

    #[test]
    fn db_path_respects_custom_data_dir() {
        let s = Settings {
            data_dir: "secrets".to_string(),
            ..Settings::default()
        };
        let project = Path::new("/home/user/myproject");
        assert_eq!(
            s.db_path(project),
            PathBuf::from("/home/user/myproject/secrets/vault.db")
        );
    }
}
