//! `keyseal keygen`: create an ECDH key pair on disk.
//!
//! Writes `<name>.pem` (PKCS#8 private key, owner-only permissions) and
//! `<name>.pub.pem` (SubjectPublicKeyInfo public key).

use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::output;
use crate::cli::{load_settings, prompt_new_key_passphrase, Cli};
use crate::crypto::{export_private, export_public, Curve, KeyAgreement};
use crate::errors::{KeySealError, Result};

/// Execute the `keygen` command.
pub fn execute(cli: &Cli, name: &str, curve: Option<&str>, encrypt: bool) -> Result<()> {
    let settings = load_settings(cli)?;
    let curve: Curve = match curve {
        Some(c) => c.parse()?,
        None => settings.curve,
    };

    let (private_path, public_path) = key_paths(name);
    for path in [&private_path, &public_path] {
        if path.exists() {
            return Err(KeySealError::CommandFailed(format!(
                "{} already exists; refusing to overwrite",
                path.display()
            )));
        }
    }

    let pair = KeyAgreement::new(curve).generate_keypair()?;
    let public_pem = export_public(&pair.public_key())?;
    let private_pem = if encrypt {
        let passphrase = prompt_new_key_passphrase()?;
        export_private(&pair, Some(passphrase.as_bytes()))?
    } else {
        export_private(&pair, None)?
    };

    write_private(&private_path, private_pem.as_bytes())?;
    fs::write(&public_path, public_pem)?;

    output::success(&format!(
        "Generated {curve} key pair: {} / {}",
        private_path.display(),
        public_path.display()
    ));
    output::info(&format!("Fingerprint: {}", pair.public_key().fingerprint()));
    if !encrypt {
        output::tip("Pass --encrypt to protect the private key with a passphrase.");
    }
    Ok(())
}

/// `<name>.pem` and `<name>.pub.pem`.
fn key_paths(name: &str) -> (PathBuf, PathBuf) {
    let stem = Path::new(name);
    (
        PathBuf::from(format!("{}.pem", stem.display())),
        PathBuf::from(format!("{}.pub.pem", stem.display())),
    )
}

fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents)?;

    // Set restrictive permissions on the private key (owner-only).
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}
