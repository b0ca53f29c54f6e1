//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::{Path, PathBuf};

use clap::Parser;

use zeroize::Zeroizing;

use crate::config::Settings;
use crate::crypto::{import_private, import_public, KeyPair, PublicKey};
use crate::errors::{KeySealError, Result};
use crate::vault::{SqliteStorage, VaultSession};

/// Minimum password length to prevent trivially weak passwords.
const MIN_PASSWORD_LEN: usize = 8;

/// Env var read before prompting for the master password.
pub const PASSWORD_ENV: &str = "KEYSEAL_PASSWORD";

/// Env var read by `passwd` before prompting for the new master password.
pub const NEW_PASSWORD_ENV: &str = "KEYSEAL_NEW_PASSWORD";

/// Env var read before prompting for a private-key passphrase.
pub const KEY_PASSPHRASE_ENV: &str = "KEYSEAL_KEY_PASSPHRASE";

/// KeySeal CLI: password vault and encrypted messaging.
#[derive(Parser)]
#[command(
    name = "keyseal",
    about = "Password vault and ECDH-encrypted messaging",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault user (default: default)
    #[arg(short, long, env = "KEYSEAL_USER", default_value = "default", global = true)]
    pub user: String,

    /// Data directory holding vault.db (overrides `data_dir` in .keyseal.toml)
    #[arg(long, global = true)]
    pub data_dir: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a vault user with a master password
    Register,

    /// Check the master password and show a vault summary
    Login,

    /// Add an entry
    Add {
        /// Site or service (e.g. github.com)
        site: String,
        /// Account name at that site
        account: String,
        /// Secret value (omit for interactive prompt)
        secret: Option<String>,
        /// Generate a random secret instead of prompting
        #[arg(short, long, conflicts_with = "secret")]
        generate: bool,
        /// Length of a generated secret
        #[arg(long, default_value_t = crate::generator::DEFAULT_LENGTH)]
        length: usize,
        #[arg(long)]
        notes: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        /// Mark as favorite
        #[arg(long)]
        favorite: bool,
    },

    /// List entries
    List {
        /// Decrypt and show secret values
        #[arg(short, long)]
        show: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print one entry's secret
    Get {
        /// Entry id (see `keyseal list`)
        id: i64,
    },

    /// Change fields of an entry
    Update {
        /// Entry id
        id: i64,
        #[arg(long)]
        site: Option<String>,
        #[arg(long)]
        account: Option<String>,
        /// New secret value
        #[arg(long)]
        secret: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        favorite: Option<bool>,
    },

    /// Delete an entry
    Delete {
        /// Entry id
        id: i64,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Change the master password and re-encrypt every entry
    Passwd,

    /// Generate a random password
    Generate {
        #[arg(short, long, default_value_t = crate::generator::DEFAULT_LENGTH)]
        length: usize,
        /// Leave out punctuation
        #[arg(long)]
        no_symbols: bool,
    },

    /// Generate an ECDH key pair (<name>.pem and <name>.pub.pem)
    Keygen {
        /// Output file stem
        name: String,
        /// Curve (default from config: secp256r1)
        #[arg(long)]
        curve: Option<String>,
        /// Protect the private key with a passphrase
        #[arg(long)]
        encrypt: bool,
    },

    /// Encrypt a message for a peer (prints base64)
    Send {
        /// Your private key (PEM)
        #[arg(long)]
        key: String,
        /// Recipient public key (PEM)
        #[arg(long)]
        to: String,
        /// Message text (read from stdin if omitted)
        message: Option<String>,
    },

    /// Decrypt a message from a peer
    Receive {
        /// Your private key (PEM)
        #[arg(long)]
        key: String,
        /// Sender public key (PEM)
        #[arg(long)]
        from: String,
        /// Base64 envelope (read from stdin if omitted)
        envelope: Option<String>,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Get the master password, trying in order:
/// 1. `KEYSEAL_PASSWORD` env var (scripts/CI)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Enter master password")
        .interact()
        .map_err(|e| KeySealError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new password with confirmation.
///
/// Also respects `KEYSEAL_PASSWORD` for scripted/CI usage.
/// Enforces a minimum password length.
pub fn prompt_new_password() -> Result<Zeroizing<String>> {
    new_secret_from(PASSWORD_ENV, "master password")
}

/// New password for `passwd` (`KEYSEAL_NEW_PASSWORD` or prompt).
pub fn prompt_replacement_password() -> Result<Zeroizing<String>> {
    new_secret_from(NEW_PASSWORD_ENV, "new master password")
}

/// Same as `prompt_new_password`, reading `override_env` first.
fn new_secret_from(override_env: &str, what: &str) -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(override_env) {
        if !pw.is_empty() {
            if pw.len() < MIN_PASSWORD_LEN {
                return Err(KeySealError::InvalidInput(format!(
                    "{what} must be at least {MIN_PASSWORD_LEN} characters"
                )));
            }
            return Ok(Zeroizing::new(pw));
        }
    }

    loop {
        let password = dialoguer::Password::new()
            .with_prompt(format!("Choose {what}"))
            .with_confirmation(format!("Confirm {what}"), "Entries do not match, try again")
            .interact()
            .map_err(|e| KeySealError::CommandFailed(format!("password prompt: {e}")))?;

        if password.len() < MIN_PASSWORD_LEN {
            output::warning(&format!(
                "The {what} must be at least {MIN_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(Zeroizing::new(password));
    }
}

/// Passphrase for a new private key (`KEYSEAL_KEY_PASSPHRASE` or prompt).
pub fn prompt_new_key_passphrase() -> Result<Zeroizing<String>> {
    new_secret_from(KEY_PASSPHRASE_ENV, "key passphrase")
}

/// Passphrase for an existing private key (`KEYSEAL_KEY_PASSPHRASE` or prompt).
pub fn prompt_key_passphrase() -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(KEY_PASSPHRASE_ENV) {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Enter key passphrase")
        .interact()
        .map_err(|e| KeySealError::CommandFailed(format!("passphrase prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Load settings from the current directory, then apply env and CLI overrides.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let cwd = std::env::current_dir()?;
    let mut settings = Settings::load(&cwd)?;
    settings.apply_env_overrides()?;
    if let Some(dir) = &cli.data_dir {
        settings.data_dir = dir.clone();
        settings.validate()?;
    }
    Ok(settings)
}

/// Build the full path to the vault database from the CLI arguments.
///
/// Example: `<cwd>/.keyseal/vault.db`
pub fn db_path(settings: &Settings) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(settings.db_path(&cwd))
}

/// Open the database and log in as `cli.user`.
pub fn open_session(cli: &Cli) -> Result<VaultSession<SqliteStorage>> {
    let password = prompt_password()?;
    open_session_with(cli, &password)
}

/// Like `open_session`, with a password the caller already holds.
pub fn open_session_with(cli: &Cli, password: &str) -> Result<VaultSession<SqliteStorage>> {
    let settings = load_settings(cli)?;
    let path = db_path(&settings)?;
    if !path.exists() {
        return Err(KeySealError::CommandFailed(
            "no vault found. Run `keyseal register` first".into(),
        ));
    }

    let storage = SqliteStorage::open(&path)?;
    VaultSession::login(storage, &cli.user, password)
}

/// Read a PEM private key, asking for a passphrase when it is protected.
pub fn load_private_key(path: &str) -> Result<KeyPair> {
    let pem = Zeroizing::new(read_key_file(path)?);
    if pem.contains("BEGIN ENCRYPTED PRIVATE KEY") {
        let passphrase = prompt_key_passphrase()?;
        import_private(&pem, Some(passphrase.as_bytes()))
    } else {
        import_private(&pem, None)
    }
}

/// Read a PEM public key.
pub fn load_public_key(path: &str) -> Result<PublicKey> {
    import_public(&read_key_file(path)?)
}

fn read_key_file(path: &str) -> Result<String> {
    std::fs::read_to_string(Path::new(path))
        .map_err(|e| KeySealError::CommandFailed(format!("cannot read key file '{path}': {e}")))
}

/// Take `arg` or, when absent, all of stdin.
pub fn arg_or_stdin(arg: Option<&str>) -> Result<String> {
    match arg {
        Some(value) => Ok(value.to_string()),
        None => {
            let mut buf = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut buf)?;
            Ok(buf.trim_end_matches(['\r', '\n']).to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn user_defaults_and_global_flags() {
        let cli = Cli::try_parse_from(["keyseal", "list", "--show", "--data-dir", "/tmp/x"]).unwrap();
        assert_eq!(cli.data_dir.as_deref(), Some("/tmp/x"));
        assert!(matches!(cli.command, Commands::List { show: true, json: false }));
    }

    #[test]
    fn add_rejects_secret_with_generate() {
        assert!(Cli::try_parse_from(["keyseal", "add", "site", "acct", "pw", "--generate"]).is_err());
    }

    #[test]
    fn arg_wins_over_stdin() {
        assert_eq!(arg_or_stdin(Some("hello")).unwrap(), "hello");
    }
}
