//! `keyseal register`: create a vault user.

use crate::cli::output;
use crate::cli::{db_path, load_settings, prompt_new_password, Cli};
use crate::errors::Result;
use crate::vault::{register_user, SqliteStorage};

/// Execute the `register` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;
    let path = db_path(&settings)?;

    let mut storage = SqliteStorage::open(&path)?;
    let password = prompt_new_password()?;
    register_user(&mut storage, &settings.vault_service()?, &cli.user, &password)?;

    output::success(&format!("Registered user '{}' at {}", cli.user, path.display()));
    output::tip("Run `keyseal add <SITE> <ACCOUNT>` to store your first entry.");
    Ok(())
}
