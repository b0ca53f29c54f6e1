//! `keyseal passwd`: change the master password.
//!
//! Decrypts every entry with the current key, derives a new salt and
//! key from the new password, and re-encrypts every entry.  Nothing is
//! written if any entry fails to decrypt.

use crate::cli::output;
use crate::cli::{open_session_with, prompt_password, prompt_replacement_password, Cli};
use crate::errors::Result;

/// Execute the `passwd` command.
pub fn execute(cli: &Cli) -> Result<()> {
    output::info("Enter your current master password.");
    let current = prompt_password()?;
    let mut session = open_session_with(cli, &current)?;

    output::info("Choose your new master password.");
    let new_password = prompt_replacement_password()?;

    session.change_password(&current, &new_password)?;
    let count = session.list_metadata()?.len();

    output::success(&format!(
        "Master password changed for '{}' ({count} entries re-encrypted)",
        session.user_id()
    ));
    Ok(())
}
