//! `keyseal login`: check the master password.

use crate::cli::output;
use crate::cli::{open_session, Cli};
use crate::errors::Result;

/// Execute the `login` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let session = open_session(cli)?;
    let entries = session.list_metadata()?;
    let favorites = entries.iter().filter(|e| e.favorite).count();

    output::success(&format!("Logged in as '{}'", session.user_id()));
    output::info(&format!("{} entries, {favorites} favorite(s)", entries.len()));
    Ok(())
}
