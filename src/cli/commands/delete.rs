//! `keyseal delete`: remove an entry from the vault.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{open_session, Cli};
use crate::errors::{KeySealError, Result};

/// Execute the `delete` command.
pub fn execute(cli: &Cli, id: i64, force: bool) -> Result<()> {
    let mut session = open_session(cli)?;

    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let entries = session.list_metadata()?;
        let label = entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| format!("{}@{}", e.account, e.site))
            .ok_or(KeySealError::EntryNotFound(id))?;

        let confirmed = Confirm::new()
            .with_prompt(format!("Delete entry {id} ({label})?"))
            .default(false)
            .interact()
            .map_err(|e| KeySealError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    session.delete_entry(id)?;
    output::success(&format!("Deleted entry {id}"));

    Ok(())
}
