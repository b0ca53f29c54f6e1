//! `keyseal update`: change fields of an existing entry.

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{open_session, Cli};
use crate::errors::Result;
use crate::vault::EntryUpdate;

/// Execute the `update` command.
pub fn execute(cli: &Cli, id: i64, update: EntryUpdate) -> Result<()> {
    let mut session = open_session(cli)?;
    session.update_entry(id, update)?;
    output::success(&format!("Updated entry {id}"));
    Ok(())
}

/// Build an `EntryUpdate` from the CLI flags.
pub fn from_flags(
    site: Option<&str>,
    account: Option<&str>,
    secret: Option<&str>,
    notes: Option<&str>,
    category: Option<&str>,
    favorite: Option<bool>,
) -> EntryUpdate {
    EntryUpdate {
        site: site.map(str::to_string),
        account: account.map(str::to_string),
        secret: secret.map(|s| Zeroizing::new(s.to_string())),
        notes: notes.map(str::to_string),
        category: category.map(str::to_string),
        favorite,
    }
}
