//! `keyseal list`: display all entries in a table.

use serde::Serialize;

use crate::cli::output;
use crate::cli::{open_session, Cli};
use crate::errors::{KeySealError, Result};
use crate::vault::EntryMetadata;

/// One row of `list --json`.
#[derive(Serialize)]
struct JsonEntry<'a> {
    #[serde(flatten)]
    metadata: &'a EntryMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
}

/// Execute the `list` command.
pub fn execute(cli: &Cli, show: bool, json: bool) -> Result<()> {
    let session = open_session(cli)?;

    if !show {
        let entries = session.list_metadata()?;
        if json {
            let rows: Vec<_> = entries
                .iter()
                .map(|m| JsonEntry {
                    metadata: m,
                    secret: None,
                    error: None,
                })
                .collect();
            return print_json(&rows);
        }
        output::info(&format!("{}: {} entries", cli.user, entries.len()));
        output::print_entries_table(&entries);
        return Ok(());
    }

    let entries = session.list_entries()?;
    if json {
        let rows: Vec<_> = entries
            .iter()
            .map(|e| JsonEntry {
                metadata: &e.metadata,
                secret: e.secret.as_ref().ok().map(|s| s.as_str()),
                error: e.secret.as_ref().err().map(|_| "could not decrypt"),
            })
            .collect();
        return print_json(&rows);
    }

    output::info(&format!("{}: {} entries", cli.user, entries.len()));
    output::print_decrypted_table(&entries);
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| KeySealError::SerializationError(e.to_string()))?;
    println!("{text}");
    Ok(())
}
