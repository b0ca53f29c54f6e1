//! `keyseal get`: print a single entry's secret.

use crate::cli::{open_session, Cli};
use crate::errors::Result;

/// Execute the `get` command.
pub fn execute(cli: &Cli, id: i64) -> Result<()> {
    let session = open_session(cli)?;

    // Decrypt and print the secret value to stdout.
    let value = session.get_secret(id)?;
    println!("{}", value.as_str());

    Ok(())
}
