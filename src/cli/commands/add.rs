//! `keyseal add`: store a new entry.

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{open_session, Cli};
use crate::errors::{KeySealError, Result};
use crate::generator::{generate_password, PasswordPolicy};
use crate::vault::NewEntry;

/// Arguments of the `add` command.
pub struct AddArgs<'a> {
    pub site: &'a str,
    pub account: &'a str,
    pub secret: Option<&'a str>,
    pub generate: bool,
    pub length: usize,
    pub notes: Option<&'a str>,
    pub category: Option<&'a str>,
    pub favorite: bool,
}

/// Execute the `add` command.
pub fn execute(cli: &Cli, args: AddArgs<'_>) -> Result<()> {
    let mut session = open_session(cli)?;

    let secret = match (args.secret, args.generate) {
        (Some(value), _) => Zeroizing::new(value.to_string()),
        (None, true) => generate_password(args.length, PasswordPolicy::default())?,
        (None, false) => {
            let value = dialoguer::Password::new()
                .with_prompt(format!("Secret for {}@{}", args.account, args.site))
                .interact()
                .map_err(|e| KeySealError::CommandFailed(format!("secret prompt: {e}")))?;
            Zeroizing::new(value)
        }
    };

    let id = session.add_entry(NewEntry {
        site: args.site.to_string(),
        account: args.account.to_string(),
        secret,
        notes: args.notes.map(str::to_string),
        category: args.category.map(str::to_string),
        favorite: args.favorite,
    })?;

    output::success(&format!("Added entry {id} ({}@{})", args.account, args.site));
    if args.generate {
        output::tip(&format!("Run `keyseal get {id}` to see the generated secret."));
    }
    Ok(())
}
