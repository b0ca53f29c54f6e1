//! `keyseal generate`: print a random password.

use crate::errors::Result;
use crate::generator::{generate_password, PasswordPolicy};

/// Execute the `generate` command.
pub fn execute(length: usize, no_symbols: bool) -> Result<()> {
    let policy = PasswordPolicy {
        punctuation: !no_symbols,
        ..PasswordPolicy::default()
    };
    let password = generate_password(length, policy)?;
    println!("{}", password.as_str());
    Ok(())
}
