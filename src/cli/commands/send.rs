//! `keyseal send`: encrypt a message for a peer.

use crate::cli::{arg_or_stdin, load_private_key, load_public_key, load_settings, Cli};
use crate::errors::Result;
use crate::messaging::MessagingCryptoService;

/// Execute the `send` command.  Prints the base64 envelope to stdout.
pub fn execute(cli: &Cli, key: &str, to: &str, message: Option<&str>) -> Result<()> {
    let own = load_private_key(key)?;
    let peer = load_public_key(to)?;
    let text = arg_or_stdin(message)?;

    // The curve comes from the key file, not the config default.
    let mut settings = load_settings(cli)?;
    settings.curve = own.curve();
    let service = MessagingCryptoService::from_settings(&settings)?;

    println!("{}", service.send_text(&own, &peer, &text)?);
    Ok(())
}
