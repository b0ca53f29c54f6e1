//! `keyseal receive`: decrypt a message from a peer.

use crate::cli::{arg_or_stdin, load_private_key, load_public_key, load_settings, Cli};
use crate::errors::Result;
use crate::messaging::MessagingCryptoService;

/// Execute the `receive` command.  Prints the plaintext to stdout.
pub fn execute(cli: &Cli, key: &str, from: &str, envelope: Option<&str>) -> Result<()> {
    let own = load_private_key(key)?;
    let peer = load_public_key(from)?;
    let encoded = arg_or_stdin(envelope)?;

    // The curve comes from the key file, not the config default.
    let mut settings = load_settings(cli)?;
    settings.curve = own.curve();
    let service = MessagingCryptoService::from_settings(&settings)?;

    println!("{}", service.receive_text(&own, &peer, &encoded)?);
    Ok(())
}
