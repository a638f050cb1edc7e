//! Logout command - remove stored credentials.

use anyhow::{Context, Result};
use epbmeter_store::CredentialStore;

use crate::{Cli, OutputFormat};

/// Runs the logout command.
pub async fn run(cli: &Cli) -> Result<()> {
    CredentialStore::system()
        .clear()
        .await
        .context("Failed to remove credentials from keychain")?;

    match cli.format {
        OutputFormat::Text if !cli.quiet => println!("Removed stored credentials"),
        OutputFormat::Text => {}
        OutputFormat::Json => println!(r#"{{"removed":true}}"#),
    }

    Ok(())
}
