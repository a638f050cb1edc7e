//! Accounts command - list linked utility accounts.

use anyhow::{Context, Result};
use epbmeter_store::Config;
use tracing::info;

use crate::commands::client_from_store;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Runs the accounts command.
pub async fn run(cli: &Cli, config: &Config) -> Result<()> {
    let client = client_from_store(config).await?;
    let links = client
        .list_linked_accounts()
        .await
        .context("Failed to list linked accounts")?;

    info!(count = links.len(), "Fetched linked accounts");

    match cli.format {
        OutputFormat::Text => {
            println!("{}", TextFormatter::new(!cli.no_color).format_accounts(&links));
        }
        OutputFormat::Json => {
            println!("{}", JsonFormatter::new(cli.pretty).format_accounts(&links)?);
        }
    }

    Ok(())
}
