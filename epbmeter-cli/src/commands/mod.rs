//! CLI command implementations.

pub mod accounts;
pub mod config;
pub mod login;
pub mod logout;
pub mod usage;
pub mod watch;

use anyhow::{Context, Result};
use epbmeter_core::Credentials;
use epbmeter_fetch::EpbClient;
use epbmeter_store::{Config, CredentialStore};
use tracing::debug;

/// Builds a client from stored credentials and the loaded config.
pub(crate) async fn client_from_store(config: &Config) -> Result<EpbClient> {
    let (credentials, source) = CredentialStore::system()
        .load()
        .await
        .context("Failed to read credentials")?
        .ok_or(epbmeter_store::StoreError::CredentialsMissing)?;
    debug!(source = %source, username = %credentials.username(), "Loaded credentials");
    client_for(credentials, config)
}

/// Builds a client for explicit credentials.
pub(crate) fn client_for(credentials: Credentials, config: &Config) -> Result<EpbClient> {
    let http = config.http_client()?;
    let options = config.client_options()?;
    Ok(EpbClient::with_options(credentials, http, options))
}
