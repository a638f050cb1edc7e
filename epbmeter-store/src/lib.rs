// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # EPBMeter Store
//!
//! Host-side state for the EPBMeter application.
//!
//! This crate provides:
//!
//! - **Config**: API, tariff and polling settings with persistence
//! - **CredentialStore**: Credentials from the environment or system keychain
//! - **UsageStore**: Latest usage per linked account with watch channels
//! - **Persistence**: File I/O helpers for JSON data
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use epbmeter_fetch::EpbClient;
//! use epbmeter_store::{Config, CredentialStore, UsageStore};
//!
//! let config = Config::load().await?;
//! let credentials = CredentialStore::system().require().await?;
//! let client = EpbClient::with_options(credentials, config.http_client()?, config.client_options()?);
//!
//! let store = UsageStore::new(Arc::new(client));
//! let mut rx = store.subscribe();
//! store.refresh().await?;
//! while rx.changed().await.is_ok() {
//!     println!("Usage updated!");
//! }
//! ```

pub mod config;
pub mod credentials;
pub mod error;
pub mod persistence;
pub mod usage_store;

pub use config::{ApiConfig, Config, GeneralConfig};
pub use credentials::{CredentialSource, CredentialStore, PASSWORD_ENV, USERNAME_ENV};
pub use error::StoreError;
pub use persistence::{
    default_config_dir, default_config_path, ensure_dir, load_json, load_json_or_default,
    save_json,
};
pub use usage_store::{AccountUsage, UsageStore, fetch_usage};

#[cfg(test)]
mod persistence_tests;
