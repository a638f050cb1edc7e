// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # EPBMeter Fetch
//!
//! Client for the EPB customer API.
//!
//! ## Client
//!
//! - [`client::EpbClient`] - Login, account discovery and usage queries
//! - [`parser`] - Extraction of readings from the usage endpoint's shapes
//! - [`source::UsageSource`] - Trait hosts poll through
//!
//! ## Host APIs
//!
//! - [`host::http`] - HTTP client with tracing and domain allowlist
//! - [`host::keychain`] - Secure credential storage (system keychain)
//!
//! ## Example
//!
//! ```ignore
//! use epbmeter_core::Credentials;
//! use epbmeter_fetch::{EpbClient, HttpClient};
//!
//! let client = EpbClient::new(Credentials::new("user", "pass"), HttpClient::new()?);
//!
//! for link in client.list_linked_accounts().await? {
//!     let reading = client.get_usage(link.account_id(), link.gis_id()).await?;
//!     println!("{}: {:.1} kWh, ${:.2}", link.account_id(), reading.kwh, reading.cost);
//! }
//! ```

pub mod client;
pub mod error;
pub mod host;
pub mod parser;
pub mod source;

// Errors
pub use error::{EpbError, ErrorKind, HttpError, KeychainError};

// Client
pub use client::{ClientOptions, DEFAULT_BASE_URL, EpbClient};
pub use parser::{IntervalValues, UsagePayload, extract_reading};
pub use source::UsageSource;

// Host APIs
pub use host::{
    http::{DEFAULT_TIMEOUT_SECS, HttpClient},
    keychain::{KeychainApi, SystemKeychain},
};
