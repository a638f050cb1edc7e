// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `EPBMeter` Core
//!
//! Core types and models for the `EPBMeter` workspace.
//!
//! This crate holds the domain vocabulary shared by the fetch client, the
//! store and the CLI. It performs no I/O.
//!
//! ## Key Types
//!
//! - [`Credentials`] - Portal username and password
//! - [`AccountLink`] - A linked power account and its premise
//! - [`BillingPeriod`] - The year and month a usage query targets
//! - [`UsageReading`] - Normalized kWh and cost
//! - [`Tariff`] - Rate schedule for estimating cost

pub mod error;
pub mod models;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    AccountLink, BillingPeriod, Credentials, DEFAULT_CUSTOMER_CHARGE, DEFAULT_ENERGY_CHARGE_RATE,
    DEFAULT_FUEL_COST_ADJUSTMENT, DEFAULT_ZONE_ID, PREVIOUS_MONTH_GRACE_DAYS, PowerAccount,
    Premise, Tariff, UsageReading, parse_zone,
};

// Re-exported so downstream crates name zones with the same type.
pub use chrono_tz::Tz;
