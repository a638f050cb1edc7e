//! Domain models for EPBMeter.
//!
//! ## Submodules
//!
//! - [`account`] - Linked accounts (AccountLink, PowerAccount, Premise)
//! - [`credentials`] - Portal login credentials
//! - [`period`] - Billing period selection
//! - [`usage`] - Usage readings and tariff

mod account;
mod credentials;
mod period;
mod usage;

// Re-export everything at the models level
pub use account::{AccountLink, PowerAccount, Premise};
pub use credentials::Credentials;
pub use period::{BillingPeriod, DEFAULT_ZONE_ID, PREVIOUS_MONTH_GRACE_DAYS, parse_zone};
pub use usage::{
    DEFAULT_CUSTOMER_CHARGE, DEFAULT_ENERGY_CHARGE_RATE, DEFAULT_FUEL_COST_ADJUSTMENT, Tariff,
    UsageReading,
};
#[cfg(test)]
mod serde_tests;
