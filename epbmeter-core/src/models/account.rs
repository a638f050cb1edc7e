//! Linked account types.
//!
//! The account-links endpoint returns one record per service location the
//! user has linked. Records are nested on the wire:
//!
//! ```json
//! {
//!   "power_account": { "account_id": "1234567" },
//!   "premise": {
//!     "gis_id": "98765",
//!     "full_service_address": "10 Main St",
//!     "city": "Chattanooga",
//!     "state": "TN",
//!     "zip_code": "37402"
//!   }
//! }
//! ```
//!
//! Only the two identifiers are needed for usage queries; everything else is
//! carried through untouched for display.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Account Link
// ============================================================================

/// A user's link to one power account and its premise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountLink {
    /// The billing account.
    pub power_account: PowerAccount,
    /// The service location.
    #[serde(default)]
    pub premise: Premise,
    /// Fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AccountLink {
    /// Creates a link with just the identifiers set.
    pub fn new(account_id: impl Into<String>, gis_id: Option<String>) -> Self {
        Self {
            power_account: PowerAccount {
                account_id: account_id.into(),
                extra: Map::new(),
            },
            premise: Premise {
                gis_id,
                ..Premise::default()
            },
            extra: Map::new(),
        }
    }

    /// Account number used for usage queries.
    pub fn account_id(&self) -> &str {
        &self.power_account.account_id
    }

    /// GIS premise identifier, if the account has one.
    pub fn gis_id(&self) -> Option<&str> {
        self.premise.gis_id.as_deref()
    }

    /// Full street address of the premise.
    pub fn service_address(&self) -> Option<&str> {
        self.premise.full_service_address.as_deref()
    }

    /// City of the premise.
    pub fn city(&self) -> Option<&str> {
        self.premise.city.as_deref()
    }

    /// State of the premise.
    pub fn state(&self) -> Option<&str> {
        self.premise.state.as_deref()
    }

    /// ZIP code of the premise.
    pub fn zip_code(&self) -> Option<&str> {
        self.premise.zip_code.as_deref()
    }
}

/// The `power_account` block of an account link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerAccount {
    /// Account number.
    #[serde(deserialize_with = "string_or_number")]
    pub account_id: String,
    /// Fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `premise` block of an account link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Premise {
    /// GIS location identifier. Some premises have none.
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub gis_id: Option<String>,
    /// Full street address.
    #[serde(default)]
    pub full_service_address: Option<String>,
    /// City.
    #[serde(default)]
    pub city: Option<String>,
    /// State.
    #[serde(default)]
    pub state: Option<String>,
    /// ZIP code.
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub zip_code: Option<String>,
    /// Fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// Identifier Deserialization
// ============================================================================

fn identifier(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    identifier(value).ok_or_else(|| serde::de::Error::custom("expected string or number"))
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(identifier))
}
