//! JSON output formatting.

use anyhow::Result;
use chrono::{DateTime, Utc};
use epbmeter_core::{AccountLink, BillingPeriod};
use epbmeter_store::AccountUsage;
use serde::{Serialize, Serializer};

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for a linked account.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountOutput {
    pub account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gis_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
}

/// JSON output for one account's usage.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageOutput {
    pub account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    pub has_usage_data: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kwh: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_per_kwh: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(serialize_with = "serialize_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl From<&AccountLink> for AccountOutput {
    fn from(link: &AccountLink) -> Self {
        Self {
            account_id: link.account_id().to_string(),
            gis_id: link.gis_id().map(str::to_string),
            service_address: link.service_address().map(str::to_string),
            city: link.city().map(str::to_string),
            state: link.state().map(str::to_string),
            zip_code: link.zip_code().map(str::to_string),
        }
    }
}

impl UsageOutput {
    fn new(usage: &AccountUsage, period: Option<BillingPeriod>) -> Self {
        Self {
            account_id: usage.account_id.clone(),
            service_address: usage.service_address.clone(),
            period: period.map(|p| p.to_string()),
            has_usage_data: usage.has_usage_data,
            kwh: usage.reading.map(|r| r.kwh),
            cost: usage.reading.map(|r| r.cost),
            cost_per_kwh: usage.reading.and_then(|r| r.cost_per_kwh()),
            error: usage.error.clone(),
            updated_at: usage.updated_at,
        }
    }
}

// ============================================================================
// Serialization helpers
// ============================================================================

fn serialize_datetime<S>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&dt.to_rfc3339())
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats linked accounts as an array.
    pub fn format_accounts(&self, links: &[AccountLink]) -> Result<String> {
        let outputs: Vec<AccountOutput> = links.iter().map(AccountOutput::from).collect();
        self.format(&outputs)
    }

    /// Formats usage entries as an array.
    pub fn format_usage(
        &self,
        usages: &[AccountUsage],
        period: Option<BillingPeriod>,
    ) -> Result<String> {
        let outputs: Vec<UsageOutput> = usages
            .iter()
            .map(|usage| UsageOutput::new(usage, period))
            .collect();
        self.format(&outputs)
    }
}
