//! Usage response parser.
//!
//! The usage endpoint answers in one of three shapes depending on the
//! period and account:
//!
//! ```json
//! {"data": [{"a": {"values": {"pos_kwh": "100.5", "pos_wh_est_cost": "12.34"}}}]}
//! {"interval_a_totals": {"pos_kwh": "200.5", "pos_wh_est_cost": "25.67"}}
//! {"interval_a_averages": {"pos_kwh": "150.5", "pos_wh_est_cost": "18.90"}}
//! ```
//!
//! They are tried in that order and the first present one wins. Only the
//! block that wins is decoded, so a malformed field elsewhere in the body is
//! ignored. Anything else, including a winning block that fails to decode,
//! yields a zero reading.

use epbmeter_core::{Tariff, UsageReading};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, warn};

// ============================================================================
// Interval Values
// ============================================================================

/// Usage figures for one interval block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct IntervalValues {
    /// Energy consumed in kWh.
    #[serde(default, rename = "pos_kwh", deserialize_with = "lenient_f64")]
    pub kwh: Option<f64>,
    /// Provider's estimated cost.
    #[serde(default, rename = "pos_wh_est_cost", deserialize_with = "lenient_f64")]
    pub cost: Option<f64>,
}

impl IntervalValues {
    /// Returns true if neither figure is present.
    pub fn is_empty(&self) -> bool {
        self.kwh.is_none() && self.cost.is_none()
    }

    /// Converts to a reading, estimating cost from `tariff` when absent.
    pub fn to_reading(&self, tariff: &Tariff) -> UsageReading {
        let kwh = self.kwh.unwrap_or(0.0);
        let cost = self.cost.unwrap_or_else(|| tariff.estimate_cost(kwh));
        UsageReading::new(kwh, cost)
    }
}

/// Accepts numbers and numeric strings. Null and empty strings are absent.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("not a number: {s:?}"))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected number or numeric string, got {other}"
        ))),
    }
}

// ============================================================================
// Payload
// ============================================================================

/// The usage shape found in a response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UsagePayload {
    /// Most recent daily entry that carries values.
    Daily(IntervalValues),
    /// Monthly totals.
    MonthlyTotals(IntervalValues),
    /// Monthly averages.
    MonthlyAverages(IntervalValues),
    /// No usable data for the period.
    Empty,
}

impl UsagePayload {
    /// Parses a usage response body.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if the body is not valid JSON or the selected
    /// block has the wrong type.
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        let response: Value = serde_json::from_str(body)?;
        Self::from_value(&response)
    }

    fn from_value(response: &Value) -> Result<Self, serde_json::Error> {
        if let Some(block) = latest_daily_block(response) {
            let values = IntervalValues::deserialize(block)?;
            if !values.is_empty() {
                return Ok(Self::Daily(values));
            }
        }
        if let Some(totals) = present(response, "interval_a_totals") {
            return IntervalValues::deserialize(totals).map(Self::MonthlyTotals);
        }
        if let Some(averages) = present(response, "interval_a_averages") {
            return IntervalValues::deserialize(averages).map(Self::MonthlyAverages);
        }
        Ok(Self::Empty)
    }

    /// Short name of the shape, for logs.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Daily(_) => "daily",
            Self::MonthlyTotals(_) => "interval_a_totals",
            Self::MonthlyAverages(_) => "interval_a_averages",
            Self::Empty => "empty",
        }
    }

    /// Converts to a reading.
    pub fn to_reading(&self, tariff: &Tariff) -> UsageReading {
        match self {
            Self::Daily(values) | Self::MonthlyTotals(values) | Self::MonthlyAverages(values) => {
                values.to_reading(tariff)
            }
            Self::Empty => UsageReading::zero(),
        }
    }
}

/// The `a.values` block of the newest daily entry that has one.
///
/// Entries that are not objects or lack the block are skipped. A null block
/// still stops the scan, and the daily shape then does not match.
fn latest_daily_block(response: &Value) -> Option<&Value> {
    response
        .get("data")?
        .as_array()?
        .iter()
        .rev()
        .find_map(|entry| entry.get("a")?.get("values"))
        .filter(|block| !block.is_null())
}

/// Field `key` unless it is absent or null.
fn present<'a>(response: &'a Value, key: &str) -> Option<&'a Value> {
    response.get(key).filter(|value| !value.is_null())
}

/// Extracts a reading from a usage response body.
///
/// Never fails: malformed bodies are logged and produce a zero reading.
pub fn extract_reading(body: &str, tariff: &Tariff) -> UsageReading {
    match UsagePayload::parse(body) {
        Ok(UsagePayload::Empty) => {
            warn!("No usage data found in response");
            UsageReading::zero()
        }
        Ok(payload) => {
            let reading = payload.to_reading(tariff);
            debug!(shape = payload.shape(), kwh = reading.kwh, cost = reading.cost, "Parsed usage");
            reading
        }
        Err(e) => {
            warn!(error = %e, "Failed to parse usage response");
            UsageReading::zero()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(body: &str) -> UsageReading {
        extract_reading(body, &Tariff::default())
    }

    #[test]
    fn test_daily_shape() {
        let body = r#"{"data":[{"a":{"values":{"pos_kwh":"100.5","pos_wh_est_cost":"12.34"}}}]}"#;
        assert_eq!(reading(body), UsageReading::new(100.5, 12.34));
    }

    #[test]
    fn test_monthly_totals_shape() {
        let body = r#"{"interval_a_totals":{"pos_kwh":"200.5","pos_wh_est_cost":"25.67"}}"#;
        assert_eq!(reading(body), UsageReading::new(200.5, 25.67));
    }

    #[test]
    fn test_monthly_averages_shape() {
        let body = r#"{"interval_a_averages":{"pos_kwh":"150.5","pos_wh_est_cost":"18.90"}}"#;
        assert_eq!(reading(body), UsageReading::new(150.5, 18.90));
    }

    #[test]
    fn test_empty_object() {
        assert_eq!(reading("{}"), UsageReading::zero());
    }

    #[test]
    fn test_daily_scans_from_most_recent() {
        let body = r#"{"data":[
            {"a":{"values":{"pos_kwh":"1.0","pos_wh_est_cost":"0.10"}}},
            {"a":{"values":{"pos_kwh":"2.0","pos_wh_est_cost":"0.20"}}},
            {"a":null},
            {"b":{"values":{"pos_kwh":"9.0"}}}
        ]}"#;
        assert_eq!(reading(body), UsageReading::new(2.0, 0.20));
    }

    #[test]
    fn test_daily_takes_precedence_over_totals() {
        let body = r#"{
            "data":[{"a":{"values":{"pos_kwh":10,"pos_wh_est_cost":1.5}}}],
            "interval_a_totals":{"pos_kwh":"200.5","pos_wh_est_cost":"25.67"}
        }"#;
        assert_eq!(UsagePayload::parse(body).unwrap().shape(), "daily");
        assert_eq!(reading(body), UsageReading::new(10.0, 1.5));
    }

    #[test]
    fn test_empty_daily_list_falls_through_to_totals() {
        let body = r#"{"data":[],"interval_a_totals":{"pos_kwh":"200.5","pos_wh_est_cost":"25.67"}}"#;
        assert_eq!(reading(body), UsageReading::new(200.5, 25.67));
    }

    #[test]
    fn test_daily_without_values_falls_through_to_averages() {
        let body = r#"{"data":[{"a":{}},{"date":"2025-01-01"}],"interval_a_averages":{"pos_kwh":"5"}}"#;
        let payload = UsagePayload::parse(body).unwrap();
        assert_eq!(payload.shape(), "interval_a_averages");
    }

    #[test]
    fn test_newest_values_block_without_figures_falls_through() {
        let body = r#"{
            "data":[{"a":{"values":{"pos_kwh":"3"}}},{"a":{"values":{}}}],
            "interval_a_totals":{"pos_kwh":"7","pos_wh_est_cost":"1"}
        }"#;
        assert_eq!(reading(body), UsageReading::new(7.0, 1.0));
    }

    #[test]
    fn test_totals_preferred_over_averages() {
        let body = r#"{
            "interval_a_averages":{"pos_kwh":"1","pos_wh_est_cost":"1"},
            "interval_a_totals":{"pos_kwh":"2","pos_wh_est_cost":"2"}
        }"#;
        assert_eq!(reading(body), UsageReading::new(2.0, 2.0));
    }

    #[test]
    fn test_missing_cost_uses_tariff() {
        let body = r#"{"interval_a_totals":{"pos_kwh":"200.5"}}"#;
        let tariff = Tariff::default();
        let result = extract_reading(body, &tariff);
        assert_eq!(result.kwh, 200.5);
        assert!((result.cost - tariff.estimate_cost(200.5)).abs() < 1e-9);
    }

    #[test]
    fn test_missing_cost_uses_custom_tariff() {
        let body = r#"{"data":[{"a":{"values":{"pos_kwh":"100"}}}]}"#;
        let tariff = Tariff {
            energy_charge_rate: 0.1,
            fuel_cost_adjustment: 0.0,
            customer_charge: 5.0,
        };
        let result = extract_reading(body, &tariff);
        assert!((result.cost - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_kwh_defaults_to_zero() {
        let body = r#"{"interval_a_totals":{"pos_wh_est_cost":"4.20"}}"#;
        assert_eq!(reading(body), UsageReading::new(0.0, 4.20));
    }

    #[test]
    fn test_numeric_fields_accept_numbers() {
        let body = r#"{"interval_a_totals":{"pos_kwh":12.5,"pos_wh_est_cost":3}}"#;
        assert_eq!(reading(body), UsageReading::new(12.5, 3.0));
    }

    #[test]
    fn test_malformed_bodies_yield_zero() {
        let bodies = [
            "not json",
            "",
            "[]",
            r#"{"interval_a_totals":{"pos_kwh":"abc"}}"#,
            r#"{"interval_a_totals":"oops"}"#,
            r#"{"data":"oops"}"#,
            r#"{"data":[null]}"#,
            r#"{"data":[{"a":{"values":"n/a"}}]}"#,
        ];
        for body in bodies {
            assert_eq!(reading(body), UsageReading::zero(), "body: {body}");
        }
    }

    #[test]
    fn test_malformed_lower_tier_does_not_affect_daily() {
        let body = r#"{
            "data":[{"a":{"values":{"pos_kwh":"100.5","pos_wh_est_cost":"12.34"}}}],
            "interval_a_totals":{"pos_kwh":"abc"},
            "interval_a_averages":"n/a"
        }"#;
        assert_eq!(reading(body), UsageReading::new(100.5, 12.34));
    }

    #[test]
    fn test_malformed_older_day_does_not_affect_newest() {
        let body = r#"{"data":[
            {"a":{"values":{"pos_kwh":"--"}}},
            "garbage",
            42,
            {"a":{"values":{"pos_kwh":"100.5","pos_wh_est_cost":"12.34"}}}
        ]}"#;
        assert_eq!(reading(body), UsageReading::new(100.5, 12.34));
    }

    #[test]
    fn test_malformed_unreached_averages_ignored_by_totals() {
        let body = r#"{"interval_a_totals":{"pos_kwh":"2","pos_wh_est_cost":"1"},"interval_a_averages":[1,2]}"#;
        assert_eq!(reading(body), UsageReading::new(2.0, 1.0));
    }

    #[test]
    fn test_malformed_selected_block_yields_zero() {
        let body = r#"{
            "data":[{"a":{"values":{"pos_kwh":"oops"}}}],
            "interval_a_totals":{"pos_kwh":"2","pos_wh_est_cost":"1"}
        }"#;
        assert!(UsagePayload::parse(body).is_err());
        assert_eq!(reading(body), UsageReading::zero());
    }

    #[test]
    fn test_null_daily_block_falls_through() {
        let body = r#"{"data":[{"a":{"values":{"pos_kwh":"3"}}},{"a":{"values":null}}],"interval_a_averages":{"pos_kwh":"1","pos_wh_est_cost":"2"}}"#;
        assert_eq!(reading(body), UsageReading::new(1.0, 2.0));
    }

    #[test]
    fn test_null_aggregates_are_absent() {
        let body = r#"{"interval_a_totals":null,"interval_a_averages":{"pos_kwh":"1","pos_wh_est_cost":"2"}}"#;
        assert_eq!(reading(body), UsageReading::new(1.0, 2.0));
    }
}
