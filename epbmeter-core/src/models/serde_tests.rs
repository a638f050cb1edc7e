//! Serde tests for core types.
//!
//! These cover the wire and config representations that other crates rely on:
//! account links written back out by the CLI, tariffs read from config files,
//! and readings emitted as JSON.

use serde_json::json;

use crate::{AccountLink, BillingPeriod, Credentials, Tariff, UsageReading};

// ============================================================================
// AccountLink
// ============================================================================

#[test]
fn test_account_link_preserves_unknown_fields() {
    let input = json!({
        "power_account": {"account_id": "42", "rate_code": "RS"},
        "premise": {"gis_id": "7", "city": "Chattanooga", "meter": "A1"},
        "is_primary": true
    });

    let link: AccountLink = serde_json::from_value(input).unwrap();
    let output = serde_json::to_value(&link).unwrap();

    assert_eq!(output["power_account"]["rate_code"], "RS");
    assert_eq!(output["premise"]["meter"], "A1");
    assert_eq!(output["is_primary"], true);
    assert_eq!(output["premise"]["gis_id"], "7");
}

#[test]
fn test_account_link_list() {
    let input = r#"[
        {"power_account": {"account_id": "1"}, "premise": {"gis_id": "10"}},
        {"power_account": {"account_id": "2"}, "premise": {}}
    ]"#;

    let links: Vec<AccountLink> = serde_json::from_str(input).unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(links[0].gis_id(), Some("10"));
    assert_eq!(links[1].gis_id(), None);
}

// ============================================================================
// Tariff
// ============================================================================

#[test]
fn test_tariff_partial_config_uses_defaults() {
    let tariff: Tariff = serde_json::from_str(r#"{"customer_charge": 12.0}"#).unwrap();
    assert_eq!(tariff.customer_charge, 12.0);
    assert_eq!(tariff.energy_charge_rate, Tariff::default().energy_charge_rate);
    assert_eq!(tariff.fuel_cost_adjustment, Tariff::default().fuel_cost_adjustment);
}

#[test]
fn test_tariff_empty_object_is_default() {
    let tariff: Tariff = serde_json::from_str("{}").unwrap();
    assert_eq!(tariff, Tariff::default());
}

// ============================================================================
// Readings, periods, credentials
// ============================================================================

#[test]
fn test_usage_reading_json_shape() {
    let value = serde_json::to_value(UsageReading::new(100.5, 12.34)).unwrap();
    assert_eq!(value, json!({"kwh": 100.5, "cost": 12.34}));
}

#[test]
fn test_billing_period_json_shape() {
    let value = serde_json::to_value(BillingPeriod { year: 2024, month: 12 }).unwrap();
    assert_eq!(value, json!({"year": 2024, "month": 12}));
}

#[test]
fn test_credentials_deserialize() {
    let creds: Credentials =
        serde_json::from_str(r#"{"username": "u", "password": "p"}"#).unwrap();
    assert_eq!(creds.username(), "u");
    assert_eq!(creds.password(), "p");
}
