//! Integration tests for billing period selection.

use chrono::{NaiveDate, TimeZone, Utc};
use epbmeter_core::{BillingPeriod, DEFAULT_ZONE_ID, parse_zone};

#[test]
fn test_first_days_of_year_query_last_december() {
    let date = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
    let period = BillingPeriod::for_date(date);
    assert_eq!((period.year, period.month), (2025, 12));
}

#[test]
fn test_mid_month_queries_current_month() {
    let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
    let period = BillingPeriod::for_date(date);
    assert_eq!((period.year, period.month), (2026, 10));
}

#[test]
fn test_utility_zone_decides_the_day() {
    let zone = parse_zone(DEFAULT_ZONE_ID).unwrap();

    // 23:30 in New York on Mar 3 is already Mar 4 in UTC.
    let now = Utc.with_ymd_and_hms(2026, 3, 4, 4, 30, 0).unwrap();
    let period = BillingPeriod::at(now, zone);
    assert_eq!((period.year, period.month), (2026, 2));
}
