//! Billing period selection.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Time zone the utility operates in.
pub const DEFAULT_ZONE_ID: &str = "America/New_York";

/// Days at the start of a month during which the previous month is queried.
///
/// The provider has not populated the new month this early, so the last
/// complete month is more useful.
pub const PREVIOUS_MONTH_GRACE_DAYS: u32 = 3;

/// A calendar month that usage is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BillingPeriod {
    /// Calendar year.
    pub year: i32,
    /// Month, 1 through 12.
    pub month: u32,
}

impl BillingPeriod {
    /// Creates a billing period.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidData` if `month` is outside 1..=12.
    pub fn new(year: i32, month: u32) -> Result<Self, CoreError> {
        if !(1..=12).contains(&month) {
            return Err(CoreError::InvalidData(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }
        Ok(Self { year, month })
    }

    /// Period to query on `date`.
    ///
    /// On the first [`PREVIOUS_MONTH_GRACE_DAYS`] days of a month this is the
    /// previous month, otherwise the month containing `date`.
    pub fn for_date(date: NaiveDate) -> Self {
        let current = Self {
            year: date.year(),
            month: date.month(),
        };
        if date.day() <= PREVIOUS_MONTH_GRACE_DAYS {
            current.previous()
        } else {
            current
        }
    }

    /// Period to query at instant `now`, judged by the calendar in `zone`.
    pub fn at(now: DateTime<Utc>, zone: Tz) -> Self {
        Self::for_date(now.with_timezone(&zone).date_naive())
    }

    /// Period to query right now, judged by the calendar in `zone`.
    pub fn current(zone: Tz) -> Self {
        Self::at(Utc::now(), zone)
    }

    /// The month before this one.
    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Parses an IANA zone name such as `America/New_York`.
///
/// # Errors
///
/// Returns `CoreError::UnknownTimeZone` if the name is not in the tz database.
pub fn parse_zone(name: &str) -> Result<Tz, CoreError> {
    name.parse::<Tz>()
        .map_err(|_| CoreError::UnknownTimeZone(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_early_january_rolls_back_to_december() {
        for day in 1..=3 {
            let period = BillingPeriod::for_date(date(2025, 1, day));
            assert_eq!(period, BillingPeriod { year: 2024, month: 12 });
        }
    }

    #[test]
    fn test_early_month_uses_previous_month() {
        let period = BillingPeriod::for_date(date(2025, 7, 3));
        assert_eq!(period, BillingPeriod { year: 2025, month: 6 });
    }

    #[test]
    fn test_fourth_day_onwards_uses_current_month() {
        for month in 1..=12 {
            let period = BillingPeriod::for_date(date(2025, month, 4));
            assert_eq!(period, BillingPeriod { year: 2025, month });
        }
        let period = BillingPeriod::for_date(date(2025, 12, 31));
        assert_eq!(period, BillingPeriod { year: 2025, month: 12 });
    }

    #[test]
    fn test_at_uses_zone_calendar() {
        // 03:00 UTC on Feb 4 is still Feb 3 in New York.
        let now = Utc.with_ymd_and_hms(2025, 2, 4, 3, 0, 0).unwrap();
        let zone = parse_zone(DEFAULT_ZONE_ID).unwrap();
        assert_eq!(
            BillingPeriod::at(now, zone),
            BillingPeriod { year: 2025, month: 1 }
        );
        assert_eq!(
            BillingPeriod::at(now, chrono_tz::UTC),
            BillingPeriod { year: 2025, month: 2 }
        );
    }

    #[test]
    fn test_new_validates_month() {
        assert!(BillingPeriod::new(2025, 0).is_err());
        assert!(BillingPeriod::new(2025, 13).is_err());
        assert!(BillingPeriod::new(2025, 12).is_ok());
    }

    #[test]
    fn test_display() {
        assert_eq!(BillingPeriod { year: 2025, month: 3 }.to_string(), "2025-03");
    }

    #[test]
    fn test_parse_zone_unknown() {
        assert!(matches!(
            parse_zone("Mars/Olympus_Mons"),
            Err(CoreError::UnknownTimeZone(_))
        ));
    }
}
