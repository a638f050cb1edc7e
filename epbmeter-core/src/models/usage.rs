//! Usage-related types.
//!
//! - [`UsageReading`] - Normalized kWh and cost for one billing period
//! - [`Tariff`] - Rate schedule used to estimate cost when the API omits it

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ============================================================================
// Usage Reading
// ============================================================================

/// Energy usage and cost for one account and billing period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageReading {
    /// Energy consumed in kilowatt-hours.
    pub kwh: f64,
    /// Cost in US dollars.
    pub cost: f64,
}

impl UsageReading {
    /// Creates a reading.
    pub fn new(kwh: f64, cost: f64) -> Self {
        Self { kwh, cost }
    }

    /// A reading with no usage, returned when the provider has no data yet.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Returns true if both values are zero.
    pub fn is_zero(&self) -> bool {
        self.kwh == 0.0 && self.cost == 0.0
    }

    /// Average price per kWh, if any energy was used.
    pub fn cost_per_kwh(&self) -> Option<f64> {
        (self.kwh > 0.0).then(|| self.cost / self.kwh)
    }
}

// ============================================================================
// Tariff
// ============================================================================

/// Default base energy charge per kWh.
pub const DEFAULT_ENERGY_CHARGE_RATE: f64 = 0.095;

/// Default TVA fuel cost adjustment per kWh.
pub const DEFAULT_FUEL_COST_ADJUSTMENT: f64 = 0.029;

/// Default fixed monthly customer charge.
pub const DEFAULT_CUSTOMER_CHARGE: f64 = 9.81;

/// Residential rate schedule.
///
/// These values drift with the published rate schedule, so they are
/// configuration rather than constants baked into the client.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tariff {
    /// Energy charge per kWh.
    #[serde(default = "default_energy_charge_rate")]
    pub energy_charge_rate: f64,
    /// Fuel cost adjustment per kWh.
    #[serde(default = "default_fuel_cost_adjustment")]
    pub fuel_cost_adjustment: f64,
    /// Fixed customer charge per billing period.
    #[serde(default = "default_customer_charge")]
    pub customer_charge: f64,
}

fn default_energy_charge_rate() -> f64 {
    DEFAULT_ENERGY_CHARGE_RATE
}

fn default_fuel_cost_adjustment() -> f64 {
    DEFAULT_FUEL_COST_ADJUSTMENT
}

fn default_customer_charge() -> f64 {
    DEFAULT_CUSTOMER_CHARGE
}

impl Default for Tariff {
    fn default() -> Self {
        Self {
            energy_charge_rate: DEFAULT_ENERGY_CHARGE_RATE,
            fuel_cost_adjustment: DEFAULT_FUEL_COST_ADJUSTMENT,
            customer_charge: DEFAULT_CUSTOMER_CHARGE,
        }
    }
}

impl Tariff {
    /// Combined per-kWh rate.
    pub fn rate_per_kwh(&self) -> f64 {
        self.energy_charge_rate + self.fuel_cost_adjustment
    }

    /// Estimates the cost of `kwh` under this schedule.
    pub fn estimate_cost(&self, kwh: f64) -> f64 {
        kwh * self.rate_per_kwh() + self.customer_charge
    }

    /// Checks that every component is finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidConfig` naming the offending field.
    pub fn validate(&self) -> Result<(), CoreError> {
        let fields = [
            ("energy_charge_rate", self.energy_charge_rate),
            ("fuel_cost_adjustment", self.fuel_cost_adjustment),
            ("customer_charge", self.customer_charge),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(CoreError::InvalidConfig(format!(
                    "tariff.{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_cost_default_tariff() {
        let tariff = Tariff::default();
        let cost = tariff.estimate_cost(100.0);
        assert!((cost - (100.0 * 0.124 + 9.81)).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_cost_zero_kwh_is_customer_charge() {
        let tariff = Tariff::default();
        assert!((tariff.estimate_cost(0.0) - 9.81).abs() < 1e-9);
    }

    #[test]
    fn test_validate_rejects_negative() {
        let tariff = Tariff {
            customer_charge: -1.0,
            ..Tariff::default()
        };
        let err = tariff.validate().unwrap_err();
        assert!(err.to_string().contains("customer_charge"));
    }

    #[test]
    fn test_validate_rejects_nan() {
        let tariff = Tariff {
            energy_charge_rate: f64::NAN,
            ..Tariff::default()
        };
        assert!(tariff.validate().is_err());
    }

    #[test]
    fn test_cost_per_kwh() {
        assert_eq!(UsageReading::new(100.0, 12.5).cost_per_kwh(), Some(0.125));
        assert_eq!(UsageReading::zero().cost_per_kwh(), None);
    }

    #[test]
    fn test_zero_reading() {
        assert!(UsageReading::zero().is_zero());
        assert!(!UsageReading::new(0.0, 9.81).is_zero());
    }
}
