//! Core simulation types: battery spec, run options, and per-day / per-step records.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::summary::SimulationSummary;
use crate::error::{Error, Result};
use crate::tariff::{HourWindow, TariffPeriod};

/// Battery ratings consumed by the simulation engine.
///
/// # Examples
///
/// ```
/// use bess_sim::sim::types::BessSpec;
///
/// let spec = BessSpec::new(90.0, 432.0);
/// assert!(spec.validate().is_ok());
/// assert_eq!(spec.usable_capacity_kwh(), 432.0 * 0.8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BessSpec {
    /// Rated charge / discharge power (kW).
    pub power_kw: f64,
    /// Nameplate energy capacity (kWh).
    pub capacity_kwh: f64,
    /// Fraction of charged energy that can later be discharged, in `(0, 1]`.
    pub round_trip_efficiency: f64,
    pub min_soc_percent: f64,
    pub max_soc_percent: f64,
}

impl BessSpec {
    pub const DEFAULT_EFFICIENCY: f64 = 0.90;
    pub const DEFAULT_MIN_SOC_PERCENT: f64 = 10.0;
    pub const DEFAULT_MAX_SOC_PERCENT: f64 = 90.0;

    /// Spec with default efficiency and SOC window.
    pub fn new(power_kw: f64, capacity_kwh: f64) -> Self {
        Self {
            power_kw,
            capacity_kwh,
            round_trip_efficiency: Self::DEFAULT_EFFICIENCY,
            min_soc_percent: Self::DEFAULT_MIN_SOC_PERCENT,
            max_soc_percent: Self::DEFAULT_MAX_SOC_PERCENT,
        }
    }

    /// Capacity between the SOC bounds (kWh).
    pub fn usable_capacity_kwh(&self) -> f64 {
        self.capacity_kwh * (self.max_soc_percent - self.min_soc_percent) / 100.0
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidBessSpec`] for non-positive power or capacity,
    /// efficiency outside `(0, 1]`, or an SOC window outside `0 <= min < max <= 100`.
    pub fn validate(&self) -> Result<()> {
        if !(self.power_kw.is_finite() && self.power_kw > 0.0) {
            return Err(Error::InvalidBessSpec(format!(
                "power_kw must be > 0, got {}",
                self.power_kw
            )));
        }
        if !(self.capacity_kwh.is_finite() && self.capacity_kwh > 0.0) {
            return Err(Error::InvalidBessSpec(format!(
                "capacity_kwh must be > 0, got {}",
                self.capacity_kwh
            )));
        }
        if !(self.round_trip_efficiency > 0.0 && self.round_trip_efficiency <= 1.0) {
            return Err(Error::InvalidBessSpec(format!(
                "round_trip_efficiency must be in (0, 1], got {}",
                self.round_trip_efficiency
            )));
        }
        if !(0.0 <= self.min_soc_percent
            && self.min_soc_percent < self.max_soc_percent
            && self.max_soc_percent <= 100.0)
        {
            return Err(Error::InvalidBessSpec(format!(
                "SOC window must satisfy 0 <= min < max <= 100, got [{}, {}]",
                self.min_soc_percent, self.max_soc_percent
            )));
        }
        Ok(())
    }
}

/// Where the battery gets its charging energy from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargingStrategy {
    /// Charge from on-site solar surplus; the energy is free.
    #[serde(rename = "solar")]
    Solar,
    /// Charge from the grid during the off-peak charge window.
    #[serde(rename = "grid-offpeak")]
    GridOffPeak,
}

impl FromStr for ChargingStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "solar" => Ok(Self::Solar),
            "grid-offpeak" => Ok(Self::GridOffPeak),
            other => Err(Error::parameter(
                "strategy",
                format!("expected `solar` or `grid-offpeak`, got `{other}`"),
            )),
        }
    }
}

impl fmt::Display for ChargingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Solar => "solar",
            Self::GridOffPeak => "grid-offpeak",
        })
    }
}

/// Battery operating state for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryMode {
    Charging,
    Discharging,
    Idle,
}

impl fmt::Display for BatteryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Charging => "charging",
            Self::Discharging => "discharging",
            Self::Idle => "idle",
        })
    }
}

/// Per-run knobs that are not part of the battery or the tariff.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOptions {
    /// SOC at the start of the first day (%).
    pub initial_soc_percent: f64,
    /// Grid charging window for [`ChargingStrategy::GridOffPeak`].
    pub off_peak_charge_window: HourWindow,
    /// Daylight window of the assumed solar profile.
    pub solar_window: HourWindow,
    /// Measured solar surplus aligned sample-by-sample with the load curve
    /// (kW). Replaces the assumed profile when present.
    pub solar_surplus_kw: Option<Vec<f64>>,
    /// Up-front cost used for the payback figure of the summary.
    pub investment_cost: Option<f64>,
    pub payback_threshold_years: f64,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            initial_soc_percent: 50.0,
            off_peak_charge_window: HourWindow::new(0, 6),
            solar_window: HourWindow::new(6, 18),
            solar_surplus_kw: None,
            investment_cost: None,
            payback_threshold_years: 10.0,
        }
    }
}

/// Complete record of one simulated sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    pub timestamp: NaiveDateTime,
    pub period: TariffPeriod,
    pub mode: BatteryMode,
    /// Facility demand without the battery (kW).
    pub original_kw: f64,
    /// Grid demand after battery discharge (kW). Charging is metered
    /// separately and not added here.
    pub net_kw: f64,
    pub energy_charged_kwh: f64,
    pub energy_discharged_kwh: f64,
    /// Energy price applied to this sample.
    pub price_per_kwh: f64,
    /// SOC after this sample (%).
    pub soc_percent: f64,
}

/// Outcome of one simulated day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyResult {
    pub day_index: usize,
    pub date: NaiveDate,
    pub peak_demand_original_kw: f64,
    pub peak_demand_with_bess_kw: f64,
    /// `original - with_bess`, never negative.
    pub demand_reduction_kw: f64,
    pub energy_charged_kwh: f64,
    pub energy_discharged_kwh: f64,
    pub charging_cost: f64,
    pub discharging_savings: f64,
    /// `discharging_savings - charging_cost`.
    pub net_savings: f64,
    pub starting_soc_percent: f64,
    pub ending_soc_percent: f64,
}

impl fmt::Display for DailyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "day {:>3} {} | peak {:>8.1} -> {:>8.1} kW (-{:.1}) | \
             in {:>7.1} kWh  out {:>7.1} kWh | cost {:>9.2}  saved {:>9.2}  net {:>9.2} | \
             SoC {:.1}% -> {:.1}%",
            self.day_index,
            self.date,
            self.peak_demand_original_kw,
            self.peak_demand_with_bess_kw,
            self.demand_reduction_kw,
            self.energy_charged_kwh,
            self.energy_discharged_kwh,
            self.charging_cost,
            self.discharging_savings,
            self.net_savings,
            self.starting_soc_percent,
            self.ending_soc_percent,
        )
    }
}

/// Everything one simulation run produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationRun {
    pub spec: BessSpec,
    pub strategy: ChargingStrategy,
    pub daily: Vec<DailyResult>,
    pub steps: Vec<StepResult>,
    pub summary: SimulationSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_spec_is_valid() {
        assert!(BessSpec::new(90.0, 432.0).validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_power_and_capacity() {
        assert!(matches!(
            BessSpec::new(0.0, 10.0).validate(),
            Err(Error::InvalidBessSpec(_))
        ));
        assert!(matches!(
            BessSpec::new(10.0, -1.0).validate(),
            Err(Error::InvalidBessSpec(_))
        ));
    }

    #[test]
    fn rejects_efficiency_out_of_range() {
        let mut spec = BessSpec::new(10.0, 40.0);
        spec.round_trip_efficiency = 0.0;
        assert!(spec.validate().is_err());
        spec.round_trip_efficiency = 1.01;
        assert!(spec.validate().is_err());
        spec.round_trip_efficiency = 1.0;
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn rejects_inverted_soc_window() {
        let mut spec = BessSpec::new(10.0, 40.0);
        spec.min_soc_percent = 80.0;
        spec.max_soc_percent = 20.0;
        assert!(spec.validate().is_err());
    }

    #[test]
    fn strategy_parses_wire_names() {
        assert_eq!("solar".parse::<ChargingStrategy>().ok(), Some(ChargingStrategy::Solar));
        assert_eq!(
            "grid-offpeak".parse::<ChargingStrategy>().ok(),
            Some(ChargingStrategy::GridOffPeak)
        );
        assert!("diesel".parse::<ChargingStrategy>().is_err());
        assert_eq!(ChargingStrategy::GridOffPeak.to_string(), "grid-offpeak");
    }
}
