//! Time-of-use tariff model: ponta / intermediária / fora-ponta.

/// Per-period aggregation of a load curve.
pub mod classifier;

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use classifier::{PeriodStats, classify};

/// Tariff period a sample is billed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TariffPeriod {
    Peak,
    Intermediate,
    OffPeak,
}

impl TariffPeriod {
    pub const ALL: [Self; 3] = [Self::Peak, Self::Intermediate, Self::OffPeak];
}

impl fmt::Display for TariffPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Peak => "peak",
            Self::Intermediate => "intermediate",
            Self::OffPeak => "off-peak",
        })
    }
}

/// Half-open hour-of-day window `[start_hour, end_hour)`.
///
/// Both bounds lie in `0..=23`, so the last hour of the day (23h) is never
/// inside any window and always falls back to off-peak. Windows never wrap
/// midnight: an overnight span such as 22h-06h cannot be expressed, only
/// its morning part `00h-06h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl HourWindow {
    pub const fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    pub fn contains(&self, hour: u32) -> bool {
        hour >= self.start_hour && hour < self.end_hour
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.start_hour < other.end_hour && other.start_hour < self.end_hour
    }

    /// Checks both bounds lie in `[0, 23]` and the window is non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSchedule`] naming `label` on violation.
    pub fn validate(&self, label: &str) -> Result<()> {
        if self.start_hour > 23 || self.end_hour > 23 {
            return Err(Error::InvalidSchedule(format!(
                "{label} window {self} has an hour outside [0, 23]"
            )));
        }
        if self.start_hour >= self.end_hour {
            return Err(Error::InvalidSchedule(format!(
                "{label} window {self} must start before it ends"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for HourWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}h-{:02}h", self.start_hour, self.end_hour)
    }
}

/// Tariff windows, prices and calendar rules for one facility.
///
/// Prices are per kWh except `demand_charge_per_kw`, which is per kW per
/// month. `intermediate` holds zero or more windows; an empty list means the
/// tariff has no intermediate period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TariffSchedule {
    pub peak: HourWindow,
    pub intermediate: Vec<HourWindow>,
    pub peak_price_per_kwh: f64,
    pub intermediate_price_per_kwh: f64,
    pub off_peak_price_per_kwh: f64,
    pub demand_charge_per_kw: f64,
    /// Surcharge applied to demand above the contracted value (%).
    pub peak_demand_penalty_percent: f64,
    /// When `true`, weekends are eligible for peak / intermediate billing.
    pub peak_on_weekends: bool,
    /// Dates billed entirely off-peak.
    pub holidays: Vec<NaiveDate>,
}

impl Default for TariffSchedule {
    fn default() -> Self {
        Self {
            peak: HourWindow::new(18, 21),
            intermediate: vec![HourWindow::new(17, 18), HourWindow::new(21, 22)],
            peak_price_per_kwh: 1.71,
            intermediate_price_per_kwh: 1.12,
            off_peak_price_per_kwh: 0.72,
            demand_charge_per_kw: 50.0,
            peak_demand_penalty_percent: 20.0,
            peak_on_weekends: false,
            holidays: Vec::new(),
        }
    }
}

impl TariffSchedule {
    /// Schedule with only a peak window and no intermediate period.
    pub fn peak_only(peak: HourWindow, peak_price: f64, off_peak_price: f64, demand_charge: f64) -> Self {
        Self {
            peak,
            intermediate: Vec::new(),
            peak_price_per_kwh: peak_price,
            intermediate_price_per_kwh: off_peak_price,
            off_peak_price_per_kwh: off_peak_price,
            demand_charge_per_kw: demand_charge,
            ..Self::default()
        }
    }

    /// Validates window bounds, window overlaps and prices.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSchedule`] describing the first violation.
    pub fn validate(&self) -> Result<()> {
        self.peak.validate("peak")?;
        for (i, window) in self.intermediate.iter().enumerate() {
            window.validate("intermediate")?;
            if window.overlaps(&self.peak) {
                return Err(Error::InvalidSchedule(format!(
                    "intermediate window {window} overlaps peak window {}",
                    self.peak
                )));
            }
            if let Some(other) = self.intermediate[..i].iter().find(|o| o.overlaps(window)) {
                return Err(Error::InvalidSchedule(format!(
                    "intermediate windows {other} and {window} overlap"
                )));
            }
        }

        let prices = [
            ("peak_price_per_kwh", self.peak_price_per_kwh),
            ("intermediate_price_per_kwh", self.intermediate_price_per_kwh),
            ("off_peak_price_per_kwh", self.off_peak_price_per_kwh),
            ("demand_charge_per_kw", self.demand_charge_per_kw),
            ("peak_demand_penalty_percent", self.peak_demand_penalty_percent),
        ];
        if let Some((name, value)) = prices.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            return Err(Error::InvalidSchedule(format!(
                "{name} must be finite and >= 0, got {value}"
            )));
        }
        Ok(())
    }

    /// Whether `date` can be billed at peak / intermediate rates at all.
    pub fn is_billing_day(&self, date: NaiveDate) -> bool {
        let weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
        (self.peak_on_weekends || !weekend) && !self.holidays.contains(&date)
    }

    /// Tariff period of a timestamp. First match wins: peak, then
    /// intermediate, then off-peak.
    pub fn period_at(&self, ts: &NaiveDateTime) -> TariffPeriod {
        if !self.is_billing_day(ts.date()) {
            return TariffPeriod::OffPeak;
        }
        let hour = ts.hour();
        if self.peak.contains(hour) {
            TariffPeriod::Peak
        } else if self.intermediate.iter().any(|w| w.contains(hour)) {
            TariffPeriod::Intermediate
        } else {
            TariffPeriod::OffPeak
        }
    }

    /// Energy price for a period.
    pub fn price_for(&self, period: TariffPeriod) -> f64 {
        match period {
            TariffPeriod::Peak => self.peak_price_per_kwh,
            TariffPeriod::Intermediate => self.intermediate_price_per_kwh,
            TariffPeriod::OffPeak => self.off_peak_price_per_kwh,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, 0, 0))
            .unwrap()
    }

    #[test]
    fn default_schedule_is_valid() {
        assert!(TariffSchedule::default().validate().is_ok());
    }

    #[test]
    fn overlapping_intermediate_rejected() {
        let schedule = TariffSchedule {
            intermediate: vec![HourWindow::new(17, 22)],
            ..TariffSchedule::default()
        };
        assert!(matches!(schedule.validate(), Err(Error::InvalidSchedule(_))));
    }

    #[test]
    fn out_of_range_hour_rejected() {
        let schedule = TariffSchedule {
            peak: HourWindow::new(18, 24),
            ..TariffSchedule::default()
        };
        assert!(matches!(schedule.validate(), Err(Error::InvalidSchedule(_))));
    }

    #[test]
    fn last_hour_of_day_is_always_off_peak() {
        let latest = HourWindow::new(18, 23);
        assert!(latest.validate("peak").is_ok());
        assert!(!latest.contains(23));

        let schedule = TariffSchedule {
            peak: latest,
            intermediate: vec![HourWindow::new(17, 18)],
            ..TariffSchedule::default()
        };
        schedule.validate().unwrap();
        assert_eq!(schedule.period_at(&at(2024, 1, 1, 22)), TariffPeriod::Peak);
        assert_eq!(schedule.period_at(&at(2024, 1, 1, 23)), TariffPeriod::OffPeak);
    }

    #[test]
    fn inverted_window_rejected() {
        let schedule = TariffSchedule {
            peak: HourWindow::new(21, 18),
            ..TariffSchedule::default()
        };
        assert!(schedule.validate().is_err());
    }

    #[test]
    fn weekday_periods() {
        let s = TariffSchedule::default();
        // 2024-01-01 is a Monday
        assert_eq!(s.period_at(&at(2024, 1, 1, 18)), TariffPeriod::Peak);
        assert_eq!(s.period_at(&at(2024, 1, 1, 20)), TariffPeriod::Peak);
        assert_eq!(s.period_at(&at(2024, 1, 1, 21)), TariffPeriod::Intermediate);
        assert_eq!(s.period_at(&at(2024, 1, 1, 17)), TariffPeriod::Intermediate);
        assert_eq!(s.period_at(&at(2024, 1, 1, 3)), TariffPeriod::OffPeak);
    }

    #[test]
    fn weekends_are_off_peak_unless_flagged() {
        let mut s = TariffSchedule::default();
        // 2024-01-06 is a Saturday
        assert_eq!(s.period_at(&at(2024, 1, 6, 19)), TariffPeriod::OffPeak);
        s.peak_on_weekends = true;
        assert_eq!(s.period_at(&at(2024, 1, 6, 19)), TariffPeriod::Peak);
    }

    #[test]
    fn holidays_are_off_peak() {
        let s = TariffSchedule {
            holidays: vec![NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()],
            ..TariffSchedule::default()
        };
        assert_eq!(s.period_at(&at(2024, 1, 1, 19)), TariffPeriod::OffPeak);
        assert_eq!(s.period_at(&at(2024, 1, 2, 19)), TariffPeriod::Peak);
    }
}
