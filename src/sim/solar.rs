//! Assumed on-site solar surplus used when no measured series is supplied.

use crate::tariff::HourWindow;

const SOLAR_NOON_HOUR: f64 = 12.0;
const SOLAR_SIGMA_HOURS: f64 = 3.0;
/// Share of the battery's rated power available as surplus at solar noon.
const SOLAR_PEAK_FRACTION: f64 = 0.8;

/// Gaussian daylight surplus centred at noon, scaled to the battery's rated
/// power (kW).
///
/// Zero outside `window` and from `cutoff_hour` on, so the battery never
/// charges inside the peak period.
pub fn assumed_surplus_kw(hour: u32, window: HourWindow, cutoff_hour: u32, power_kw: f64) -> f64 {
    if !window.contains(hour) || hour >= cutoff_hour {
        return 0.0;
    }
    let offset = f64::from(hour) - SOLAR_NOON_HOUR;
    let shape = (-(offset * offset) / (2.0 * SOLAR_SIGMA_HOURS * SOLAR_SIGMA_HOURS)).exp();
    shape * SOLAR_PEAK_FRACTION * power_kw
}
