//! Hour-of-day characterization of a load curve.

use std::fmt;

use chrono::Timelike;
use serde::Serialize;

use super::LoadCurve;

/// Hours whose mean load reaches this share of the curve peak count as peak hours.
const PEAK_HOUR_THRESHOLD: f64 = 0.90;
/// Hours whose mean load stays at or below this share of the peak count as valley hours.
const VALLEY_HOUR_THRESHOLD: f64 = 0.50;

/// Summary of the daily load shape, used to judge peak-shaving potential
/// before any sizing.
#[derive(Debug, Clone, Serialize)]
pub struct CurveProfile {
    pub max_kw: f64,
    pub min_kw: f64,
    pub mean_kw: f64,
    /// `(max - min) / mean`.
    pub variation_factor: f64,
    /// Mean load per hour of day (index = hour). Hours without samples are 0.
    pub hourly_mean_kw: [f64; 24],
    pub peak_hours: Vec<u32>,
    pub valley_hours: Vec<u32>,
    /// `max - mean`: the load that a perfectly flat profile would shave.
    pub peak_shaving_potential_kw: f64,
}

impl CurveProfile {
    pub fn from_curve(curve: &LoadCurve) -> Self {
        let mut sums = [0.0_f64; 24];
        let mut counts = [0_usize; 24];
        let mut max_kw = f64::NEG_INFINITY;
        let mut min_kw = f64::INFINITY;
        let mut total = 0.0;

        for s in curve.samples() {
            let h = s.timestamp.hour() as usize;
            sums[h] += s.power_kw;
            counts[h] += 1;
            max_kw = max_kw.max(s.power_kw);
            min_kw = min_kw.min(s.power_kw);
            total += s.power_kw;
        }

        let mean_kw = total / curve.len() as f64;
        let mut hourly_mean_kw = [0.0; 24];
        for h in 0..24 {
            if counts[h] > 0 {
                hourly_mean_kw[h] = sums[h] / counts[h] as f64;
            }
        }

        let peak_hours = (0..24u32)
            .filter(|&h| hourly_mean_kw[h as usize] >= max_kw * PEAK_HOUR_THRESHOLD)
            .collect();
        let valley_hours = (0..24u32)
            .filter(|&h| hourly_mean_kw[h as usize] <= max_kw * VALLEY_HOUR_THRESHOLD)
            .collect();

        let variation_factor = if mean_kw > 0.0 {
            (max_kw - min_kw) / mean_kw
        } else {
            0.0
        };

        Self {
            max_kw,
            min_kw,
            mean_kw,
            variation_factor,
            hourly_mean_kw,
            peak_hours,
            valley_hours,
            peak_shaving_potential_kw: max_kw - mean_kw,
        }
    }
}

impl fmt::Display for CurveProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Load Profile ---")?;
        writeln!(
            f,
            "Load (max/mean/min):   {:.1} / {:.1} / {:.1} kW",
            self.max_kw, self.mean_kw, self.min_kw
        )?;
        writeln!(f, "Variation factor:      {:.2}", self.variation_factor)?;
        writeln!(f, "Peak hours:            {:?}", self.peak_hours)?;
        writeln!(f, "Valley hours:          {:?}", self.valley_hours)?;
        write!(
            f,
            "Shaving potential:     {:.1} kW",
            self.peak_shaving_potential_kw
        )
    }
}
