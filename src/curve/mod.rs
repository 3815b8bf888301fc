//! Load-curve time series: validated, immutable sequences of power samples.

/// Hour-of-day load profile analysis.
pub mod analysis;
/// Boundary ingestion from parallel arrays and CSV exports.
pub mod ingest;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One metered power reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerSample {
    /// Local facility time of the reading.
    pub timestamp: NaiveDateTime,
    /// Average active power over the interval (kW, >= 0).
    pub power_kw: f64,
}

impl PowerSample {
    pub fn new(timestamp: NaiveDateTime, power_kw: f64) -> Self {
        Self {
            timestamp,
            power_kw,
        }
    }
}

/// Ordered series of power samples with strictly increasing timestamps.
///
/// Only constructible through [`LoadCurve::new`] (or the ingestion helpers
/// that call it), so every instance upholds the ordering and non-negativity
/// invariants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadCurve {
    samples: Vec<PowerSample>,
    /// Nominal cadence: the smallest gap between consecutive samples (h).
    #[serde(skip)]
    interval_hours: f64,
}

/// Shortest accepted gap between consecutive samples (ms).
const MIN_GAP_MS: i64 = 1000;

impl LoadCurve {
    /// Validates and wraps a sample vector.
    ///
    /// # Errors
    ///
    /// * [`Error::EmptyCurve`] when `samples` is empty
    /// * [`Error::InvalidSample`] for negative or non-finite power, or a
    ///   timestamp less than one second after its predecessor
    pub fn new(samples: Vec<PowerSample>) -> Result<Self> {
        if samples.is_empty() {
            return Err(Error::EmptyCurve);
        }

        for (index, sample) in samples.iter().enumerate() {
            if !sample.power_kw.is_finite() || sample.power_kw < 0.0 {
                return Err(Error::InvalidSample {
                    index,
                    reason: format!("power must be finite and >= 0, got {}", sample.power_kw),
                });
            }
            let too_close = index > 0
                && (sample.timestamp - samples[index - 1].timestamp).num_milliseconds()
                    < MIN_GAP_MS;
            if too_close {
                return Err(Error::InvalidSample {
                    index,
                    reason: format!(
                        "timestamp {} is not at least 1 s after {}",
                        sample.timestamp,
                        samples[index - 1].timestamp
                    ),
                });
            }
        }

        let interval_hours = samples
            .windows(2)
            .map(|w| gap_hours(&w[0], &w[1]))
            .reduce(f64::min)
            .unwrap_or(1.0);

        Ok(Self {
            samples,
            interval_hours,
        })
    }

    /// Builds an hourly curve starting at `start` from a slice of kW values.
    ///
    /// # Errors
    ///
    /// Same as [`LoadCurve::new`].
    pub fn hourly(start: NaiveDateTime, powers_kw: &[f64]) -> Result<Self> {
        let samples = powers_kw
            .iter()
            .enumerate()
            .map(|(i, &kw)| PowerSample::new(start + TimeDelta::hours(i as i64), kw))
            .collect();
        Self::new(samples)
    }

    pub fn samples(&self) -> &[PowerSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Nominal measurement interval in hours: the smallest gap in the
    /// curve, so missing readings do not stretch it.
    ///
    /// One hour for single-sample curves.
    pub fn interval_hours(&self) -> f64 {
        self.interval_hours
    }

    /// Duration represented by sample `index` (h).
    ///
    /// The gap to the next sample, or from the previous one for the last
    /// sample, capped at [`LoadCurve::interval_hours`]. A missing reading
    /// is therefore never filled in by its neighbour.
    pub fn step_hours(&self, index: usize) -> f64 {
        let gap = match (self.samples.get(index), self.samples.get(index + 1)) {
            (Some(s), Some(next)) => gap_hours(s, next),
            (Some(s), None) if index > 0 => gap_hours(&self.samples[index - 1], s),
            _ => self.interval_hours,
        };
        gap.min(self.interval_hours)
    }

    /// First and last timestamps.
    pub fn span(&self) -> (NaiveDateTime, NaiveDateTime) {
        let first = self.samples[0].timestamp;
        let last = self.samples[self.samples.len() - 1].timestamp;
        (first, last)
    }

    /// Peak sample power over the whole curve.
    pub fn max_kw(&self) -> f64 {
        self.samples
            .iter()
            .map(|s| s.power_kw)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Splits the curve into consecutive calendar days.
    ///
    /// Relies on the ordering invariant: samples of one date are contiguous.
    pub fn days(&self) -> Vec<(NaiveDate, &[PowerSample])> {
        let mut days = Vec::new();
        let mut start = 0;
        for i in 1..=self.samples.len() {
            let boundary = i == self.samples.len()
                || self.samples[i].timestamp.date() != self.samples[start].timestamp.date();
            if boundary {
                days.push((self.samples[start].timestamp.date(), &self.samples[start..i]));
                start = i;
            }
        }
        days
    }
}

fn gap_hours(a: &PowerSample, b: &PowerSample) -> f64 {
    (b.timestamp - a.timestamp).num_milliseconds() as f64 / 3_600_000.0
}
