use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::{TariffPeriod, TariffSchedule};
use crate::curve::LoadCurve;
use crate::error::{Error, Result};

/// Aggregate load statistics for one tariff period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodStats {
    /// Energy drawn during the period (kWh).
    pub total_kwh: f64,
    pub mean_kw: f64,
    pub max_kw: f64,
    pub min_kw: f64,
    pub sample_count: usize,
}

impl PeriodStats {
    const EMPTY: Self = Self {
        total_kwh: 0.0,
        mean_kw: 0.0,
        max_kw: 0.0,
        min_kw: 0.0,
        sample_count: 0,
    };
}

/// Text table of a classification result.
pub struct PeriodTable<'a>(pub &'a BTreeMap<TariffPeriod, PeriodStats>);

impl fmt::Display for PeriodTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Tariff Periods ---")?;
        writeln!(
            f,
            "{:<14}{:>8}{:>12}{:>10}{:>10}{:>10}",
            "period", "samples", "kWh", "mean kW", "max kW", "min kW"
        )?;
        for (period, s) in self.0 {
            writeln!(
                f,
                "{:<14}{:>8}{:>12.1}{:>10.1}{:>10.1}{:>10.1}",
                period.to_string(),
                s.sample_count,
                s.total_kwh,
                s.mean_kw,
                s.max_kw,
                s.min_kw
            )?;
        }
        Ok(())
    }
}

/// Running accumulator for one period; finalized into [`PeriodStats`].
#[derive(Debug, Clone, Copy)]
struct Accumulator {
    sum_kw: f64,
    energy_kwh: f64,
    max_kw: f64,
    min_kw: f64,
    count: usize,
}

impl Accumulator {
    const fn new() -> Self {
        Self {
            sum_kw: 0.0,
            energy_kwh: 0.0,
            max_kw: f64::NEG_INFINITY,
            min_kw: f64::INFINITY,
            count: 0,
        }
    }

    fn push(&mut self, kw: f64, dt_hours: f64) {
        self.sum_kw += kw;
        self.energy_kwh += kw * dt_hours;
        self.max_kw = self.max_kw.max(kw);
        self.min_kw = self.min_kw.min(kw);
        self.count += 1;
    }

    fn finish(self) -> PeriodStats {
        if self.count == 0 {
            return PeriodStats::EMPTY;
        }
        PeriodStats {
            total_kwh: self.energy_kwh,
            mean_kw: self.sum_kw / self.count as f64,
            max_kw: self.max_kw,
            min_kw: self.min_kw,
            sample_count: self.count,
        }
    }
}

/// Classifies every sample of `curve` into a tariff period and aggregates
/// per-period statistics in a single pass.
///
/// The returned map always holds all three periods; unused periods carry
/// zeroed stats with `sample_count == 0`.
///
/// # Errors
///
/// * [`Error::InvalidSchedule`] if `schedule` fails validation
/// * [`Error::EmptyCurve`] if `curve` has no samples
pub fn classify(
    curve: &LoadCurve,
    schedule: &TariffSchedule,
) -> Result<BTreeMap<TariffPeriod, PeriodStats>> {
    schedule.validate()?;
    if curve.is_empty() {
        return Err(Error::EmptyCurve);
    }

    let mut acc: BTreeMap<TariffPeriod, Accumulator> = TariffPeriod::ALL
        .iter()
        .map(|&p| (p, Accumulator::new()))
        .collect();

    for (index, sample) in curve.samples().iter().enumerate() {
        let period = schedule.period_at(&sample.timestamp);
        if let Some(a) = acc.get_mut(&period) {
            a.push(sample.power_kw, curve.step_hours(index));
        }
    }

    let stats = acc
        .into_iter()
        .map(|(period, a)| (period, a.finish()))
        .collect::<BTreeMap<_, _>>();

    tracing::debug!(
        samples = curve.len(),
        peak = stats[&TariffPeriod::Peak].sample_count,
        intermediate = stats[&TariffPeriod::Intermediate].sample_count,
        off_peak = stats[&TariffPeriod::OffPeak].sample_count,
        "classified load curve"
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::tariff::HourWindow;

    fn curve_from(y: i32, m: u32, d: u32, powers: &[f64]) -> LoadCurve {
        let start = NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap();
        LoadCurve::hourly(start, powers).unwrap()
    }

    #[test]
    fn table_lists_every_period() {
        let schedule = TariffSchedule::default();
        let curve = curve_from(2024, 1, 1, &[100.0; 24]);
        let stats = classify(&curve, &schedule).unwrap();
        let text = PeriodTable(&stats).to_string();
        assert!(text.starts_with("--- Tariff Periods ---"));
        assert_eq!(text.lines().count(), 5);
    }

    #[test]
    fn monday_has_three_peak_samples() {
        let schedule = TariffSchedule::peak_only(HourWindow::new(18, 21), 1.71, 0.72, 50.0);
        let curve = curve_from(2024, 1, 1, &[100.0; 24]);
        let stats = classify(&curve, &schedule).unwrap();
        assert_eq!(stats[&TariffPeriod::Peak].sample_count, 3);
        assert_eq!(stats[&TariffPeriod::Intermediate].sample_count, 0);
        assert_eq!(stats[&TariffPeriod::OffPeak].sample_count, 21);
    }

    #[test]
    fn every_sample_is_classified_once() {
        let powers: Vec<f64> = (0..24 * 14).map(|i| (i % 24) as f64 * 10.0).collect();
        let curve = curve_from(2024, 3, 1, &powers);
        let stats = classify(&curve, &TariffSchedule::default()).unwrap();
        let total: usize = stats.values().map(|s| s.sample_count).sum();
        assert_eq!(total, curve.len());
    }

    #[test]
    fn aggregates_match_peak_samples() {
        let mut day = vec![10.0; 24];
        day[18] = 300.0;
        day[19] = 450.0;
        day[20] = 150.0;
        let curve = curve_from(2024, 1, 1, &day);
        let stats = classify(&curve, &TariffSchedule::default()).unwrap();
        let peak = stats[&TariffPeriod::Peak];
        assert_eq!(peak.max_kw, 450.0);
        assert_eq!(peak.min_kw, 150.0);
        assert_eq!(peak.total_kwh, 900.0);
        assert!((peak.mean_kw - 300.0).abs() < 1e-9);
    }

    #[test]
    fn missing_early_reading_keeps_hourly_energy() {
        use crate::curve::PowerSample;

        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap();
        // 01:00 is missing
        let samples = (0..48)
            .filter(|&h| h != 1)
            .map(|h| PowerSample::new(start + chrono::TimeDelta::hours(h), 300.0))
            .collect();
        let curve = LoadCurve::new(samples).unwrap();
        let stats = classify(&curve, &TariffSchedule::default()).unwrap();
        // Monday and Tuesday, 18-21h at 300 kW
        assert_eq!(stats[&TariffPeriod::Peak].total_kwh, 1800.0);
    }

    #[test]
    fn weekend_curve_is_all_off_peak() {
        // 2024-01-06 is a Saturday
        let curve = curve_from(2024, 1, 6, &[80.0; 48]);
        let stats = classify(&curve, &TariffSchedule::default()).unwrap();
        assert_eq!(stats[&TariffPeriod::Peak].sample_count, 0);
        assert_eq!(stats[&TariffPeriod::OffPeak].sample_count, 48);
    }

    #[test]
    fn invalid_schedule_is_rejected_before_classifying() {
        let schedule = TariffSchedule {
            intermediate: vec![HourWindow::new(19, 20)],
            ..TariffSchedule::default()
        };
        let curve = curve_from(2024, 1, 1, &[1.0; 24]);
        assert!(matches!(
            classify(&curve, &schedule),
            Err(Error::InvalidSchedule(_))
        ));
    }
}
