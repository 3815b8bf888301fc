//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use std::path::PathBuf;

use bess_sim::curve::LoadCurve;
use bess_sim::io::export::write_curve_csv;
use bess_sim::tariff::{HourWindow, TariffSchedule};
use chrono::{NaiveDate, NaiveDateTime};

/// Monday 2024-01-01 00:00.
pub fn monday() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap()
}

/// One industrial day: 150 kW overnight, 300 kW during shifts, 450 kW
/// from 18:00 to 21:00.
pub fn industrial_day() -> Vec<f64> {
    (0..24)
        .map(|h| match h {
            18..=20 => 450.0,
            7..=17 => 300.0,
            _ => 150.0,
        })
        .collect()
}

/// `days` consecutive industrial days starting on a Monday.
pub fn industrial_curve(days: usize) -> LoadCurve {
    let powers: Vec<f64> = (0..days).flat_map(|_| industrial_day()).collect();
    LoadCurve::hourly(monday(), &powers).unwrap()
}

/// Peak 18-21h, no intermediate period, demand charge 50 per kW.
pub fn reference_schedule() -> TariffSchedule {
    TariffSchedule::peak_only(HourWindow::new(18, 21), 1.71, 0.72, 50.0)
}

/// Writes `curve` in the meter CSV layout to a fresh temp file.
pub fn write_temp_curve(name: &str, curve: &LoadCurve) -> PathBuf {
    let path = temp_path(name);
    let file = std::fs::File::create(&path).unwrap();
    write_curve_csv(curve, file).unwrap();
    path
}

/// Unique path under the system temp dir.
pub fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("bess-sim-{}-{name}", std::process::id()))
}
