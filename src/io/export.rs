//! CSV export for daily results, per-sample steps, and load curves.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::curve::LoadCurve;
use crate::curve::ingest::format_timestamp;
use crate::sim::types::{DailyResult, StepResult};

const DAILY_HEADER: &[&str] = &[
    "day",
    "date",
    "peak_original_kw",
    "peak_with_bess_kw",
    "demand_reduction_kw",
    "energy_charged_kwh",
    "energy_discharged_kwh",
    "charging_cost",
    "discharging_savings",
    "net_savings",
    "soc_start_percent",
    "soc_end_percent",
];

const STEP_HEADER: &[&str] = &[
    "timestamp",
    "period",
    "mode",
    "original_kw",
    "net_kw",
    "energy_charged_kwh",
    "energy_discharged_kwh",
    "price_per_kwh",
    "soc_percent",
];

/// Header of the meter-style curve export.
const CURVE_HEADER: &[&str] = &["Time stamp", "[kW] Active Power Total"];

/// Writes one row per simulated day.
///
/// Produces deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_daily_csv(results: &[DailyResult], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(DAILY_HEADER)?;

    for r in results {
        wtr.write_record(&[
            r.day_index.to_string(),
            r.date.to_string(),
            format!("{:.1}", r.peak_demand_original_kw),
            format!("{:.1}", r.peak_demand_with_bess_kw),
            format!("{:.1}", r.demand_reduction_kw),
            format!("{:.1}", r.energy_charged_kwh),
            format!("{:.1}", r.energy_discharged_kwh),
            format!("{:.2}", r.charging_cost),
            format!("{:.2}", r.discharging_savings),
            format!("{:.2}", r.net_savings),
            format!("{:.1}", r.starting_soc_percent),
            format!("{:.1}", r.ending_soc_percent),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes one row per simulated sample.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_steps_csv(steps: &[StepResult], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(STEP_HEADER)?;

    for s in steps {
        wtr.write_record(&[
            s.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
            s.period.to_string(),
            s.mode.to_string(),
            format!("{:.4}", s.original_kw),
            format!("{:.4}", s.net_kw),
            format!("{:.4}", s.energy_charged_kwh),
            format!("{:.4}", s.energy_discharged_kwh),
            format!("{:.4}", s.price_per_kwh),
            format!("{:.4}", s.soc_percent),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes a load curve in the meter export layout, readable back by
/// [`crate::curve::ingest::read_csv`].
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_curve_csv(curve: &LoadCurve, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(CURVE_HEADER)?;
    for s in curve.samples() {
        wtr.write_record(&[format_timestamp(&s.timestamp), format!("{:.1}", s.power_kw)])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Opens `path` for buffered writing and hands it to `write`.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_to_path<F>(path: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(io::BufWriter<File>) -> io::Result<()>,
{
    let file = File::create(path)?;
    write(io::BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::curve::ingest::read_csv;
    use crate::sim::types::BatteryMode;
    use crate::tariff::TariffPeriod;

    fn make_day(i: usize) -> DailyResult {
        DailyResult {
            day_index: i,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            peak_demand_original_kw: 300.0,
            peak_demand_with_bess_kw: 210.04,
            demand_reduction_kw: 89.96,
            energy_charged_kwh: 160.0,
            energy_discharged_kwh: 270.0,
            charging_cost: 115.2,
            discharging_savings: 461.7,
            net_savings: 346.5,
            starting_soc_percent: 50.0,
            ending_soc_percent: 30.0,
        }
    }

    fn make_step(h: u32) -> StepResult {
        StepResult {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .and_then(|d| d.and_hms_opt(h, 0, 0))
                .unwrap(),
            period: TariffPeriod::OffPeak,
            mode: BatteryMode::Idle,
            original_kw: 100.0,
            net_kw: 100.0,
            energy_charged_kwh: 0.0,
            energy_discharged_kwh: 0.0,
            price_per_kwh: 0.72,
            soc_percent: 50.0,
        }
    }

    #[test]
    fn daily_header_and_rounding() {
        let mut buf = Vec::new();
        write_daily_csv(&[make_day(0)], &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let mut lines = output.lines();
        assert_eq!(lines.next(), Some(DAILY_HEADER.join(",").as_str()));
        let row: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(row[1], "2024-01-01");
        assert_eq!(row[4], "90.0");
        assert_eq!(row[9], "346.50");
    }

    #[test]
    fn step_row_count_matches_step_count() {
        let steps: Vec<StepResult> = (0..24).map(make_step).collect();
        let mut buf = Vec::new();
        write_steps_csv(&steps, &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        // 1 header + 24 data rows
        assert_eq!(output.lines().count(), 25);
        assert!(output.contains("off-peak,idle"));
    }

    #[test]
    fn deterministic_output() {
        let steps: Vec<StepResult> = (0..5).map(make_step).collect();
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        write_steps_csv(&steps, &mut buf1).unwrap();
        write_steps_csv(&steps, &mut buf2).unwrap();
        assert_eq!(buf1, buf2);
    }

    #[test]
    fn curve_export_reads_back() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 4)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        let curve = LoadCurve::hourly(start, &[10.5, 20.0, 30.2]).unwrap();
        let mut buf = Vec::new();
        write_curve_csv(&curve, &mut buf).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.contains("04/03/2024 00:00:00.000000,10.5"));
        assert_eq!(read_csv(buf.as_slice()).unwrap(), curve);
    }
}
