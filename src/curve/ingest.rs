//! Boundary ingestion of metered load curves.
//!
//! Quality-meter exports arrive either as parallel arrays (timestamp strings
//! plus kW magnitudes) or as two-column CSV files. Both paths validate
//! everything up front and hand the engine a [`LoadCurve`].

use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;

use super::{LoadCurve, PowerSample};
use crate::error::{Error, Result};

/// Meter export format, e.g. `13/05/2024 18:00:00.000000`.
pub const METER_TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S%.f";

const ACCEPTED_FORMATS: &[&str] = &[
    METER_TIMESTAMP_FORMAT,
    "%d/%m/%Y %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Parses one timestamp in the meter format or ISO-8601 without offset.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    ACCEPTED_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Formats a timestamp the way the meter exports it.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%d/%m/%Y %H:%M:%S.000000").to_string()
}

/// Builds a load curve from parallel timestamp / power arrays.
///
/// # Errors
///
/// * [`Error::MismatchedArrayLength`] when the arrays differ in length
/// * [`Error::InvalidTimestamp`] for an unparseable timestamp
/// * any error of [`LoadCurve::new`]
pub fn from_parallel_arrays<S: AsRef<str>>(timestamps: &[S], powers_kw: &[f64]) -> Result<LoadCurve> {
    if timestamps.len() != powers_kw.len() {
        return Err(Error::MismatchedArrayLength {
            timestamps: timestamps.len(),
            powers: powers_kw.len(),
        });
    }

    let samples = timestamps
        .iter()
        .zip(powers_kw)
        .enumerate()
        .map(|(index, (raw, &kw))| {
            parse_timestamp(raw.as_ref())
                .map(|ts| PowerSample::new(ts, kw))
                .ok_or_else(|| Error::InvalidTimestamp {
                    index,
                    value: raw.as_ref().to_string(),
                })
        })
        .collect::<Result<Vec<_>>>()?;

    LoadCurve::new(samples)
}

/// Reads a two-column CSV (timestamp, kW) from any reader.
///
/// A first row whose timestamp cell does not parse is treated as a header
/// and skipped. Extra columns are ignored.
///
/// # Errors
///
/// Returns [`Error::Csv`] for malformed CSV, [`Error::InvalidSample`] for a
/// row with fewer than two columns or a non-numeric power, and the errors of
/// [`from_parallel_arrays`].
pub fn read_csv(reader: impl Read) -> Result<LoadCurve> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut timestamps = Vec::new();
    let mut powers = Vec::new();

    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        if record.len() < 2 {
            return Err(Error::InvalidSample {
                index: row,
                reason: format!("expected 2 columns, got {}", record.len()),
            });
        }
        if row == 0 && parse_timestamp(&record[0]).is_none() {
            continue;
        }
        let kw: f64 = record[1].parse().map_err(|_| Error::InvalidSample {
            index: row,
            reason: format!("power `{}` is not a number", &record[1]),
        })?;
        timestamps.push(record[0].to_string());
        powers.push(kw);
    }

    from_parallel_arrays(&timestamps, &powers)
}

/// Reads a two-column CSV file from disk. See [`read_csv`].
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be opened, plus the errors of
/// [`read_csv`].
pub fn read_csv_file(path: &Path) -> Result<LoadCurve> {
    let file = std::fs::File::open(path)?;
    read_csv(std::io::BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_meter_format_with_fraction() {
        let ts = parse_timestamp("13/05/2024 18:00:00.000000");
        assert_eq!(
            ts.map(|t| t.to_string()),
            Some("2024-05-13 18:00:00".to_string())
        );
    }

    #[test]
    fn parses_iso_format() {
        assert!(parse_timestamp("2024-05-13T18:00:00").is_some());
    }

    #[test]
    fn mismatched_lengths_rejected() {
        let err = from_parallel_arrays(&["01/01/2024 00:00:00.000000"], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            Error::MismatchedArrayLength {
                timestamps: 1,
                powers: 2
            }
        ));
    }

    #[test]
    fn bad_timestamp_reports_index() {
        let err = from_parallel_arrays(
            &["01/01/2024 00:00:00.000000", "yesterday"],
            &[1.0, 2.0],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidTimestamp { index: 1, .. }));
    }

    #[test]
    fn csv_with_header_is_read() {
        let data = "Time stamp,[kW] Active Power Total\n\
                    01/01/2024 00:00:00.000000,10.5\n\
                    01/01/2024 01:00:00.000000,12.0\n";
        let curve = read_csv(data.as_bytes()).unwrap();
        assert_eq!(curve.len(), 2);
        assert_eq!(curve.samples()[1].power_kw, 12.0);
    }

    #[test]
    fn csv_with_non_numeric_power_fails() {
        let data = "01/01/2024 00:00:00.000000,abc\n";
        assert!(matches!(
            read_csv(data.as_bytes()),
            Err(Error::InvalidSample { index: 0, .. })
        ));
    }

    #[test]
    fn format_round_trips_through_parser() {
        let ts = parse_timestamp("02/03/2024 07:00:00").unwrap();
        assert_eq!(format_timestamp(&ts), "02/03/2024 07:00:00.000000");
    }
}
