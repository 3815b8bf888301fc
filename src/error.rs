//! Error taxonomy shared by every engine component.
//!
//! All variants are raised during eager validation, before any simulation
//! step runs. Degenerate financial outcomes are not errors; see
//! [`crate::finance::Payback`].

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("load curve has no samples")]
    EmptyCurve,

    #[error("invalid tariff schedule: {0}")]
    InvalidSchedule(String),

    #[error("insufficient data: {samples} samples, at least {required} required")]
    InsufficientData { samples: usize, required: usize },

    #[error("invalid BESS spec: {0}")]
    InvalidBessSpec(String),

    #[error("mismatched array lengths: {timestamps} timestamps, {powers} power values")]
    MismatchedArrayLength { timestamps: usize, powers: usize },

    #[error("invalid timestamp at index {index}: `{value}`")]
    InvalidTimestamp { index: usize, value: String },

    #[error("invalid sample at index {index}: {reason}")]
    InvalidSample { index: usize, reason: String },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("no samples fall in the peak tariff window")]
    NoPeakSamples,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// Short machine-readable name of the variant, used by the API layer.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyCurve => "EmptyCurve",
            Self::InvalidSchedule(_) => "InvalidSchedule",
            Self::InsufficientData { .. } => "InsufficientData",
            Self::InvalidBessSpec(_) => "InvalidBessSpec",
            Self::MismatchedArrayLength { .. } => "MismatchedArrayLength",
            Self::InvalidTimestamp { .. } => "InvalidTimestamp",
            Self::InvalidSample { .. } => "InvalidSample",
            Self::InvalidParameter { .. } => "InvalidParameter",
            Self::NoPeakSamples => "NoPeakSamples",
            Self::Csv(_) => "Csv",
            Self::Io(_) => "Io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = Error::MismatchedArrayLength {
            timestamps: 3,
            powers: 2,
        };
        assert_eq!(
            err.to_string(),
            "mismatched array lengths: 3 timestamps, 2 power values"
        );
        assert_eq!(err.kind(), "MismatchedArrayLength");
    }

    #[test]
    fn insufficient_data_reports_counts() {
        let err = Error::InsufficientData {
            samples: 5,
            required: 24,
        };
        assert!(err.to_string().contains("5 samples"));
    }
}
