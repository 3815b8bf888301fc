//! Payback / ROI arithmetic shared by the first-order sizing estimate and the
//! simulated summary, plus response-boundary rounding.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Simple payback period.
///
/// Zero or negative annual savings never pay back; that is reported as
/// `Infinite` instead of failing. Without an investment cost there is
/// nothing to pay back and the period is `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payback {
    Years(f64),
    Infinite,
    Unknown,
}

impl Payback {
    pub fn from_savings(investment_cost: f64, annual_savings: f64) -> Self {
        if annual_savings <= 0.0 {
            Self::Infinite
        } else {
            Self::Years(investment_cost / annual_savings)
        }
    }

    pub fn years(&self) -> Option<f64> {
        match self {
            Self::Years(y) => Some(*y),
            Self::Infinite | Self::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, Self::Infinite)
    }

    /// `true` when the payback falls within `threshold_years`.
    pub fn within(&self, threshold_years: f64) -> bool {
        self.years().is_some_and(|y| y <= threshold_years)
    }
}

impl fmt::Display for Payback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Years(y) => write!(f, "{y:.1} years"),
            Self::Infinite => f.write_str("never"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// Return on investment over `years`, in percent.
///
/// Negative savings yield a negative ROI; nothing is clamped.
pub fn roi_percent(investment_cost: f64, annual_savings: f64, years: f64) -> f64 {
    (annual_savings * years - investment_cost) / investment_cost * 100.0
}

/// Rounds to one decimal (power and energy at the response boundary).
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Rounds to two decimals (currency at the response boundary).
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
