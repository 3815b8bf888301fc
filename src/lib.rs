//! Battery energy storage sizing and peak-shaving simulation for
//! commercial and industrial load curves.

/// REST API (requires the `api` feature).
#[cfg(feature = "api")]
pub mod api;
pub mod cli;
pub mod config;
/// Load curves: ingestion and profiling.
pub mod curve;
pub mod error;
pub mod finance;
/// Synthetic load curve generation.
pub mod generator;
pub mod io;
/// Day-by-day battery simulation, summaries and sizing sweeps.
pub mod sim;
pub mod sizing;
pub mod store;
/// Time-of-use tariff schedules and period classification.
pub mod tariff;
pub mod telemetry;

pub use error::{Error, Result};
