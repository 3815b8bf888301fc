/// Battery state of charge and energy limits.
pub mod battery;
pub mod controller;
pub mod engine;
/// Assumed daylight surplus profile.
pub mod solar;
pub mod summary;
/// Parallel evaluation of candidate sizes.
pub mod sweep;
pub mod types;

pub use engine::simulate;
pub use summary::{SimulationSummary, SummaryParams, sizing_divergence_percent, summarize};
pub use types::{BessSpec, ChargingStrategy, DailyResult, SimulationOptions, SimulationRun};
