//! Command-line arguments.

#[cfg(feature = "api")]
use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::config::{ConfigError, ScenarioConfig};
use crate::generator::Severity;
use crate::sim::types::ChargingStrategy;

#[derive(Debug, Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Args {
    /// Scenario TOML file.
    #[clap(long, global = true, env = "BESS_SCENARIO", conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Built-in scenario: reference, tarifa_branca or solar.
    #[clap(long, global = true)]
    pub preset: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Split a metered load curve by tariff period and profile it.
    Classify(InputArgs),

    /// First-order battery sizing from the peak period.
    Dimension(DimensionArgs),

    /// Simulate a battery over the curve, day by day.
    Simulate(Box<SimulateArgs>),

    /// Simulate several battery sizes against the same curve.
    Sweep(SweepArgs),

    /// Synthesize an hourly load curve.
    Generate(GenerateArgs),

    /// Serve the REST API.
    #[cfg(feature = "api")]
    Serve(ServeArgs),
}

#[derive(Debug, Parser)]
pub struct InputArgs {
    /// Meter export CSV: `Time stamp,[kW] Active Power Total`.
    pub input: PathBuf,
}

#[derive(Debug, Parser)]
pub struct DimensionArgs {
    #[clap(flatten)]
    pub input: InputArgs,

    /// Share of the peak demand to shave, overriding the scenario.
    #[clap(long)]
    pub reduction_percent: Option<f64>,

    /// Up-front cost, overriding the scenario.
    #[clap(long)]
    pub investment_cost: Option<f64>,
}

#[derive(Debug, Parser)]
pub struct SimulateArgs {
    #[clap(flatten)]
    pub sizing: DimensionArgs,

    /// Rated power (kW). Sized from the curve when neither the scenario nor
    /// this flag sets it.
    #[clap(long)]
    pub power_kw: Option<f64>,

    #[clap(long)]
    pub capacity_kwh: Option<f64>,

    /// `solar` or `grid-offpeak`.
    #[clap(long)]
    pub strategy: Option<ChargingStrategy>,

    /// Measured solar surplus in the meter CSV layout, aligned with the input.
    #[clap(long)]
    pub solar_csv: Option<PathBuf>,

    /// Write one row per day to this CSV file.
    #[clap(long)]
    pub daily_out: Option<PathBuf>,

    /// Write one row per sample to this CSV file.
    #[clap(long)]
    pub steps_out: Option<PathBuf>,
}

#[derive(Debug, Parser)]
pub struct SweepArgs {
    #[clap(flatten)]
    pub input: InputArgs,

    /// Peak shares to try (%), overriding the scenario.
    #[clap(long, value_delimiter = ',', num_args = 1..)]
    pub reductions: Vec<f64>,

    #[clap(long)]
    pub strategy: Option<ChargingStrategy>,
}

#[derive(Debug, Parser)]
pub struct GenerateArgs {
    /// Company size class, 1 to 5.
    #[clap(long)]
    pub stage: Option<u8>,

    /// `leve`, `moderado` or `grave`.
    #[clap(long)]
    pub severity: Option<Severity>,

    #[clap(long)]
    pub days: Option<u32>,

    #[clap(long)]
    pub seed: Option<u64>,

    #[clap(long)]
    pub start_date: Option<NaiveDate>,

    /// Write the curve here instead of stdout.
    #[clap(long, short)]
    pub out: Option<PathBuf>,
}

#[cfg(feature = "api")]
#[derive(Debug, Parser)]
pub struct ServeArgs {
    #[clap(long, default_value = "127.0.0.1:3000", env = "BESS_ADDR")]
    pub addr: SocketAddr,
    /// Oldest analyses are dropped beyond this many.
    #[clap(long, default_value_t = 10_000, env = "BESS_MAX_ANALYSES")]
    pub max_analyses: usize,
}

impl Args {
    /// Resolves the scenario: `--scenario` file, then `--preset`, then the
    /// reference preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for an unreadable file or unknown preset.
    pub fn scenario_config(&self) -> Result<ScenarioConfig, ConfigError> {
        match (&self.scenario, &self.preset) {
            (Some(path), _) => ScenarioConfig::from_toml_file(path),
            (None, Some(name)) => ScenarioConfig::from_preset(name),
            (None, None) => Ok(ScenarioConfig::reference()),
        }
    }
}
