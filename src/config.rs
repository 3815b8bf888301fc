//! TOML-based scenario configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::generator::{CompanyStage, GeneratorParams, Severity};
use crate::sim::types::{BessSpec, ChargingStrategy, SimulationOptions};
use crate::sizing::DimensioningParams;
use crate::tariff::{HourWindow, TariffSchedule};

/// Top-level scenario configuration parsed from TOML.
///
/// Every section has defaults, so an empty file is a valid scenario. Load
/// from TOML with [`ScenarioConfig::from_toml_file`] or pick one of
/// [`ScenarioConfig::PRESETS`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Tariff windows, prices and calendar rules.
    #[serde(default)]
    pub tariff: TariffSchedule,
    /// Battery ratings. Power and capacity fall back to the sizing estimate.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// First-order sizing inputs.
    #[serde(default)]
    pub sizing: SizingConfig,
    /// Simulation run options.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Synthetic curve generation.
    #[serde(default)]
    pub generator: GeneratorConfig,
}

/// Battery ratings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Rated power (kW). Sized from the curve when absent.
    pub power_kw: Option<f64>,
    /// Nameplate capacity (kWh). Sized from the curve when absent.
    pub capacity_kwh: Option<f64>,
    pub round_trip_efficiency: f64,
    pub min_soc_percent: f64,
    pub max_soc_percent: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            power_kw: None,
            capacity_kwh: None,
            round_trip_efficiency: BessSpec::DEFAULT_EFFICIENCY,
            min_soc_percent: BessSpec::DEFAULT_MIN_SOC_PERCENT,
            max_soc_percent: BessSpec::DEFAULT_MAX_SOC_PERCENT,
        }
    }
}

impl BatteryConfig {
    /// Builds a spec, taking power and capacity from `sized` where the
    /// config leaves them unset.
    pub fn spec(&self, sized: Option<&BessSpec>) -> Option<BessSpec> {
        let power_kw = self.power_kw.or(sized.map(|s| s.power_kw))?;
        let capacity_kwh = self.capacity_kwh.or(sized.map(|s| s.capacity_kwh))?;
        Some(BessSpec {
            power_kw,
            capacity_kwh,
            round_trip_efficiency: self.round_trip_efficiency,
            min_soc_percent: self.min_soc_percent,
            max_soc_percent: self.max_soc_percent,
        })
    }

    /// `true` when power and capacity are both given explicitly.
    pub fn is_explicit(&self) -> bool {
        self.power_kw.is_some() && self.capacity_kwh.is_some()
    }
}

/// First-order sizing inputs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SizingConfig {
    /// Share of the peak demand to shave (%).
    pub reduction_percent: f64,
    pub investment_cost: f64,
    pub discharge_hours: f64,
    pub safety_margin: f64,
    pub working_days_per_year: f64,
    pub payback_threshold_years: f64,
    pub analysis_years: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        let p = DimensioningParams::default();
        Self {
            reduction_percent: 20.0,
            investment_cost: 500_000.0,
            discharge_hours: p.discharge_hours,
            safety_margin: p.safety_margin,
            working_days_per_year: p.working_days_per_year,
            payback_threshold_years: p.payback_threshold_years,
            analysis_years: p.analysis_years,
        }
    }
}

impl SizingConfig {
    pub fn params(&self) -> DimensioningParams {
        DimensioningParams {
            discharge_hours: self.discharge_hours,
            safety_margin: self.safety_margin,
            working_days_per_year: self.working_days_per_year,
            payback_threshold_years: self.payback_threshold_years,
            analysis_years: self.analysis_years,
        }
    }
}

/// Simulation run options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// `"solar"` or `"grid-offpeak"`.
    pub strategy: ChargingStrategy,
    /// SOC at the start of the first day (%).
    pub initial_soc_percent: f64,
    /// Grid charging window for the `grid-offpeak` strategy.
    pub off_peak_charge_window: HourWindow,
    /// Daylight window of the assumed solar profile.
    pub solar_window: HourWindow,
    /// Reductions (% of peak) evaluated by the sizing sweep.
    pub sweep_reductions: Vec<f64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let o = SimulationOptions::default();
        Self {
            strategy: ChargingStrategy::GridOffPeak,
            initial_soc_percent: o.initial_soc_percent,
            off_peak_charge_window: o.off_peak_charge_window,
            solar_window: o.solar_window,
            sweep_reductions: vec![10.0, 20.0, 30.0, 40.0],
        }
    }
}

/// Synthetic curve generation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Company stage 1-5.
    pub stage: u8,
    pub severity: Severity,
    pub days: u32,
    pub start_date: NaiveDate,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            stage: 3,
            severity: Severity::Moderado,
            days: 30,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            seed: 42,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"battery.min_soc_percent"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl ScenarioConfig {
    /// Green-tariff style reference: peak 18-21h, no intermediate period,
    /// grid charging overnight.
    pub fn reference() -> Self {
        Self {
            tariff: TariffSchedule::peak_only(HourWindow::new(18, 21), 1.71, 0.72, 50.0),
            ..Self::default()
        }
    }

    /// Three-period tariff with intermediate shoulders and no demand charge.
    pub fn tarifa_branca() -> Self {
        Self {
            tariff: TariffSchedule {
                peak_price_per_kwh: 1.15,
                intermediate_price_per_kwh: 0.75,
                off_peak_price_per_kwh: 0.55,
                demand_charge_per_kw: 0.0,
                ..TariffSchedule::default()
            },
            ..Self::default()
        }
    }

    /// Reference tariff with a solar-charged battery.
    pub fn solar() -> Self {
        let reference = Self::reference();
        Self {
            simulation: SimulationConfig {
                strategy: ChargingStrategy::Solar,
                ..reference.simulation
            },
            ..reference
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["reference", "tarifa_branca", "solar"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "reference" => Ok(Self::reference()),
            "tarifa_branca" => Ok(Self::tarifa_branca()),
            "solar" => Ok(Self::solar()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Simulation options derived from the `simulation` and `sizing` sections.
    pub fn simulation_options(&self) -> SimulationOptions {
        SimulationOptions {
            initial_soc_percent: self.simulation.initial_soc_percent,
            off_peak_charge_window: self.simulation.off_peak_charge_window,
            solar_window: self.simulation.solar_window,
            solar_surplus_kw: None,
            investment_cost: Some(self.sizing.investment_cost),
            payback_threshold_years: self.sizing.payback_threshold_years,
        }
    }

    /// Generator request from the `generator` section.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for an unknown stage.
    pub fn generator_params(&self) -> Result<GeneratorParams, ConfigError> {
        let g = &self.generator;
        let stage = CompanyStage::try_from(g.stage)
            .map_err(|e| ConfigError::new("generator.stage", e.to_string()))?;
        Ok(GeneratorParams {
            stage,
            severity: g.severity,
            days: g.days,
            start_date: g.start_date,
            seed: g.seed,
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if let Err(e) = self.tariff.validate() {
            errors.push(ConfigError::new("tariff", e.to_string()));
        }

        let bat = &self.battery;
        for (field, value) in [
            ("battery.power_kw", bat.power_kw),
            ("battery.capacity_kwh", bat.capacity_kwh),
        ] {
            if value.is_some_and(|v| v <= 0.0) {
                errors.push(ConfigError::new(field, "must be > 0"));
            }
        }
        if !(bat.round_trip_efficiency > 0.0 && bat.round_trip_efficiency <= 1.0) {
            errors.push(ConfigError::new(
                "battery.round_trip_efficiency",
                "must be in (0.0, 1.0]",
            ));
        }
        if !(0.0 <= bat.min_soc_percent
            && bat.min_soc_percent < bat.max_soc_percent
            && bat.max_soc_percent <= 100.0)
        {
            errors.push(ConfigError::new(
                "battery.min_soc_percent",
                "must satisfy 0 <= min_soc_percent < max_soc_percent <= 100",
            ));
        }

        let sz = &self.sizing;
        if !(sz.reduction_percent > 0.0 && sz.reduction_percent <= 100.0) {
            errors.push(ConfigError::new(
                "sizing.reduction_percent",
                "must be in (0, 100]",
            ));
        }
        if sz.investment_cost <= 0.0 {
            errors.push(ConfigError::new("sizing.investment_cost", "must be > 0"));
        }
        if let Err(e) = sz.params().validate() {
            errors.push(ConfigError::new("sizing", e.to_string()));
        }

        let sim = &self.simulation;
        if !(bat.min_soc_percent..=bat.max_soc_percent).contains(&sim.initial_soc_percent) {
            errors.push(ConfigError::new(
                "simulation.initial_soc_percent",
                "must lie within the battery SOC window",
            ));
        }
        for (field, window) in [
            ("simulation.off_peak_charge_window", sim.off_peak_charge_window),
            ("simulation.solar_window", sim.solar_window),
        ] {
            if let Err(e) = window.validate(field) {
                errors.push(ConfigError::new(field, e.to_string()));
            }
        }
        if sim
            .sweep_reductions
            .iter()
            .any(|r| !(*r > 0.0 && *r <= 100.0))
        {
            errors.push(ConfigError::new(
                "simulation.sweep_reductions",
                "every value must be in (0, 100]",
            ));
        }

        match self.generator_params() {
            Ok(params) => {
                if let Err(e) = params.validate() {
                    errors.push(ConfigError::new("generator.days", e.to_string()));
                }
            }
            Err(e) => errors.push(e),
        }

        errors
    }
}
