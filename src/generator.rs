//! Deterministic synthetic industrial load curves.
//!
//! Curves follow a typical industrial day shape (night trough, morning ramp,
//! lunch dip, afternoon ramp, evening plateau) scaled to a contracted demand
//! drawn from the company stage, with uniform noise set by the severity.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::curve::{LoadCurve, PowerSample};
use crate::error::{Error, Result};
use crate::finance::round1;

pub const MAX_DAYS: u32 = 365;

const MIN_PER_UNIT: f64 = 0.1;
const MAX_PER_UNIT: f64 = 1.5;

const COMPANY_PREFIXES: &[&str] = &[
    "Metalúrgica",
    "Indústria",
    "Fábrica",
    "Manufatura",
    "Processadora",
    "Usinagem",
    "Plásticos",
    "Têxtil",
    "Alimentos",
    "Bebidas",
];

const COMPANY_NAMES: &[&str] = &[
    "Silva", "Santos", "Oliveira", "Costa", "Ferreira", "Gomes", "Martins", "Pereira", "Souza",
    "Rocha", "Alves", "Ribeiro", "Carvalho", "Barbosa", "Monteiro",
];

const COMPANY_SUFFIXES: &[&str] = &[
    "LTDA",
    "S.A.",
    "Ind.",
    "Manufatureira",
    "Processadora",
    "Usinagem",
    "Indústria",
];

/// Company size class; fixes the contracted-demand range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CompanyStage {
    SmallCommerce = 1,
    SmallIndustry = 2,
    MediumIndustry = 3,
    LargeIndustry = 4,
    HeavyIndustry = 5,
}

impl CompanyStage {
    /// Contracted demand range (kW).
    pub fn demand_range_kw(self) -> (f64, f64) {
        match self {
            Self::SmallCommerce => (10.0, 50.0),
            Self::SmallIndustry => (50.0, 150.0),
            Self::MediumIndustry => (150.0, 500.0),
            Self::LargeIndustry => (500.0, 1500.0),
            Self::HeavyIndustry => (1500.0, 5000.0),
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::SmallCommerce => "Pequeno Comércio",
            Self::SmallIndustry => "Pequena Indústria",
            Self::MediumIndustry => "Indústria Média",
            Self::LargeIndustry => "Indústria Grande",
            Self::HeavyIndustry => "Indústria Pesada",
        }
    }
}

impl TryFrom<u8> for CompanyStage {
    type Error = Error;

    fn try_from(stage: u8) -> Result<Self> {
        match stage {
            1 => Ok(Self::SmallCommerce),
            2 => Ok(Self::SmallIndustry),
            3 => Ok(Self::MediumIndustry),
            4 => Ok(Self::LargeIndustry),
            5 => Ok(Self::HeavyIndustry),
            other => Err(Error::parameter("stage", format!("must be 1-5, got {other}"))),
        }
    }
}

impl From<CompanyStage> for u8 {
    fn from(stage: CompanyStage) -> Self {
        stage as u8
    }
}

/// Noise level applied to the base shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Leve,
    Moderado,
    Grave,
}

impl Severity {
    /// Half-width of the uniform per-unit noise.
    pub fn noise_amplitude(self) -> f64 {
        match self {
            Self::Leve => 0.05,
            Self::Moderado => 0.15,
            Self::Grave => 0.30,
        }
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "leve" => Ok(Self::Leve),
            "moderado" => Ok(Self::Moderado),
            "grave" => Ok(Self::Grave),
            other => Err(Error::parameter(
                "severity",
                format!("expected `leve`, `moderado` or `grave`, got `{other}`"),
            )),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Leve => "leve",
            Self::Moderado => "moderado",
            Self::Grave => "grave",
        })
    }
}

/// Normalized industrial load shape for an hour of the day.
pub fn base_shape(hour: u32) -> f64 {
    match hour {
        0..6 => 0.35,
        6..12 => 0.35 + f64::from(hour - 6) * 0.08,
        12 => 0.73,
        13..18 => 0.73 + f64::from(hour - 13) * 0.05,
        18..22 => 0.98,
        _ => 0.98 - f64::from(hour.saturating_sub(22)) * 0.315,
    }
}

/// Request for one synthetic case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorParams {
    pub stage: CompanyStage,
    pub severity: Severity,
    pub days: u32,
    pub start_date: NaiveDate,
    pub seed: u64,
}

impl GeneratorParams {
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] when `days` is outside `1..=365`.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_DAYS).contains(&self.days) {
            return Err(Error::parameter(
                "days",
                format!("must be 1-{MAX_DAYS}, got {}", self.days),
            ));
        }
        Ok(())
    }
}

/// A generated curve plus the metadata describing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedCase {
    pub company_name: String,
    pub stage: CompanyStage,
    pub stage_description: &'static str,
    pub severity: Severity,
    pub days: u32,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub contracted_demand_kw: f64,
    pub max_kw: f64,
    pub min_kw: f64,
    pub mean_kw: f64,
    pub curve: LoadCurve,
}

fn pick<'a>(rng: &mut StdRng, items: &[&'a str]) -> &'a str {
    items[rng.random_range(0..items.len())]
}

impl fmt::Display for GeneratedCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Generated Load Curve ---")?;
        writeln!(f, "Company:               {}", self.company_name)?;
        writeln!(
            f,
            "Stage:                 {} ({})",
            u8::from(self.stage),
            self.stage_description
        )?;
        writeln!(f, "Severity:              {}", self.severity)?;
        writeln!(f, "Period:                {} .. {}", self.start, self.end)?;
        writeln!(f, "Contracted demand:     {:.1} kW", self.contracted_demand_kw)?;
        write!(
            f,
            "Load (max/mean/min):   {:.1} / {:.1} / {:.1} kW",
            self.max_kw, self.mean_kw, self.min_kw
        )
    }
}

/// Generates an hourly curve. Identical params always yield identical cases.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] for an out-of-range day count.
pub fn generate(params: &GeneratorParams) -> Result<GeneratedCase> {
    params.validate()?;
    let mut rng = StdRng::seed_from_u64(params.seed);

    let company_name = format!(
        "{} {} {}",
        pick(&mut rng, COMPANY_PREFIXES),
        pick(&mut rng, COMPANY_NAMES),
        pick(&mut rng, COMPANY_SUFFIXES),
    );

    let (lo, hi) = params.stage.demand_range_kw();
    let contracted_demand_kw = round1(rng.random_range(lo..=hi));

    let amplitude = params.severity.noise_amplitude();
    let start = params.start_date.and_time(chrono::NaiveTime::MIN);
    let hours = params.days * 24;
    let samples = (0..hours)
        .map(|i| {
            let hour = i % 24;
            let noise = rng.random_range(-amplitude..=amplitude);
            let per_unit = (base_shape(hour) + noise).clamp(MIN_PER_UNIT, MAX_PER_UNIT);
            PowerSample::new(
                start + TimeDelta::hours(i64::from(i)),
                round1(per_unit * contracted_demand_kw),
            )
        })
        .collect();
    let curve = LoadCurve::new(samples)?;

    let (max_kw, min_kw, sum) = curve.samples().iter().fold(
        (f64::NEG_INFINITY, f64::INFINITY, 0.0),
        |(max, min, sum), s| (max.max(s.power_kw), min.min(s.power_kw), sum + s.power_kw),
    );
    let (_, last) = curve.span();

    tracing::debug!(
        %company_name,
        stage = u8::from(params.stage),
        severity = %params.severity,
        days = params.days,
        contracted_demand_kw,
        "generated synthetic curve"
    );

    Ok(GeneratedCase {
        company_name,
        stage: params.stage,
        stage_description: params.stage.description(),
        severity: params.severity,
        days: params.days,
        start,
        end: last,
        contracted_demand_kw,
        max_kw,
        min_kw,
        mean_kw: sum / curve.len() as f64,
        curve,
    })
}
