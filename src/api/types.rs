//! API request and response types.
//!
//! Requests are validated when converted into engine inputs. Responses are
//! the only place numbers get rounded: one decimal for power, energy and
//! SOC, two for currency.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::curve::LoadCurve;
use crate::curve::analysis::CurveProfile;
use crate::curve::ingest::{format_timestamp, from_parallel_arrays};
use crate::error::Result;
use crate::finance::{Payback, round1, round2};
use crate::generator::{GeneratedCase, Severity};
use crate::sim::summary::SimulationSummary;
use crate::sim::types::{ChargingStrategy, DailyResult};
use crate::sizing::DimensioningResult;
use crate::store::AnalysisRecord;
use crate::tariff::{HourWindow, PeriodStats, TariffPeriod, TariffSchedule};

/// Parallel timestamp / power arrays as exported by the meter.
#[derive(Debug, Clone, Deserialize)]
pub struct LoadCurveInput {
    pub timestamps: Vec<String>,
    pub powers_kw: Vec<f64>,
}

impl LoadCurveInput {
    /// # Errors
    ///
    /// Any ingestion error of [`from_parallel_arrays`].
    pub fn to_curve(&self) -> Result<LoadCurve> {
        from_parallel_arrays(&self.timestamps, &self.powers_kw)
    }
}

/// `POST /classify` body.
#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub load_curve: LoadCurveInput,
    /// Falls back to the server's configured tariff.
    pub tariff: Option<TariffSchedule>,
}

#[derive(Debug, Serialize)]
pub struct PeriodStatsRecord {
    pub total_kwh: f64,
    pub mean_kw: f64,
    pub max_kw: f64,
    pub min_kw: f64,
    pub sample_count: usize,
}

impl From<&PeriodStats> for PeriodStatsRecord {
    fn from(s: &PeriodStats) -> Self {
        Self {
            total_kwh: round1(s.total_kwh),
            mean_kw: round1(s.mean_kw),
            max_kw: round1(s.max_kw),
            min_kw: round1(s.min_kw),
            sample_count: s.sample_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileRecord {
    pub max_kw: f64,
    pub min_kw: f64,
    pub mean_kw: f64,
    pub variation_factor: f64,
    pub peak_hours: Vec<u32>,
    pub valley_hours: Vec<u32>,
    pub peak_shaving_potential_kw: f64,
}

impl From<&CurveProfile> for ProfileRecord {
    fn from(p: &CurveProfile) -> Self {
        Self {
            max_kw: round1(p.max_kw),
            min_kw: round1(p.min_kw),
            mean_kw: round1(p.mean_kw),
            variation_factor: round2(p.variation_factor),
            peak_hours: p.peak_hours.clone(),
            valley_hours: p.valley_hours.clone(),
            peak_shaving_potential_kw: round1(p.peak_shaving_potential_kw),
        }
    }
}

/// `POST /classify` response.
#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub periods: BTreeMap<TariffPeriod, PeriodStatsRecord>,
    pub profile: ProfileRecord,
}

/// `POST /dimension` body.
#[derive(Debug, Deserialize)]
pub struct DimensionRequest {
    pub load_curve: LoadCurveInput,
    pub peak_price: f64,
    pub off_peak_price: f64,
    pub demand_charge: f64,
    pub reduction_percent: f64,
    pub investment_cost: f64,
    /// Falls back to the server's configured peak window.
    pub peak_window: Option<HourWindow>,
}

/// `POST /dimension` response.
#[derive(Debug, Serialize)]
pub struct DimensionResponse {
    pub power_kw: f64,
    pub capacity_kwh: f64,
    pub peak_demand_kw: f64,
    pub demand_reduction_kw: f64,
    pub cost_per_kwh: f64,
    pub cost_per_kw: f64,
    pub demand_savings_annual: f64,
    pub energy_savings_annual: f64,
    pub energy_discharged_annual_kwh: f64,
    pub annual_savings_estimate: f64,
    /// `null` when the investment never pays back.
    pub payback_years: Option<f64>,
    pub roi_10y_percent: f64,
    pub is_viable: bool,
}

fn payback_years(p: Payback) -> Option<f64> {
    p.years().map(round1)
}

impl From<&DimensioningResult> for DimensionResponse {
    fn from(r: &DimensioningResult) -> Self {
        Self {
            power_kw: round1(r.bess_spec.power_kw),
            capacity_kwh: round1(r.bess_spec.capacity_kwh),
            peak_demand_kw: round1(r.peak_demand_kw),
            demand_reduction_kw: round1(r.demand_reduction_kw),
            cost_per_kwh: round2(r.cost_per_kwh),
            cost_per_kw: round2(r.cost_per_kw),
            demand_savings_annual: round2(r.demand_savings_annual),
            energy_savings_annual: round2(r.energy_savings_annual),
            energy_discharged_annual_kwh: round1(r.energy_discharged_annual_kwh),
            annual_savings_estimate: round2(r.annual_savings_estimate),
            payback_years: payback_years(r.payback),
            roi_10y_percent: round1(r.roi_10y_percent),
            is_viable: r.is_viable,
        }
    }
}

/// `POST /simulate` body.
#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    pub load_curve: LoadCurveInput,
    pub capacity_kwh: f64,
    pub power_kw: f64,
    pub strategy: ChargingStrategy,
    pub peak_price: f64,
    /// Defaults to `off_peak_price`.
    pub intermediate_price: Option<f64>,
    pub off_peak_price: f64,
    pub demand_charge: f64,
    pub investment_cost: Option<f64>,
    pub initial_soc_percent: Option<f64>,
    /// Measured surplus aligned with the curve; replaces the assumed profile.
    pub solar_surplus_kw: Option<Vec<f64>>,
}

#[derive(Debug, Serialize)]
pub struct DailyRecord {
    pub day_index: usize,
    pub date: NaiveDate,
    pub peak_demand_original_kw: f64,
    pub peak_demand_with_bess_kw: f64,
    pub demand_reduction_kw: f64,
    pub energy_charged_kwh: f64,
    pub energy_discharged_kwh: f64,
    pub charging_cost: f64,
    pub discharging_savings: f64,
    pub net_savings: f64,
    pub starting_soc_percent: f64,
    pub ending_soc_percent: f64,
}

impl From<&DailyResult> for DailyRecord {
    fn from(r: &DailyResult) -> Self {
        Self {
            day_index: r.day_index,
            date: r.date,
            peak_demand_original_kw: round1(r.peak_demand_original_kw),
            peak_demand_with_bess_kw: round1(r.peak_demand_with_bess_kw),
            demand_reduction_kw: round1(r.demand_reduction_kw),
            energy_charged_kwh: round1(r.energy_charged_kwh),
            energy_discharged_kwh: round1(r.energy_discharged_kwh),
            charging_cost: round2(r.charging_cost),
            discharging_savings: round2(r.discharging_savings),
            net_savings: round2(r.net_savings),
            starting_soc_percent: round1(r.starting_soc_percent),
            ending_soc_percent: round1(r.ending_soc_percent),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryRecord {
    pub days_simulated: usize,
    pub total_period_savings: f64,
    pub annualized_savings: f64,
    pub average_demand_reduction_kw: f64,
    pub demand_savings_annual: f64,
    pub total_annual_savings: f64,
    pub total_energy_charged_kwh: f64,
    pub total_energy_discharged_kwh: f64,
    /// `null` when the investment never pays back or is not known.
    pub payback_years: Option<f64>,
    /// `null` when no investment cost was given.
    pub is_viable: Option<bool>,
}

impl From<&SimulationSummary> for SummaryRecord {
    fn from(s: &SimulationSummary) -> Self {
        Self {
            days_simulated: s.days_simulated,
            total_period_savings: round2(s.total_period_savings),
            annualized_savings: round2(s.annualized_savings),
            average_demand_reduction_kw: round1(s.average_demand_reduction_kw),
            demand_savings_annual: round2(s.demand_savings_annual),
            total_annual_savings: round2(s.total_annual_savings),
            total_energy_charged_kwh: round1(s.total_energy_charged_kwh),
            total_energy_discharged_kwh: round1(s.total_energy_discharged_kwh),
            payback_years: payback_years(s.payback),
            is_viable: s.payback.is_known().then_some(s.is_viable),
        }
    }
}

/// `POST /simulate` response.
#[derive(Debug, Serialize)]
pub struct SimulateResponse {
    pub analysis_id: u64,
    pub daily_results: Vec<DailyRecord>,
    pub summary: SummaryRecord,
}

/// `POST /generate` body.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub stage: u8,
    pub severity: Severity,
    pub days: u32,
    /// Random seed when absent.
    pub seed: Option<u64>,
    /// Defaults to the server's configured start date.
    pub start_date: Option<NaiveDate>,
}

/// `POST /generate` response: metadata plus the curve in meter format.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub company_name: String,
    pub stage: u8,
    pub stage_description: &'static str,
    pub severity: Severity,
    pub days: u32,
    pub seed: u64,
    pub contracted_demand_kw: f64,
    pub max_kw: f64,
    pub min_kw: f64,
    pub mean_kw: f64,
    pub total_points: usize,
    pub load_curve: LoadCurveOutput,
}

#[derive(Debug, Serialize)]
pub struct LoadCurveOutput {
    pub timestamps: Vec<String>,
    pub powers_kw: Vec<f64>,
}

impl From<&LoadCurve> for LoadCurveOutput {
    fn from(curve: &LoadCurve) -> Self {
        let (timestamps, powers_kw) = curve
            .samples()
            .iter()
            .map(|s| (format_timestamp(&s.timestamp), s.power_kw))
            .unzip();
        Self {
            timestamps,
            powers_kw,
        }
    }
}

impl GenerateResponse {
    pub fn new(case: &GeneratedCase, seed: u64) -> Self {
        Self {
            company_name: case.company_name.clone(),
            stage: case.stage.into(),
            stage_description: case.stage_description,
            severity: case.severity,
            days: case.days,
            seed,
            contracted_demand_kw: case.contracted_demand_kw,
            max_kw: round1(case.max_kw),
            min_kw: round1(case.min_kw),
            mean_kw: round1(case.mean_kw),
            total_points: case.curve.len(),
            load_curve: LoadCurveOutput::from(&case.curve),
        }
    }
}

/// Stored analysis as returned by `GET /analyses`.
#[derive(Debug, Serialize)]
pub struct AnalysisRecordResponse {
    pub id: u64,
    pub created_at: String,
    pub power_kw: f64,
    pub capacity_kwh: f64,
    pub strategy: ChargingStrategy,
    pub summary: SummaryRecord,
}

impl From<&AnalysisRecord> for AnalysisRecordResponse {
    fn from(r: &AnalysisRecord) -> Self {
        Self {
            id: r.id,
            created_at: r.created_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            power_kw: round1(r.spec.power_kw),
            capacity_kwh: round1(r.spec.capacity_kwh),
            strategy: r.strategy,
            summary: SummaryRecord::from(&r.summary),
        }
    }
}
