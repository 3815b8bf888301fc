//! Post-hoc annualized economics from daily simulation results.

use std::fmt;

use serde::Serialize;

use super::types::DailyResult;
use crate::finance::Payback;
use crate::sizing::DimensioningResult;

const DAYS_PER_YEAR: f64 = 365.0;
const MONTHS_PER_YEAR: f64 = 12.0;

/// Inputs of [`summarize`] that do not come from the daily records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryParams {
    pub demand_charge_per_kw: f64,
    /// When absent, payback is [`Payback::Unknown`] and the run is not
    /// judged viable.
    pub investment_cost: Option<f64>,
    pub payback_threshold_years: f64,
}

impl Default for SummaryParams {
    fn default() -> Self {
        Self {
            demand_charge_per_kw: 50.0,
            investment_cost: None,
            payback_threshold_years: 10.0,
        }
    }
}

/// Aggregate economics derived from a complete run.
///
/// Computed from `&[DailyResult]` so reported figures always agree with the
/// daily data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSummary {
    pub days_simulated: usize,
    /// Sum of daily net energy savings over the simulated period.
    pub total_period_savings: f64,
    /// `total_period_savings` scaled to 365 days.
    pub annualized_savings: f64,
    pub average_demand_reduction_kw: f64,
    /// Demand charge avoided per year at the average reduction.
    pub demand_savings_annual: f64,
    /// `annualized_savings + demand_savings_annual`.
    pub total_annual_savings: f64,
    pub total_energy_charged_kwh: f64,
    pub total_energy_discharged_kwh: f64,
    pub payback: Payback,
    /// Payback within the threshold. Always `false` when payback is unknown.
    pub is_viable: bool,
}

/// Aggregates daily results into annualized economics.
///
/// An empty slice yields a zeroed, non-viable summary.
pub fn summarize(results: &[DailyResult], params: &SummaryParams) -> SimulationSummary {
    let days = results.len();
    let mut total_period_savings = 0.0;
    let mut reduction_sum = 0.0;
    let mut charged = 0.0;
    let mut discharged = 0.0;

    for r in results {
        total_period_savings += r.net_savings;
        reduction_sum += r.demand_reduction_kw;
        charged += r.energy_charged_kwh;
        discharged += r.energy_discharged_kwh;
    }

    let (annualized_savings, average_demand_reduction_kw) = if days > 0 {
        (
            total_period_savings * DAYS_PER_YEAR / days as f64,
            reduction_sum / days as f64,
        )
    } else {
        (0.0, 0.0)
    };

    let demand_savings_annual =
        average_demand_reduction_kw * params.demand_charge_per_kw * MONTHS_PER_YEAR;
    let total_annual_savings = annualized_savings + demand_savings_annual;

    let payback = match params.investment_cost {
        Some(investment) => Payback::from_savings(investment, total_annual_savings),
        None => Payback::Unknown,
    };
    let is_viable = days > 0 && payback.within(params.payback_threshold_years);

    SimulationSummary {
        days_simulated: days,
        total_period_savings,
        annualized_savings,
        average_demand_reduction_kw,
        demand_savings_annual,
        total_annual_savings,
        total_energy_charged_kwh: charged,
        total_energy_discharged_kwh: discharged,
        payback,
        is_viable,
    }
}

impl SimulationSummary {
    /// `"yes"`, `"no"`, or `"unknown"` when no investment cost was given.
    pub fn verdict(&self) -> &'static str {
        match (self.payback.is_known(), self.is_viable) {
            (false, _) => "unknown",
            (true, true) => "yes",
            (true, false) => "no",
        }
    }
}

/// Relative drift of simulated annual savings from the sizing estimate (%).
///
/// Positive when the simulation beats the estimate. `None` when the estimate
/// is zero.
pub fn sizing_divergence_percent(
    estimate: &DimensioningResult,
    summary: &SimulationSummary,
) -> Option<f64> {
    let expected = estimate.annual_savings_estimate;
    (expected != 0.0)
        .then(|| (summary.total_annual_savings - expected) / expected.abs() * 100.0)
}

impl fmt::Display for SimulationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Simulation Summary ---")?;
        writeln!(f, "Days simulated:        {}", self.days_simulated)?;
        writeln!(f, "Period savings:        {:.2}", self.total_period_savings)?;
        writeln!(f, "Annualized savings:    {:.2}", self.annualized_savings)?;
        writeln!(
            f,
            "Avg demand reduction:  {:.1} kW",
            self.average_demand_reduction_kw
        )?;
        writeln!(f, "Demand savings/yr:     {:.2}", self.demand_savings_annual)?;
        writeln!(f, "Total savings/yr:      {:.2}", self.total_annual_savings)?;
        writeln!(
            f,
            "Battery energy:        {:.1} kWh in, {:.1} kWh out",
            self.total_energy_charged_kwh, self.total_energy_discharged_kwh
        )?;
        writeln!(f, "Payback:               {}", self.payback)?;
        write!(f, "Viable:                {}", self.verdict())
    }
}
