//! First-order BESS sizing from classified peak statistics.
//!
//! The estimate assumes the battery shaves `reduction_percent` of the peak
//! demand for `discharge_hours` every working day, recharging at the
//! off-peak price. The simulation engine refines it against the real curve.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::finance::{Payback, roi_percent};
use crate::sim::types::BessSpec;
use crate::tariff::{PeriodStats, TariffPeriod, TariffSchedule};

/// Sizing constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DimensioningParams {
    /// Hours of rated discharge the battery must sustain.
    pub discharge_hours: f64,
    /// Capacity oversizing factor on top of `power * discharge_hours`.
    pub safety_margin: f64,
    pub working_days_per_year: f64,
    pub payback_threshold_years: f64,
    /// Horizon of the ROI figure.
    pub analysis_years: f64,
}

impl Default for DimensioningParams {
    fn default() -> Self {
        Self {
            discharge_hours: 4.0,
            safety_margin: 1.2,
            working_days_per_year: 250.0,
            payback_threshold_years: 10.0,
            analysis_years: 10.0,
        }
    }
}

impl DimensioningParams {
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for any non-positive constant.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("discharge_hours", self.discharge_hours),
            ("safety_margin", self.safety_margin),
            ("working_days_per_year", self.working_days_per_year),
            ("payback_threshold_years", self.payback_threshold_years),
            ("analysis_years", self.analysis_years),
        ];
        match fields.iter().find(|(_, v)| !(v.is_finite() && *v > 0.0)) {
            Some(&(name, value)) => Err(Error::parameter(name, format!("must be > 0, got {value}"))),
            None => Ok(()),
        }
    }
}

/// Battery size plus first-order economics. Values are full precision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensioningResult {
    pub bess_spec: BessSpec,
    /// Maximum demand observed in the peak period (kW).
    pub peak_demand_kw: f64,
    /// Demand the battery is sized to shave; equals `bess_spec.power_kw`.
    pub demand_reduction_kw: f64,
    pub cost_per_kwh: f64,
    pub cost_per_kw: f64,
    pub demand_savings_annual: f64,
    /// Peak / off-peak spread on the energy shifted per year. May be negative.
    pub energy_savings_annual: f64,
    pub energy_discharged_annual_kwh: f64,
    pub annual_savings_estimate: f64,
    pub payback: Payback,
    pub roi_10y_percent: f64,
    pub is_viable: bool,
}

impl fmt::Display for DimensioningResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Sizing Estimate ---")?;
        writeln!(f, "Peak demand:           {:.1} kW", self.peak_demand_kw)?;
        writeln!(
            f,
            "BESS:                  {:.1} kW / {:.1} kWh",
            self.bess_spec.power_kw, self.bess_spec.capacity_kwh
        )?;
        writeln!(
            f,
            "Unit cost:             {:.2} /kWh, {:.2} /kW",
            self.cost_per_kwh, self.cost_per_kw
        )?;
        writeln!(f, "Demand savings/yr:     {:.2}", self.demand_savings_annual)?;
        writeln!(
            f,
            "Energy savings/yr:     {:.2} ({:.1} kWh shifted)",
            self.energy_savings_annual, self.energy_discharged_annual_kwh
        )?;
        writeln!(f, "Total savings/yr:      {:.2}", self.annual_savings_estimate)?;
        writeln!(f, "Payback:               {}", self.payback)?;
        writeln!(f, "ROI (10y):             {:.1}%", self.roi_10y_percent)?;
        write!(
            f,
            "Viable:                {}",
            if self.is_viable { "yes" } else { "no" }
        )
    }
}

/// Sizes a battery with the default [`DimensioningParams`].
///
/// # Errors
///
/// See [`dimension_with`].
pub fn dimension(
    stats: &BTreeMap<TariffPeriod, PeriodStats>,
    schedule: &TariffSchedule,
    reduction_percent: f64,
    investment_cost: f64,
) -> Result<DimensioningResult> {
    dimension_with(
        stats,
        schedule,
        reduction_percent,
        investment_cost,
        &DimensioningParams::default(),
    )
}

/// Sizes a battery for the peak period of `stats`.
///
/// # Errors
///
/// * [`Error::InvalidParameter`] if `reduction_percent` is outside `(0, 100]`,
///   `investment_cost` is not positive, or `params` fails validation
/// * [`Error::NoPeakSamples`] if the peak period has no samples
pub fn dimension_with(
    stats: &BTreeMap<TariffPeriod, PeriodStats>,
    schedule: &TariffSchedule,
    reduction_percent: f64,
    investment_cost: f64,
    params: &DimensioningParams,
) -> Result<DimensioningResult> {
    if !(reduction_percent > 0.0 && reduction_percent <= 100.0) {
        return Err(Error::parameter(
            "reduction_percent",
            format!("must be in (0, 100], got {reduction_percent}"),
        ));
    }
    if !(investment_cost.is_finite() && investment_cost > 0.0) {
        return Err(Error::parameter(
            "investment_cost",
            format!("must be > 0, got {investment_cost}"),
        ));
    }
    params.validate()?;

    let peak = stats
        .get(&TariffPeriod::Peak)
        .filter(|s| s.sample_count > 0 && s.max_kw > 0.0)
        .ok_or(Error::NoPeakSamples)?;

    let power_kw = peak.max_kw * reduction_percent / 100.0;
    let capacity_kwh = power_kw * params.discharge_hours * params.safety_margin;

    let demand_savings_annual = power_kw * schedule.demand_charge_per_kw * 12.0;
    let energy_discharged_annual_kwh =
        power_kw * params.discharge_hours * params.working_days_per_year;
    let energy_savings_annual = energy_discharged_annual_kwh
        * (schedule.peak_price_per_kwh - schedule.off_peak_price_per_kwh);
    let annual_savings_estimate = demand_savings_annual + energy_savings_annual;

    let payback = Payback::from_savings(investment_cost, annual_savings_estimate);
    let roi_10y_percent = roi_percent(
        investment_cost,
        annual_savings_estimate,
        params.analysis_years,
    );
    let is_viable = payback.within(params.payback_threshold_years);

    tracing::debug!(
        peak_kw = peak.max_kw,
        power_kw,
        capacity_kwh,
        annual_savings_estimate,
        %payback,
        "dimensioned BESS"
    );

    Ok(DimensioningResult {
        bess_spec: BessSpec::new(power_kw, capacity_kwh),
        peak_demand_kw: peak.max_kw,
        demand_reduction_kw: power_kw,
        cost_per_kwh: investment_cost / capacity_kwh,
        cost_per_kw: investment_cost / power_kw,
        demand_savings_annual,
        energy_savings_annual,
        energy_discharged_annual_kwh,
        annual_savings_estimate,
        payback,
        roi_10y_percent,
        is_viable,
    })
}
