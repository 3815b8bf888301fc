//! Day-by-day BESS simulation over a metered load curve.

use chrono::{NaiveDate, Timelike};

use crate::curve::{LoadCurve, PowerSample};
use crate::error::{Error, Result};
use crate::tariff::{TariffPeriod, TariffSchedule};

use super::battery::SimulationState;
use super::controller::{Controller, GridOffPeakController, SolarController, StepContext};
use super::solar::assumed_surplus_kw;
use super::summary::{SummaryParams, summarize};
use super::types::{
    BatteryMode, BessSpec, ChargingStrategy, DailyResult, SimulationOptions, SimulationRun,
    StepResult,
};

/// A run needs at least one full day of hourly data.
pub const MIN_SAMPLES: usize = 24;

/// Simulation engine owning the run state and borrowing its inputs.
///
/// Generic over `C: Controller` for static dispatch.
pub struct Engine<'a, C: Controller> {
    curve: &'a LoadCurve,
    schedule: &'a TariffSchedule,
    options: &'a SimulationOptions,
    controller: C,
    state: SimulationState,
}

impl<'a, C: Controller> Engine<'a, C> {
    /// Creates an engine. Inputs must already be validated; use [`simulate`]
    /// for the checked entry point.
    pub fn new(
        curve: &'a LoadCurve,
        spec: BessSpec,
        schedule: &'a TariffSchedule,
        options: &'a SimulationOptions,
        controller: C,
    ) -> Self {
        Self {
            curve,
            schedule,
            options,
            controller,
            state: SimulationState::new(spec, options.initial_soc_percent),
        }
    }

    fn solar_surplus_kw(&self, index: usize, hour: u32) -> f64 {
        if self.controller.strategy() != ChargingStrategy::Solar {
            return 0.0;
        }
        match &self.options.solar_surplus_kw {
            Some(series) => series.get(index).copied().unwrap_or(0.0),
            None => assumed_surplus_kw(
                hour,
                self.options.solar_window,
                self.schedule.peak.start_hour,
                self.state.spec().power_kw,
            ),
        }
    }

    /// Executes one sample and returns its record.
    ///
    /// `index` is the sample's position in the whole curve.
    pub fn step(&mut self, index: usize, sample: &PowerSample) -> StepResult {
        let spec = *self.state.spec();
        let dt = self.curve.step_hours(index);
        let hour = sample.timestamp.hour();
        let period = self.schedule.period_at(&sample.timestamp);
        let price = self.schedule.price_for(period);
        let solar_surplus_kw = self.solar_surplus_kw(index, hour);

        let ctx = StepContext {
            hour,
            period,
            solar_surplus_kw,
        };

        let mut energy_charged_kwh = 0.0;
        let mut energy_discharged_kwh = 0.0;
        let mut net_kw = sample.power_kw;

        match self.controller.mode(&ctx) {
            BatteryMode::Charging => {
                let available_kwh = match self.controller.strategy() {
                    ChargingStrategy::GridOffPeak => spec.power_kw * dt,
                    ChargingStrategy::Solar => solar_surplus_kw.min(spec.power_kw) * dt,
                };
                energy_charged_kwh = self.state.charge(available_kwh);
            }
            BatteryMode::Discharging => {
                // Behind the meter: never push more than the facility draws.
                let requested_kwh = (spec.power_kw * dt).min(sample.power_kw * dt);
                energy_discharged_kwh = self.state.discharge(requested_kwh);
                net_kw = (sample.power_kw - energy_discharged_kwh / dt).max(0.0);
            }
            BatteryMode::Idle => {}
        }

        // Report what actually happened, not what was requested.
        let mode = if energy_charged_kwh > 0.0 {
            BatteryMode::Charging
        } else if energy_discharged_kwh > 0.0 {
            BatteryMode::Discharging
        } else {
            BatteryMode::Idle
        };

        StepResult {
            timestamp: sample.timestamp,
            period,
            mode,
            original_kw: sample.power_kw,
            net_kw,
            energy_charged_kwh,
            energy_discharged_kwh,
            price_per_kwh: price,
            soc_percent: self.state.state_of_charge_percent,
        }
    }

    /// Simulates one calendar day; SOC carries over to the next call.
    fn run_day(
        &mut self,
        date: NaiveDate,
        first_index: usize,
        samples: &[PowerSample],
        steps: &mut Vec<StepResult>,
    ) -> DailyResult {
        let starting_soc_percent = self.state.state_of_charge_percent;
        let grid_charging = self.controller.strategy() == ChargingStrategy::GridOffPeak;

        let mut peak_original = f64::NEG_INFINITY;
        let mut peak_with_bess = f64::NEG_INFINITY;
        let mut day_original = f64::NEG_INFINITY;
        let mut day_with_bess = f64::NEG_INFINITY;
        let mut energy_charged_kwh = 0.0;
        let mut energy_discharged_kwh = 0.0;
        let mut charging_cost = 0.0;
        let mut discharging_savings = 0.0;

        for (offset, sample) in samples.iter().enumerate() {
            let step = self.step(first_index + offset, sample);

            if step.period == TariffPeriod::Peak {
                peak_original = peak_original.max(step.original_kw);
                peak_with_bess = peak_with_bess.max(step.net_kw);
            }
            day_original = day_original.max(step.original_kw);
            day_with_bess = day_with_bess.max(step.net_kw);

            energy_charged_kwh += step.energy_charged_kwh;
            energy_discharged_kwh += step.energy_discharged_kwh;
            if grid_charging {
                charging_cost += step.energy_charged_kwh * step.price_per_kwh;
            }
            discharging_savings += step.energy_discharged_kwh * step.price_per_kwh;

            steps.push(step);
        }

        // Days without a peak window (weekends, holidays) are measured over
        // the whole day.
        let (peak_demand_original_kw, peak_demand_with_bess_kw) =
            if peak_original.is_finite() {
                (peak_original, peak_with_bess)
            } else {
                (day_original, day_with_bess)
            };

        let result = DailyResult {
            day_index: self.state.day_index,
            date,
            peak_demand_original_kw,
            peak_demand_with_bess_kw,
            demand_reduction_kw: (peak_demand_original_kw - peak_demand_with_bess_kw).max(0.0),
            energy_charged_kwh,
            energy_discharged_kwh,
            charging_cost,
            discharging_savings,
            net_savings: discharging_savings - charging_cost,
            starting_soc_percent,
            ending_soc_percent: self.state.state_of_charge_percent,
        };

        tracing::debug!(
            day = result.day_index,
            %date,
            reduction_kw = result.demand_reduction_kw,
            net_savings = result.net_savings,
            soc = result.ending_soc_percent,
            "simulated day"
        );

        self.state.day_index += 1;
        result
    }

    /// Executes every day of the curve.
    pub fn run(&mut self) -> (Vec<DailyResult>, Vec<StepResult>) {
        let curve = self.curve;
        let mut steps = Vec::with_capacity(curve.len());
        let mut daily = Vec::new();
        let mut index = 0;
        for (date, samples) in curve.days() {
            daily.push(self.run_day(date, index, samples, &mut steps));
            index += samples.len();
        }
        (daily, steps)
    }
}

/// Validates every input before any step runs.
fn validate_inputs(
    curve: &LoadCurve,
    spec: &BessSpec,
    schedule: &TariffSchedule,
    options: &SimulationOptions,
) -> Result<()> {
    spec.validate()?;
    schedule.validate()?;
    options.off_peak_charge_window.validate("off-peak charge")?;
    options.solar_window.validate("solar")?;

    if curve.len() < MIN_SAMPLES {
        return Err(Error::InsufficientData {
            samples: curve.len(),
            required: MIN_SAMPLES,
        });
    }
    let soc = options.initial_soc_percent;
    if !(spec.min_soc_percent..=spec.max_soc_percent).contains(&soc) {
        return Err(Error::parameter(
            "initial_soc_percent",
            format!(
                "must lie in [{}, {}], got {soc}",
                spec.min_soc_percent, spec.max_soc_percent
            ),
        ));
    }
    if let Some(series) = &options.solar_surplus_kw {
        if series.len() != curve.len() {
            return Err(Error::parameter(
                "solar_surplus_kw",
                format!("has {} values for {} samples", series.len(), curve.len()),
            ));
        }
        if series.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(Error::parameter(
                "solar_surplus_kw",
                "values must be finite and >= 0",
            ));
        }
    }
    if let Some(cost) = options.investment_cost {
        if !(cost.is_finite() && cost > 0.0) {
            return Err(Error::parameter(
                "investment_cost",
                format!("must be > 0, got {cost}"),
            ));
        }
    }
    Ok(())
}

/// Simulates `spec` over `curve` and summarizes the outcome.
///
/// # Errors
///
/// * [`Error::InvalidBessSpec`] for an invalid battery
/// * [`Error::InvalidSchedule`] for an invalid tariff or option window
/// * [`Error::InsufficientData`] for fewer than [`MIN_SAMPLES`] samples
/// * [`Error::InvalidParameter`] for an initial SOC outside the SOC window,
///   a solar series not aligned with the curve, or a non-positive investment
pub fn simulate(
    curve: &LoadCurve,
    spec: &BessSpec,
    strategy: ChargingStrategy,
    schedule: &TariffSchedule,
    options: &SimulationOptions,
) -> Result<SimulationRun> {
    validate_inputs(curve, spec, schedule, options)?;

    let (daily, steps) = match strategy {
        ChargingStrategy::GridOffPeak => {
            let controller = GridOffPeakController {
                charge_window: options.off_peak_charge_window,
            };
            Engine::new(curve, *spec, schedule, options, controller).run()
        }
        ChargingStrategy::Solar => {
            Engine::new(curve, *spec, schedule, options, SolarController).run()
        }
    };

    let summary = summarize(
        &daily,
        &SummaryParams {
            demand_charge_per_kw: schedule.demand_charge_per_kw,
            investment_cost: options.investment_cost,
            payback_threshold_years: options.payback_threshold_years,
        },
    );

    tracing::info!(
        %strategy,
        power_kw = spec.power_kw,
        capacity_kwh = spec.capacity_kwh,
        days = summary.days_simulated,
        total_annual_savings = summary.total_annual_savings,
        viable = summary.verdict(),
        "simulation complete"
    );

    Ok(SimulationRun {
        spec: *spec,
        strategy,
        daily,
        steps,
        summary,
    })
}
