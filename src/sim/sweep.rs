//! Evaluate several battery sizes against the same curve in parallel.

use std::fmt;
use std::thread;

use serde::Serialize;

use crate::curve::LoadCurve;
use crate::error::Result;
use crate::tariff::TariffSchedule;

use super::engine::simulate;
use super::summary::SimulationSummary;
use super::types::{BessSpec, ChargingStrategy, SimulationOptions};

/// Outcome of one candidate size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepPoint {
    pub spec: BessSpec,
    pub summary: SimulationSummary,
}

/// Text table of sweep results, one row per candidate.
pub struct SweepTable<'a>(pub &'a [SweepPoint]);

impl fmt::Display for SweepTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Sizing Sweep ---")?;
        writeln!(
            f,
            "{:>10}{:>12}{:>16}{:>16}{:>12}{:>8}",
            "kW", "kWh", "reduction kW", "annual savings", "payback", "viable"
        )?;
        for p in self.0 {
            writeln!(
                f,
                "{:>10.1}{:>12.1}{:>16.1}{:>16.2}{:>12}{:>8}",
                p.spec.power_kw,
                p.spec.capacity_kwh,
                p.summary.average_demand_reduction_kw,
                p.summary.total_annual_savings,
                p.summary.payback.to_string(),
                p.summary.verdict()
            )?;
        }
        Ok(())
    }
}

/// Simulates each candidate on its own scoped thread.
///
/// Results come back in the order of `candidates`. Runs share only
/// immutable borrows of the inputs.
///
/// # Errors
///
/// Returns the first error in candidate order.
pub fn evaluate_sizes(
    curve: &LoadCurve,
    candidates: &[BessSpec],
    strategy: ChargingStrategy,
    schedule: &TariffSchedule,
    options: &SimulationOptions,
) -> Result<Vec<SweepPoint>> {
    tracing::info!(candidates = candidates.len(), %strategy, "starting sizing sweep");

    thread::scope(|scope| {
        let handles: Vec<_> = candidates
            .iter()
            .map(|spec| {
                scope.spawn(move || {
                    simulate(curve, spec, strategy, schedule, options).map(|run| SweepPoint {
                        spec: run.spec,
                        summary: run.summary,
                    })
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    })
}

/// Candidate specs at `reduction_percents` of `peak_kw`, sized with
/// `capacity_hours` of storage per kW.
pub fn candidates_from_reductions(
    peak_kw: f64,
    reduction_percents: &[f64],
    capacity_hours: f64,
) -> Vec<BessSpec> {
    reduction_percents
        .iter()
        .map(|pct| {
            let power_kw = peak_kw * pct / 100.0;
            BessSpec::new(power_kw, power_kw * capacity_hours)
        })
        .collect()
}
