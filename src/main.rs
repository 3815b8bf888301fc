//! BESS peak-shaving simulator entry point.

use std::io;
use std::path::Path;

use anyhow::{Context, bail};
use clap::Parser;

use bess_sim::cli::{Args, Command, DimensionArgs, GenerateArgs, InputArgs, SimulateArgs, SweepArgs};
use bess_sim::config::ScenarioConfig;
use bess_sim::curve::LoadCurve;
use bess_sim::curve::analysis::CurveProfile;
use bess_sim::curve::ingest::read_csv_file;
use bess_sim::generator::{CompanyStage, generate};
use bess_sim::io::export::{export_to_path, write_curve_csv, write_daily_csv, write_steps_csv};
use bess_sim::sim::sweep::{SweepTable, candidates_from_reductions, evaluate_sizes};
use bess_sim::sim::types::BessSpec;
use bess_sim::sim::{simulate, sizing_divergence_percent};
use bess_sim::sizing::{DimensioningResult, dimension_with};
use bess_sim::tariff::TariffPeriod;
use bess_sim::tariff::classifier::{PeriodTable, classify};
use bess_sim::telemetry;

fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();
    let args = Args::parse();

    let scenario = args.scenario_config()?;
    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        bail!("invalid scenario ({} errors)", errors.len());
    }

    match args.command {
        Command::Classify(input) => run_classify(&scenario, &input),
        Command::Dimension(sizing) => {
            let curve = load(&sizing.input)?;
            println!("{}", estimate(&scenario, &curve, &sizing)?);
            Ok(())
        }
        Command::Simulate(sim) => run_simulate(&scenario, &sim),
        Command::Sweep(sweep) => run_sweep(&scenario, &sweep),
        Command::Generate(generate) => run_generate(&scenario, &generate),
        #[cfg(feature = "api")]
        Command::Serve(serve) => run_serve(scenario, &serve),
    }
}

fn load(input: &InputArgs) -> anyhow::Result<LoadCurve> {
    read_csv_file(&input.input).with_context(|| format!("failed to read {}", input.input.display()))
}

fn run_classify(scenario: &ScenarioConfig, input: &InputArgs) -> anyhow::Result<()> {
    let curve = load(input)?;
    let stats = classify(&curve, &scenario.tariff)?;
    println!("{}", PeriodTable(&stats));
    println!("{}", CurveProfile::from_curve(&curve));
    Ok(())
}

fn estimate(
    scenario: &ScenarioConfig,
    curve: &LoadCurve,
    args: &DimensionArgs,
) -> anyhow::Result<DimensioningResult> {
    let stats = classify(curve, &scenario.tariff)?;
    let result = dimension_with(
        &stats,
        &scenario.tariff,
        args.reduction_percent.unwrap_or(scenario.sizing.reduction_percent),
        args.investment_cost.unwrap_or(scenario.sizing.investment_cost),
        &scenario.sizing.params(),
    )?;
    Ok(result)
}

fn run_simulate(scenario: &ScenarioConfig, args: &SimulateArgs) -> anyhow::Result<()> {
    let curve = load(&args.sizing.input)?;

    let mut battery = scenario.battery.clone();
    battery.power_kw = args.power_kw.or(battery.power_kw);
    battery.capacity_kwh = args.capacity_kwh.or(battery.capacity_kwh);

    let sized = if battery.is_explicit() {
        None
    } else {
        let result = estimate(scenario, &curve, &args.sizing)?;
        println!("{result}\n");
        Some(result)
    };
    let spec = battery
        .spec(sized.as_ref().map(|r| &r.bess_spec))
        .context("battery power and capacity are unresolved")?;

    let mut options = scenario.simulation_options();
    if let Some(cost) = args.sizing.investment_cost {
        options.investment_cost = Some(cost);
    }
    if let Some(path) = &args.solar_csv {
        let surplus = read_csv_file(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        options.solar_surplus_kw = Some(surplus.samples().iter().map(|s| s.power_kw).collect());
    }

    let strategy = args.strategy.unwrap_or(scenario.simulation.strategy);
    let run = simulate(&curve, &spec, strategy, &scenario.tariff, &options)?;

    for day in &run.daily {
        println!("{day}");
    }
    println!("\n{}", run.summary);
    if let Some(divergence) = sized
        .as_ref()
        .and_then(|estimate| sizing_divergence_percent(estimate, &run.summary))
    {
        println!("Estimate divergence:   {divergence:+.1}%");
    }

    if let Some(path) = &args.daily_out {
        export(path, |w| write_daily_csv(&run.daily, w))?;
    }
    if let Some(path) = &args.steps_out {
        export(path, |w| write_steps_csv(&run.steps, w))?;
    }
    Ok(())
}

fn run_sweep(scenario: &ScenarioConfig, args: &SweepArgs) -> anyhow::Result<()> {
    let curve = load(&args.input)?;
    let stats = classify(&curve, &scenario.tariff)?;
    let peak = &stats[&TariffPeriod::Peak];
    let peak_kw = if peak.sample_count > 0 {
        peak.max_kw
    } else {
        curve.max_kw()
    };

    let reductions = if args.reductions.is_empty() {
        &scenario.simulation.sweep_reductions
    } else {
        &args.reductions
    };
    let params = scenario.sizing.params();
    let b = &scenario.battery;
    let candidates: Vec<BessSpec> = candidates_from_reductions(
        peak_kw,
        reductions,
        params.discharge_hours * params.safety_margin,
    )
    .into_iter()
    .map(|c| BessSpec {
        round_trip_efficiency: b.round_trip_efficiency,
        min_soc_percent: b.min_soc_percent,
        max_soc_percent: b.max_soc_percent,
        ..c
    })
    .collect();

    let strategy = args.strategy.unwrap_or(scenario.simulation.strategy);
    let points = evaluate_sizes(
        &curve,
        &candidates,
        strategy,
        &scenario.tariff,
        &scenario.simulation_options(),
    )?;
    println!("{}", SweepTable(&points));
    Ok(())
}

fn run_generate(scenario: &ScenarioConfig, args: &GenerateArgs) -> anyhow::Result<()> {
    let mut params = scenario.generator_params()?;
    if let Some(stage) = args.stage {
        params.stage = CompanyStage::try_from(stage)?;
    }
    if let Some(severity) = args.severity {
        params.severity = severity;
    }
    if let Some(days) = args.days {
        params.days = days;
    }
    if let Some(seed) = args.seed {
        params.seed = seed;
    }
    if let Some(start) = args.start_date {
        params.start_date = start;
    }

    let case = generate(&params)?;
    match &args.out {
        Some(path) => {
            export(path, |w| write_curve_csv(&case.curve, w))?;
            println!("{case}");
        }
        None => {
            eprintln!("{case}");
            write_curve_csv(&case.curve, io::stdout().lock())?;
        }
    }
    Ok(())
}

#[cfg(feature = "api")]
fn run_serve(scenario: ScenarioConfig, args: &bess_sim::cli::ServeArgs) -> anyhow::Result<()> {
    use std::sync::Arc;

    use bess_sim::api::{AppState, serve};
    use bess_sim::store::InMemoryStore;

    let store = InMemoryStore::with_max_records(args.max_analyses);
    let state = Arc::new(AppState::new(scenario, Arc::new(store)));
    let rt = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
    rt.block_on(serve(state, args.addr))
        .with_context(|| format!("API server on {} failed", args.addr))
}

fn export<F>(path: &Path, write: F) -> anyhow::Result<()>
where
    F: FnOnce(io::BufWriter<std::fs::File>) -> io::Result<()>,
{
    export_to_path(path, write).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote CSV");
    Ok(())
}
