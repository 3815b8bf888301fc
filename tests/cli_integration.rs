//! Runs the binary against generated curves and the bundled scenarios.

mod common;

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use bess_sim::config::ScenarioConfig;

fn scenario(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join(name)
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bess-sim"))
        .args(args)
        .env_remove("BESS_SCENARIO")
        .env("RUST_LOG", "warn")
        .output()
        .expect("bess-sim should run")
}

fn stdout_of(args: &[&str]) -> String {
    let output = run(args);
    assert!(
        output.status.success(),
        "bess-sim {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn bundled_scenarios_are_valid() {
    for name in ["reference.toml", "tarifa_branca.toml", "solar_fixed_battery.toml"] {
        let cfg = ScenarioConfig::from_toml_file(&scenario(name))
            .unwrap_or_else(|e| panic!("{name}: {e}"));
        let errors = cfg.validate();
        assert!(errors.is_empty(), "{name}: {errors:?}");
    }
}

#[test]
fn generate_is_reproducible() {
    let a = common::temp_path("gen-a.csv");
    let b = common::temp_path("gen-b.csv");
    for path in [&a, &b] {
        let out = stdout_of(&[
            "generate",
            "--stage",
            "4",
            "--severity",
            "grave",
            "--days",
            "3",
            "--seed",
            "11",
            "--out",
            path.to_str().unwrap(),
        ]);
        assert!(out.contains("--- Generated Load Curve ---"));
    }

    let first = std::fs::read_to_string(&a).unwrap();
    let second = std::fs::read_to_string(&b).unwrap();
    assert_eq!(first, second);
    // header + 3 days of hourly samples
    assert_eq!(first.lines().count(), 73);
    assert!(first.starts_with("Time stamp,[kW] Active Power Total"));
}

#[test]
fn generate_without_out_writes_csv_to_stdout() {
    let out = stdout_of(&["generate", "--days", "1", "--seed", "3"]);
    assert_eq!(out.lines().count(), 25);
}

#[test]
fn classify_prints_periods_and_profile() {
    let input = common::write_temp_curve("classify.csv", &common::industrial_curve(2));
    let out = stdout_of(&["classify", input.to_str().unwrap()]);
    assert!(out.contains("--- Tariff Periods ---"));
    assert!(out.contains("--- Load Profile ---"));
}

#[test]
fn simulate_sizes_then_exports_daily_results() {
    let input = common::write_temp_curve("simulate.csv", &common::industrial_curve(7));
    let daily = common::temp_path("daily.csv");
    let steps = common::temp_path("steps.csv");
    let out = stdout_of(&[
        "--scenario",
        scenario("reference.toml").to_str().unwrap(),
        "simulate",
        input.to_str().unwrap(),
        "--daily-out",
        daily.to_str().unwrap(),
        "--steps-out",
        steps.to_str().unwrap(),
    ]);

    assert!(out.contains("--- Sizing Estimate ---"));
    assert!(out.contains("--- Simulation Summary ---"));
    assert!(out.contains("Estimate divergence:"));
    assert_eq!(std::fs::read_to_string(&daily).unwrap().lines().count(), 8);
    assert_eq!(std::fs::read_to_string(&steps).unwrap().lines().count(), 169);
}

#[test]
fn fixed_battery_skips_sizing() {
    let input = common::write_temp_curve("fixed.csv", &common::industrial_curve(3));
    let out = stdout_of(&[
        "simulate",
        input.to_str().unwrap(),
        "--scenario",
        scenario("solar_fixed_battery.toml").to_str().unwrap(),
    ]);
    assert!(!out.contains("--- Sizing Estimate ---"));
    assert!(out.contains("--- Simulation Summary ---"));
}

#[test]
fn sweep_prints_a_row_per_reduction() {
    let input = common::write_temp_curve("sweep.csv", &common::industrial_curve(5));
    let out = stdout_of(&[
        "--scenario",
        scenario("tarifa_branca.toml").to_str().unwrap(),
        "sweep",
        input.to_str().unwrap(),
    ]);
    let header = out.lines().position(|l| l.contains("annual savings")).unwrap();
    assert_eq!(out.lines().skip(header + 1).filter(|l| !l.trim().is_empty()).count(), 3);
}

#[test]
fn unknown_preset_fails() {
    let output = run(&["--preset", "nope", "generate"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown preset"));
}

#[test]
fn too_short_curve_is_rejected() {
    let curve = bess_sim::curve::LoadCurve::hourly(common::monday(), &[100.0; 12]).unwrap();
    let input = common::write_temp_curve("short.csv", &curve);
    let output = run(&["simulate", input.to_str().unwrap(), "--power-kw", "10", "--capacity-kwh", "40"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("insufficient data"));
}
