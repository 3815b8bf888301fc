//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};

use super::AppState;
use super::error::ApiError;
use super::types::{
    AnalysisRecordResponse, ClassifyRequest, ClassifyResponse, DailyRecord, DimensionRequest,
    DimensionResponse, GenerateRequest, GenerateResponse, PeriodStatsRecord, ProfileRecord,
    SimulateRequest, SimulateResponse, SummaryRecord,
};
use crate::curve::analysis::CurveProfile;
use crate::generator::{CompanyStage, GeneratorParams, generate};
use crate::sim::simulate;
use crate::sim::types::BessSpec;
use crate::sizing::dimension_with;
use crate::store::AnalysisId;
use crate::tariff::TariffSchedule;
use crate::tariff::classifier::classify;

/// Splits a curve's energy and demand by tariff period.
///
/// `POST /classify` → 200 + `ClassifyResponse` JSON
pub async fn post_classify(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, ApiError> {
    let curve = req.load_curve.to_curve()?;
    let schedule = req.tariff.unwrap_or_else(|| state.config.tariff.clone());
    let stats = classify(&curve, &schedule)?;
    let profile = CurveProfile::from_curve(&curve);

    Ok(Json(ClassifyResponse {
        periods: stats
            .iter()
            .map(|(period, s)| (*period, PeriodStatsRecord::from(s)))
            .collect(),
        profile: ProfileRecord::from(&profile),
    }))
}

/// Quick sizing estimate from the peak-period statistics.
///
/// `POST /dimension` → 200 + `DimensionResponse` JSON
pub async fn post_dimension(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DimensionRequest>,
) -> Result<Json<DimensionResponse>, ApiError> {
    let curve = req.load_curve.to_curve()?;
    let schedule = TariffSchedule::peak_only(
        req.peak_window.unwrap_or(state.config.tariff.peak),
        req.peak_price,
        req.off_peak_price,
        req.demand_charge,
    );
    let stats = classify(&curve, &schedule)?;
    let result = dimension_with(
        &stats,
        &schedule,
        req.reduction_percent,
        req.investment_cost,
        &state.config.sizing.params(),
    )?;
    Ok(Json(DimensionResponse::from(&result)))
}

/// Runs a full simulation and stores its summary.
///
/// `POST /simulate` → 200 + `SimulateResponse` JSON
pub async fn post_simulate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SimulateRequest>,
) -> Result<Json<SimulateResponse>, ApiError> {
    let curve = req.load_curve.to_curve()?;

    let battery = &state.config.battery;
    let spec = BessSpec {
        power_kw: req.power_kw,
        capacity_kwh: req.capacity_kwh,
        round_trip_efficiency: battery.round_trip_efficiency,
        min_soc_percent: battery.min_soc_percent,
        max_soc_percent: battery.max_soc_percent,
    };

    let mut schedule = state.config.tariff.clone();
    schedule.peak_price_per_kwh = req.peak_price;
    schedule.intermediate_price_per_kwh = req.intermediate_price.unwrap_or(req.off_peak_price);
    schedule.off_peak_price_per_kwh = req.off_peak_price;
    schedule.demand_charge_per_kw = req.demand_charge;

    let mut options = state.config.simulation_options();
    options.investment_cost = req.investment_cost.or(options.investment_cost);
    options.solar_surplus_kw = req.solar_surplus_kw;
    if let Some(soc) = req.initial_soc_percent {
        options.initial_soc_percent = soc;
    }

    let strategy = req.strategy;
    let run = tokio::task::spawn_blocking(move || {
        simulate(&curve, &spec, strategy, &schedule, &options)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    let analysis_id = state.store.insert(run.spec, run.strategy, run.summary.clone());

    Ok(Json(SimulateResponse {
        analysis_id,
        daily_results: run.daily.iter().map(DailyRecord::from).collect(),
        summary: SummaryRecord::from(&run.summary),
    }))
}

/// Synthesizes an hourly curve for a company profile.
///
/// `POST /generate` → 200 + `GenerateResponse` JSON
pub async fn post_generate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let seed = req.seed.unwrap_or_else(rand::random);
    let params = GeneratorParams {
        stage: CompanyStage::try_from(req.stage)?,
        severity: req.severity,
        days: req.days,
        start_date: req.start_date.unwrap_or(state.config.generator.start_date),
        seed,
    };
    let case = generate(&params)?;
    Ok(Json(GenerateResponse::new(&case, seed)))
}

/// `GET /analyses` → 200 + stored analyses, oldest first
pub async fn list_analyses(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<AnalysisRecordResponse>> {
    Json(
        state
            .store
            .list()
            .iter()
            .map(AnalysisRecordResponse::from)
            .collect(),
    )
}

/// `GET /analyses/{id}` → 200, or 404 for an unknown id
pub async fn get_analysis(
    State(state): State<Arc<AppState>>,
    Path(id): Path<AnalysisId>,
) -> Result<Json<AnalysisRecordResponse>, ApiError> {
    state
        .store
        .get(id)
        .map(|r| Json(AnalysisRecordResponse::from(&r)))
        .ok_or(ApiError::AnalysisNotFound(id))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::util::ServiceExt;

    use super::*;
    use crate::api::router;
    use crate::config::ScenarioConfig;
    use crate::store::InMemoryStore;

    fn make_test_state() -> Arc<AppState> {
        Arc::new(AppState::new(
            ScenarioConfig::reference(),
            Arc::new(InMemoryStore::new()),
        ))
    }

    /// Two days of hourly data: 100 kW base, 300 kW from 18:00 to 21:00.
    fn load_curve_json() -> Value {
        let mut timestamps = Vec::new();
        let mut powers = Vec::new();
        for day in 1..=2 {
            for h in 0..24 {
                timestamps.push(format!("{day:02}/01/2024 {h:02}:00:00"));
                powers.push(if (18..21).contains(&h) { 300.0 } else { 100.0 });
            }
        }
        json!({ "timestamps": timestamps, "powers_kw": powers })
    }

    async fn post(app: axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn classify_returns_period_stats() {
        let app = router(make_test_state());
        let (status, json) = post(app, "/classify", json!({ "load_curve": load_curve_json() })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["periods"]["peak"]["sample_count"], 6);
        assert_eq!(json["periods"]["peak"]["max_kw"], 300.0);
        assert_eq!(json["profile"]["max_kw"], 300.0);
    }

    #[tokio::test]
    async fn mismatched_arrays_are_rejected() {
        let app = router(make_test_state());
        let body = json!({
            "load_curve": { "timestamps": ["01/01/2024 00:00:00"], "powers_kw": [1.0, 2.0] }
        });
        let (status, json) = post(app, "/classify", body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "MismatchedArrayLength");
    }

    #[tokio::test]
    async fn dimension_sizes_from_peak() {
        let app = router(make_test_state());
        let body = json!({
            "load_curve": load_curve_json(),
            "peak_price": 1.71,
            "off_peak_price": 0.72,
            "demand_charge": 50.0,
            "reduction_percent": 20.0,
            "investment_cost": 500000.0,
        });
        let (status, json) = post(app, "/dimension", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["power_kw"], 60.0);
        assert_eq!(json["capacity_kwh"], 288.0);
    }

    #[tokio::test]
    async fn simulate_stores_analysis() {
        let state = make_test_state();
        let body = json!({
            "load_curve": load_curve_json(),
            "capacity_kwh": 400.0,
            "power_kw": 100.0,
            "strategy": "grid-offpeak",
            "peak_price": 1.71,
            "off_peak_price": 0.72,
            "demand_charge": 50.0,
        });
        let (status, json) = post(router(state.clone()), "/simulate", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["daily_results"].as_array().unwrap().len(), 2);
        assert_eq!(json["summary"]["days_simulated"], 2);
        let id = json["analysis_id"].as_u64().unwrap();

        let (status, stored) = get(router(state.clone()), &format!("/analyses/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stored["strategy"], "grid-offpeak");

        let (_, list) = get(router(state), "/analyses").await;
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn simulate_falls_back_to_configured_investment() {
        let mut body = json!({
            "load_curve": load_curve_json(),
            "capacity_kwh": 400.0,
            "power_kw": 100.0,
            "strategy": "grid-offpeak",
            "peak_price": 1.71,
            "off_peak_price": 0.72,
            "demand_charge": 50.0,
        });
        let (status, omitted) = post(router(make_test_state()), "/simulate", body.clone()).await;
        assert_eq!(status, StatusCode::OK);

        // reference scenario invests 500 000
        body["investment_cost"] = json!(500000.0);
        let (_, explicit) = post(router(make_test_state()), "/simulate", body).await;

        assert!(omitted["summary"]["payback_years"].as_f64().is_some());
        assert!(omitted["summary"]["is_viable"].is_boolean());
        assert_eq!(omitted["summary"], explicit["summary"]);
    }

    #[tokio::test]
    async fn simulate_rejects_short_curve() {
        let app = router(make_test_state());
        let body = json!({
            "load_curve": {
                "timestamps": ["01/01/2024 00:00:00", "01/01/2024 01:00:00"],
                "powers_kw": [10.0, 10.0],
            },
            "capacity_kwh": 400.0,
            "power_kw": 100.0,
            "strategy": "solar",
            "peak_price": 1.71,
            "off_peak_price": 0.72,
            "demand_charge": 50.0,
        });
        let (status, json) = post(app, "/simulate", body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "InsufficientData");
    }

    #[tokio::test]
    async fn generate_is_reproducible_with_seed() {
        let body = json!({ "stage": 2, "severity": "grave", "days": 3, "seed": 9 });
        let (status, a) = post(router(make_test_state()), "/generate", body.clone()).await;
        let (_, b) = post(router(make_test_state()), "/generate", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(a["total_points"], 72);
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn generate_rejects_unknown_stage() {
        let body = json!({ "stage": 9, "severity": "leve", "days": 3 });
        let (status, json) = post(router(make_test_state()), "/generate", body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "InvalidParameter");
    }

    #[tokio::test]
    async fn unknown_analysis_returns_404() {
        let (status, json) = get(router(make_test_state()), "/analyses/42").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "NotFound");
    }
}
