//! REST API over the sizing and simulation engine.
//!
//! Routes:
//! - `POST /classify` splits a load curve by tariff period
//! - `POST /dimension` returns a quick sizing estimate
//! - `POST /simulate` runs a simulation and stores the analysis
//! - `POST /generate` synthesizes a load curve
//! - `GET /analyses` and `GET /analyses/{id}` read stored analyses

mod error;
mod handlers;
mod types;

pub use error::{ApiError, ErrorResponse};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::config::ScenarioConfig;
use crate::store::AnalysisStore;

/// State shared across all request handlers.
///
/// The configuration supplies defaults for anything a request leaves out.
/// The store is injected so tests and deployments can pick their own.
pub struct AppState {
    pub config: ScenarioConfig,
    pub store: Arc<dyn AnalysisStore>,
}

impl AppState {
    pub fn new(config: ScenarioConfig, store: Arc<dyn AnalysisStore>) -> Self {
        Self { config, store }
    }
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/classify", post(handlers::post_classify))
        .route("/dimension", post(handlers::post_dimension))
        .route("/simulate", post(handlers::post_simulate))
        .route("/generate", post(handlers::post_generate))
        .route("/analyses", get(handlers::list_analyses))
        .route("/analyses/{id}", get(handlers::get_analysis))
        .with_state(state)
}

/// Binds to `addr` and serves the API until Ctrl+C or SIGTERM.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(crate::telemetry::shutdown_signal())
        .await
}
