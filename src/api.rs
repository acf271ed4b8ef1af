// src/api.rs
//! HTTP surface for the browser UI: `/health`, `POST /analyze`, `/metrics`,
//! and the training-simulation routes under `/simulations`.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::ai_bootstrap::AiRuntime;
use crate::analyze::report::FinalDiagnosis;
use crate::pipeline::Pipeline;
use crate::simulation::email::MAIL_NOT_CONFIGURED;
use crate::simulation::{self, Scenario, TrainingMailer, UNKNOWN_SCENARIO};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    pub metrics: Option<PrometheusHandle>,
    /// `None` when SMTP is not configured; sending then answers 503.
    pub mailer: Option<Arc<TrainingMailer>>,
}

impl AppState {
    /// Collaborator from config/env, metrics recorder installed.
    pub fn from_env() -> Self {
        let pipeline = AiRuntime::discover().pipeline();
        let metrics = match crate::metrics::install() {
            Ok(h) => Some(h),
            Err(e) => {
                warn!(error = ?e, "metrics disabled");
                None
            }
        };
        let mailer = match TrainingMailer::from_env() {
            Ok(m) => Some(Arc::new(m)),
            Err(e) => {
                info!(error = %e, "training emails disabled");
                None
            }
        };
        Self {
            pipeline,
            metrics,
            mailer,
        }
    }

    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            metrics: None,
            mailer: None,
        }
    }

    pub fn with_mailer(mut self, mailer: TrainingMailer) -> Self {
        self.mailer = Some(Arc::new(mailer));
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

pub fn router(state: AppState) -> Router {
    let metrics = state.metrics.clone();
    let app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/analyze", post(analyze))
        .route("/simulations", get(list_simulations))
        .route("/simulations/send", post(send_simulation))
        .route("/simulations/{id}", get(get_simulation))
        .layer(CorsLayer::very_permissive())
        .with_state(state);

    match metrics {
        Some(handle) => app.merge(crate::metrics::router(handle)),
        None => app,
    }
}

#[derive(Deserialize)]
struct AnalyzeReq {
    #[serde(default)]
    text: String,
}

/// Diagnosis plus the display lookups the UI renders.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResp {
    #[serde(flatten)]
    pub diagnosis: FinalDiagnosis,
    pub color: &'static str,
    pub label: &'static str,
    pub emoji: &'static str,
}

impl From<FinalDiagnosis> for AnalyzeResp {
    fn from(diagnosis: FinalDiagnosis) -> Self {
        let level = diagnosis.risk_level;
        Self {
            diagnosis,
            color: level.color(),
            label: level.label(),
            emoji: level.emoji(),
        }
    }
}

async fn analyze(State(state): State<AppState>, Json(body): Json<AnalyzeReq>) -> Json<AnalyzeResp> {
    let diagnosis = state.pipeline.analyze(&body.text).await;
    Json(diagnosis.into())
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    (status, Json(ErrorBody { error: msg.into() }))
}

async fn list_simulations() -> Json<&'static [Scenario]> {
    Json(simulation::scenarios())
}

/// Reveal page data for a trainee who followed the link.
async fn get_simulation(Path(id): Path<String>) -> Result<Json<&'static Scenario>, ApiError> {
    simulation::find(&id)
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, UNKNOWN_SCENARIO))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendReq {
    #[serde(default)]
    target_email: String,
    #[serde(default)]
    scenario_id: String,
}

#[derive(Serialize)]
struct SendResp {
    success: bool,
}

async fn send_simulation(
    State(state): State<AppState>,
    Json(req): Json<SendReq>,
) -> Result<Json<SendResp>, ApiError> {
    let scenario = simulation::find(&req.scenario_id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, UNKNOWN_SCENARIO))?;
    if req.target_email.trim().parse::<lettre::Address>().is_err() {
        return Err(api_error(StatusCode::BAD_REQUEST, "invalid targetEmail"));
    }
    let mailer = state
        .mailer
        .as_ref()
        .ok_or_else(|| api_error(StatusCode::SERVICE_UNAVAILABLE, MAIL_NOT_CONFIGURED))?;

    mailer
        .send(&req.target_email, scenario)
        .await
        .map_err(|e| {
            warn!(scenario = scenario.id, error = ?e, "training email failed");
            api_error(StatusCode::BAD_GATEWAY, format!("{e:#}"))
        })?;
    Ok(Json(SendResp { success: true }))
}
