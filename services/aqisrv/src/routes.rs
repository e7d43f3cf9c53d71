//! HTTP routes
//!
//! `GET|POST /api/cron/aqi` runs one job; the scheduler authenticates with
//! `authorization: Bearer <cron_secret>`.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap},
    response::Json,
    routing::get,
    Router,
};
use chrono::Utc;
use common::{HealthStatus, SuccessResponse};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::app::AppState;
use crate::config::SERVICE_NAME;
use crate::error::{AqiSrvError, Result};
use crate::job::{run_configured, JobOutcome};

/// Create all API routes with state
pub fn create_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/cron/aqi", get(run_aqi_job).post(run_aqi_job))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus::healthy(SERVICE_NAME, env!("CARGO_PKG_VERSION")))
}

/// Run one AQI job for the scheduler
async fn run_aqi_job(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse<JobOutcome>>> {
    authorize(state.config.cron_secret(), &headers)?;
    info!("Cron trigger accepted");

    let outcome = run_configured(&state.config, &state.http, false, Utc::now())
        .await
        .inspect_err(|e| warn!("AQI job failed: {}", e))?;

    Ok(Json(SuccessResponse::new(outcome)))
}

/// Check the trigger header against the configured secret.
///
/// With no secret configured every trigger is rejected.
fn authorize(secret: Option<&str>, headers: &HeaderMap) -> Result<()> {
    let provided = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());

    match (secret, provided) {
        (Some(secret), Some(provided)) if provided == format!("Bearer {}", secret) => Ok(()),
        (None, _) => {
            warn!("Rejected trigger: no cron secret configured");
            Err(AqiSrvError::Unauthorized)
        },
        _ => {
            warn!("Rejected trigger: authorization header missing or wrong");
            Err(AqiSrvError::Unauthorized)
        },
    }
}
