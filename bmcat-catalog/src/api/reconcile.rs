//! Reconciliation trigger and status
//!
//! The run itself happens in a background task; the trigger answers 202 as
//! soon as the run lock is held.

use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::auth::AdminCaller;
use crate::error::ApiResult;
use crate::models::RunReport;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RunStartedResponse {
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ReconcileStatusResponse {
    pub running: bool,
    pub last_report: Option<RunReport>,
}

/// POST /reconcile/run
///
/// 409 if a run is already in flight.
pub async fn start_run(
    State(state): State<AppState>,
    _admin: AdminCaller,
) -> ApiResult<(StatusCode, Json<RunStartedResponse>)> {
    let guard = state.reconciler.try_acquire()?;
    let started_at = Utc::now();

    let reconciler = state.reconciler.clone();
    tokio::spawn(async move {
        if let Err(e) = reconciler.run_locked(guard).await {
            tracing::error!(error = %e, "Reconciliation run failed");
        }
    });

    tracing::info!(started_at = %started_at, "Reconciliation triggered");
    Ok((StatusCode::ACCEPTED, Json(RunStartedResponse { started_at })))
}

/// GET /reconcile/status
pub async fn run_status(
    State(state): State<AppState>,
    _admin: AdminCaller,
) -> ApiResult<Json<ReconcileStatusResponse>> {
    let last_report = state.reconciler.last_report().await?;

    Ok(Json(ReconcileStatusResponse {
        running: state.reconciler.is_running(),
        last_report,
    }))
}

pub fn reconcile_routes() -> Router<AppState> {
    Router::new()
        .route("/reconcile/run", post(start_run))
        .route("/reconcile/status", get(run_status))
}
