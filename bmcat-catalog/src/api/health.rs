//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::db::CatalogCounts;
use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok", or "degraded" when the store cannot be read
    pub status: String,
    pub module: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub reconcile_running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<CatalogCounts>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let counts = match state.lifecycle.store().counts().await {
        Ok(counts) => Some(counts),
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not read catalog counts");
            None
        }
    };

    Json(HealthResponse {
        status: if counts.is_some() { "ok" } else { "degraded" }.to_string(),
        module: "bmcat-catalog".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        reconcile_running: state.reconciler.is_running(),
        counts,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
