//! Snapshot export/import

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use super::auth::AdminCaller;
use crate::error::{ApiError, ApiResult};
use crate::models::CatalogSnapshot;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub pending: usize,
    pub active: usize,
    pub archived: usize,
}

/// GET /admin/export
pub async fn export_catalog(
    State(state): State<AppState>,
    _admin: AdminCaller,
) -> ApiResult<impl IntoResponse> {
    let snapshot = state.lifecycle.store().export_snapshot().await?;

    Ok((
        [(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"bmcat-export.json\"",
        )],
        Json(snapshot),
    ))
}

/// POST /admin/import
///
/// Replaces the whole catalog. The body must carry all three arrays.
pub async fn import_catalog(
    State(state): State<AppState>,
    _admin: AdminCaller,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<ImportResponse>)> {
    let snapshot: CatalogSnapshot = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid snapshot document: {}", e)))?;

    state.lifecycle.store().import_snapshot(&snapshot).await?;

    Ok((
        StatusCode::OK,
        Json(ImportResponse {
            pending: snapshot.pending.len(),
            active: snapshot.active.len(),
            archived: snapshot.archived.len(),
        }),
    ))
}

pub fn snapshot_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/export", get(export_catalog))
        .route("/admin/import", post(import_catalog))
}
