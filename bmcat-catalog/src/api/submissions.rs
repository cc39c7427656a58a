//! Submission and moderation endpoints

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use super::auth::{AdminCaller, Caller};
use super::path_id;
use crate::error::{ApiError, ApiResult, CatalogError};
use crate::models::genres::{deserialize_genres, deserialize_optional_genres};
use crate::models::{CatalogEntry, ExternalId, ModerationStatus, PendingSubmission};
use crate::services::FetchOutcome;
use crate::AppState;

/// POST /submissions request
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub id: i64,
    #[serde(default, deserialize_with = "deserialize_genres")]
    pub genres: Vec<String>,
}

/// POST /submissions/:id/approve request
#[derive(Debug, Default, Deserialize)]
pub struct ApproveRequest {
    /// Overrides the submitter's suggested genres
    #[serde(default, deserialize_with = "deserialize_optional_genres")]
    pub genres: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<ModerationStatus>,
}

/// POST /submissions
pub async fn submit(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<SubmitRequest>,
) -> ApiResult<(StatusCode, Json<PendingSubmission>)> {
    let id = ExternalId::new(request.id).ok_or_else(|| {
        CatalogError::InvalidInput(format!("beatmap set id must be positive, got {}", request.id))
    })?;

    let submission = state.lifecycle.submit(id, &caller.user, request.genres).await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

/// GET /submissions
///
/// Moderation queue, oldest first. `?status=awaiting|denied` narrows it.
pub async fn list_submissions(
    State(state): State<AppState>,
    _admin: AdminCaller,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<PendingSubmission>>> {
    let submissions = state.lifecycle.store().list_pending(query.status).await?;
    Ok(Json(submissions))
}

/// POST /submissions/:id/approve
///
/// Looks the set up on osu! and lists it with the current metadata. The body
/// is optional; when present it must be a valid [`ApproveRequest`].
pub async fn approve(
    State(state): State<AppState>,
    _admin: AdminCaller,
    Path(raw_id): Path<i64>,
    body: Bytes,
) -> ApiResult<Json<CatalogEntry>> {
    let id = path_id(raw_id)?;
    let request = parse_approve_request(&body)?;

    // Reject before spending a provider call
    state.lifecycle.awaiting_submission(id).await?;

    let metadata = match state.provider.fetch(id).await {
        FetchOutcome::Resolved(metadata) => metadata,
        FetchOutcome::NotFound => {
            return Err(ApiError::NotFound(format!(
                "Beatmap set {} does not exist on osu!",
                id
            )))
        }
        FetchOutcome::Transient(reason) => {
            return Err(ApiError::BadGateway(format!(
                "osu! lookup for beatmap set {} failed: {}",
                id, reason
            )))
        }
    };

    let entry = state.lifecycle.approve(id, metadata, request.genres).await?;
    Ok(Json(entry))
}

fn parse_approve_request(body: &[u8]) -> ApiResult<ApproveRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ApproveRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid approve request: {}", e)))
}

/// POST /submissions/:id/deny
pub async fn deny(
    State(state): State<AppState>,
    _admin: AdminCaller,
    Path(raw_id): Path<i64>,
) -> ApiResult<StatusCode> {
    let id = path_id(raw_id)?;
    state.lifecycle.deny(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn submission_routes() -> Router<AppState> {
    Router::new()
        .route("/submissions", post(submit).get(list_submissions))
        .route("/submissions/:id/approve", post(approve))
        .route("/submissions/:id/deny", post(deny))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_approve_body_keeps_suggested_genres() {
        assert!(parse_approve_request(b"").unwrap().genres.is_none());
        assert!(parse_approve_request(b"  \n").unwrap().genres.is_none());
        assert!(parse_approve_request(b"{}").unwrap().genres.is_none());
    }

    #[test]
    fn test_malformed_approve_body_is_rejected() {
        for body in [&b"{\"genres\": 5}"[..], b"{not json", b"[1,2]"] {
            assert!(matches!(
                parse_approve_request(body),
                Err(ApiError::BadRequest(_))
            ));
        }
    }
}
