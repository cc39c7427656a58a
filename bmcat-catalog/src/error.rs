//! Error types for bmcat-catalog
//!
//! `CatalogError` is raised by the store partition and lifecycle controller;
//! `ApiError` maps everything onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::{Collection, ExternalId};
use crate::services::ReconcileError;

/// Store and lifecycle errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Id already present in some collection
    #[error("Beatmap set {id} is already cataloged ({collection})")]
    Duplicate { id: ExternalId, collection: Collection },

    /// Approve/deny on an id that is not an awaiting submission
    #[error("Beatmap set {0} is not a pending submission")]
    NotPending(ExternalId),

    /// Id is not in the collection the operation requires
    #[error("Beatmap set {id} not found in {collection}")]
    NotFound { id: ExternalId, collection: Collection },

    /// Atomic move preconditions failed; the caller may retry
    #[error("Conflicting update for beatmap set {id}: {reason}")]
    Conflict { id: ExternalId, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Stored row could not be decoded
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Common(#[from] bmcat_common::Error),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl CatalogError {
    /// Transient SQLite lock contention, safe to retry
    pub fn is_lock_contention(&self) -> bool {
        match self {
            CatalogError::Database(err) => bmcat_common::is_sqlite_lock_error(err),
            CatalogError::Common(err) => err.is_database_locked(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Corrupt(err.to_string())
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing caller identity (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller lacks the admin role (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Conflict (409), e.g. duplicate submission or reconciliation already running
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upstream provider unavailable (502)
    #[error("Bad gateway: {0}")]
    BadGateway(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Duplicate { .. }
            | CatalogError::NotPending(_)
            | CatalogError::Conflict { .. } => ApiError::Conflict(err.to_string()),
            CatalogError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            CatalogError::InvalidInput(_) | CatalogError::InvalidSnapshot(_) => {
                ApiError::BadRequest(err.to_string())
            }
            CatalogError::Corrupt(_) | CatalogError::Database(_) | CatalogError::Common(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<ReconcileError> for ApiError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::AlreadyRunning => ApiError::Conflict(err.to_string()),
            ReconcileError::Snapshot(_) | ReconcileError::ForeignGuard => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::BadGateway(_) => (StatusCode::BAD_GATEWAY, "BAD_GATEWAY"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(code = error_code, error = %self, "Request failed");
        }

        let message = match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::Conflict(msg)
            | ApiError::BadGateway(msg)
            | ApiError::Internal(msg) => msg,
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: i64) -> ExternalId {
        ExternalId::new(raw).unwrap()
    }

    #[test]
    fn test_catalog_errors_map_to_http_status() {
        let cases = [
            (
                CatalogError::Duplicate { id: id(1), collection: Collection::Active },
                StatusCode::CONFLICT,
            ),
            (CatalogError::NotPending(id(2)), StatusCode::CONFLICT),
            (
                CatalogError::NotFound { id: id(3), collection: Collection::Active },
                StatusCode::NOT_FOUND,
            ),
            (
                CatalogError::Conflict { id: id(4), reason: "race".to_string() },
                StatusCode::CONFLICT,
            ),
            (CatalogError::InvalidSnapshot("x".to_string()), StatusCode::BAD_REQUEST),
            (CatalogError::Corrupt("x".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.status_and_code().0, expected);
        }
    }

    #[test]
    fn test_already_running_is_conflict() {
        let api: ApiError = ReconcileError::AlreadyRunning.into();
        assert_eq!(api.status_and_code().0, StatusCode::CONFLICT);
    }
}
