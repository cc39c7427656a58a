//! HTTP API handlers for bmcat-catalog

pub mod auth;
pub mod catalog;
pub mod health;
pub mod reconcile;
pub mod search;
pub mod snapshot;
pub mod submissions;

pub use catalog::catalog_routes;
pub use health::health_routes;
pub use reconcile::reconcile_routes;
pub use search::search_routes;
pub use snapshot::snapshot_routes;
pub use submissions::submission_routes;

use crate::error::{ApiError, ApiResult};
use crate::models::ExternalId;

/// Path segment to external id
fn path_id(raw: i64) -> ApiResult<ExternalId> {
    ExternalId::new(raw)
        .ok_or_else(|| ApiError::BadRequest(format!("beatmap set id must be positive, got {}", raw)))
}
