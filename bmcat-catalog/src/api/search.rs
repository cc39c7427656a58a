//! GET /search

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::error::ApiResult;
use crate::models::Collection;
use crate::services::{search, SearchParams, SearchResults};
use crate::AppState;

pub async fn search_catalog(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<SearchResults>> {
    let entries = state.lifecycle.store().list_entries(Collection::Active).await?;
    let results = search(entries, &params);

    tracing::debug!(
        q = ?params.q,
        total = results.total_count,
        returned = results.entries.len(),
        "Search"
    );

    Ok(Json(results))
}

pub fn search_routes() -> Router<AppState> {
    Router::new().route("/search", get(search_catalog))
}
