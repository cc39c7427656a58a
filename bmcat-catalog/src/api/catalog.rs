//! Catalog entry endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::auth::AdminCaller;
use super::path_id;
use crate::error::ApiResult;
use crate::models::genres::deserialize_genres;
use crate::models::CatalogEntry;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct GenresRequest {
    #[serde(deserialize_with = "deserialize_genres")]
    pub genres: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenreEdit {
    pub id: i64,
    #[serde(deserialize_with = "deserialize_genres")]
    pub genres: Vec<String>,
}

/// PUT /catalog/genres request
#[derive(Debug, Deserialize)]
pub struct BatchGenresRequest {
    #[serde(alias = "songs")]
    pub entries: Vec<GenreEdit>,
}

#[derive(Debug, Serialize)]
pub struct BatchGenresResponse {
    pub updated: usize,
}

/// GET /catalog/:id
pub async fn get_entry(
    State(state): State<AppState>,
    Path(raw_id): Path<i64>,
) -> ApiResult<Json<CatalogEntry>> {
    let id = path_id(raw_id)?;
    Ok(Json(state.lifecycle.get_active(id).await?))
}

/// PUT /catalog/:id/genres
pub async fn edit_genres(
    State(state): State<AppState>,
    _admin: AdminCaller,
    Path(raw_id): Path<i64>,
    Json(request): Json<GenresRequest>,
) -> ApiResult<StatusCode> {
    let id = path_id(raw_id)?;
    state.lifecycle.edit_genres(id, request.genres).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /catalog/genres
///
/// All-or-nothing: an id that is not active fails the whole batch with 404.
pub async fn edit_genres_batch(
    State(state): State<AppState>,
    _admin: AdminCaller,
    Json(request): Json<BatchGenresRequest>,
) -> ApiResult<Json<BatchGenresResponse>> {
    let edits = request
        .entries
        .into_iter()
        .map(|edit| Ok((path_id(edit.id)?, edit.genres)))
        .collect::<ApiResult<Vec<_>>>()?;

    let updated = state.lifecycle.edit_genres_many(edits).await?;
    Ok(Json(BatchGenresResponse { updated }))
}

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/catalog/genres", put(edit_genres_batch))
        .route("/catalog/:id", get(get_entry))
        .route("/catalog/:id/genres", put(edit_genres))
}
