//! bmcat-catalog library interface
//!
//! Beatmap catalog service: submissions move through moderation into the
//! active catalog, and a reconciliation job keeps active and archived entries
//! in step with the osu! API.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use crate::error::{ApiError, ApiResult, CatalogError, CatalogResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::db::StorePartition;
use crate::services::{LifecycleController, MetadataProvider, ReconcileSettings, Reconciler};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub lifecycle: LifecycleController,
    pub reconciler: Arc<Reconciler>,
    /// Paced provider, shared with the reconciler
    pub provider: Arc<dyn MetadataProvider>,
    /// Bearer token for moderator endpoints; admin routes are closed without one
    pub admin_token: Option<String>,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        store: StorePartition,
        provider: Arc<dyn MetadataProvider>,
        settings: ReconcileSettings,
        admin_token: Option<String>,
    ) -> Self {
        let lifecycle = LifecycleController::new(store);
        let reconciler = Arc::new(Reconciler::new(lifecycle.clone(), provider, settings));
        let provider = reconciler.provider();

        Self {
            lifecycle,
            reconciler,
            provider,
            admin_token,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::submission_routes())
        .merge(api::catalog_routes())
        .merge(api::reconcile_routes())
        .merge(api::snapshot_routes())
        .merge(api::search_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
