//! Services for bmcat-catalog

pub mod lifecycle;
pub mod osu_client;
pub mod provider;
pub mod rate_limiter;
pub mod reconciler;
pub mod search;

pub use lifecycle::LifecycleController;
pub use osu_client::{OsuClient, OsuCredentials, OsuError};
pub use provider::{FetchOutcome, MetadataProvider, PacedProvider};
pub use rate_limiter::RateLimiter;
pub use reconciler::{
    plan_transition, ReconcileError, ReconcileSettings, Reconciler, RunGuard, Transition,
};
pub use search::{search, SearchParams, SearchResults};
