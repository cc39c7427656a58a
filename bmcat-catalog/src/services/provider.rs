//! External metadata provider seam
//!
//! The reconciler and the approval endpoint depend on this trait, not on the
//! osu! client, so tests can script provider answers. Both reach the provider
//! through the same [`PacedProvider`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::rate_limiter::RateLimiter;
use crate::models::{BeatmapMetadata, ExternalId};

/// Result of looking up one beatmap set upstream
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Resolved(BeatmapMetadata),
    /// The provider positively reports the set does not exist
    NotFound,
    /// Anything else: network failure, timeout, auth, bad payload
    Transient(String),
}

impl FetchOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            FetchOutcome::Resolved(_) => "resolved",
            FetchOutcome::NotFound => "not_found",
            FetchOutcome::Transient(_) => "transient",
        }
    }
}

#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Look up the current metadata of `id`. Never panics, never errors:
    /// every failure is folded into [`FetchOutcome::Transient`].
    async fn fetch(&self, id: ExternalId) -> FetchOutcome;
}

/// Provider whose calls all pass through one [`RateLimiter`], whoever makes
/// them
pub struct PacedProvider {
    inner: Arc<dyn MetadataProvider>,
    rate_limiter: RateLimiter,
}

impl PacedProvider {
    pub fn new(inner: Arc<dyn MetadataProvider>, min_interval: Duration) -> Self {
        Self {
            inner,
            rate_limiter: RateLimiter::new(min_interval),
        }
    }
}

#[async_trait]
impl MetadataProvider for PacedProvider {
    async fn fetch(&self, id: ExternalId) -> FetchOutcome {
        self.rate_limiter.wait().await;
        self.inner.fetch(id).await
    }
}
