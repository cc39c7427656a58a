//! Reconciliation batch job
//!
//! Re-validates every active and archived beatmap set against the metadata
//! provider, one call at a time under a fixed inter-call delay:
//!
//! | origin   | Resolved | NotFound      | Transient |
//! |----------|----------|---------------|-----------|
//! | active   | refresh  | archive       | failure   |
//! | archived | revive   | keep archived | failure   |
//!
//! A failing item is recorded in the report and the walk continues. Only one
//! run may be in flight; the run lock is taken before the id snapshot and
//! released when the [`RunGuard`] drops.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::lifecycle::LifecycleController;
use super::provider::{FetchOutcome, MetadataProvider, PacedProvider};
use crate::db::runs::{load_last_run_report, save_run_report};
use crate::error::{CatalogError, CatalogResult};
use crate::models::{BeatmapMetadata, Collection, ExternalId, RunReport};
use bmcat_common::config::{ReconcileConfig, DEFAULT_INTER_CALL_DELAY_MS};

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Reconciliation is already running")]
    AlreadyRunning,

    /// Could not read the id snapshot; nothing was visited
    #[error("Failed to snapshot catalog ids: {0}")]
    Snapshot(#[source] CatalogError),

    #[error("Run guard belongs to a different reconciler")]
    ForeignGuard,
}

/// Pacing and budget of a run
#[derive(Debug, Clone)]
pub struct ReconcileSettings {
    /// Minimum spacing between successive provider calls
    pub inter_call_delay: Duration,
    pub max_run_duration: Option<Duration>,
    pub max_items: Option<usize>,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            inter_call_delay: Duration::from_millis(DEFAULT_INTER_CALL_DELAY_MS),
            max_run_duration: None,
            max_items: None,
        }
    }
}

impl From<&ReconcileConfig> for ReconcileSettings {
    fn from(config: &ReconcileConfig) -> Self {
        Self {
            inter_call_delay: Duration::from_millis(config.inter_call_delay_ms),
            max_run_duration: config.max_run_seconds.map(Duration::from_secs),
            max_items: config.max_items,
        }
    }
}

/// What to do with one visited item
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Refresh(BeatmapMetadata),
    Archive,
    Revive(BeatmapMetadata),
    KeepArchived,
    RecordFailure(String),
}

/// Decide the transition for an item from where it lives and what the
/// provider said about it
pub fn plan_transition(origin: Collection, outcome: FetchOutcome) -> Transition {
    match (origin, outcome) {
        (_, FetchOutcome::Transient(reason)) => Transition::RecordFailure(reason),
        (Collection::Active, FetchOutcome::Resolved(metadata)) => Transition::Refresh(metadata),
        (Collection::Active, FetchOutcome::NotFound) => Transition::Archive,
        (Collection::Archived, FetchOutcome::Resolved(metadata)) => Transition::Revive(metadata),
        (Collection::Archived, FetchOutcome::NotFound) => Transition::KeepArchived,
        (Collection::Pending, _) => {
            Transition::RecordFailure("pending submissions are not reconciled".to_string())
        }
    }
}

/// Proof that the holder owns the single-flight run lock
pub struct RunGuard {
    lock: Arc<Mutex<()>>,
    _guard: OwnedMutexGuard<()>,
}

pub struct Reconciler {
    lifecycle: LifecycleController,
    provider: Arc<dyn MetadataProvider>,
    settings: ReconcileSettings,
    run_lock: Arc<Mutex<()>>,
}

impl Reconciler {
    /// Wraps `provider` in the inter-call delay. Anything else that calls the
    /// provider must go through [`Reconciler::provider`] to share the pacing.
    pub fn new(
        lifecycle: LifecycleController,
        provider: Arc<dyn MetadataProvider>,
        settings: ReconcileSettings,
    ) -> Self {
        let provider: Arc<dyn MetadataProvider> =
            Arc::new(PacedProvider::new(provider, settings.inter_call_delay));

        Self {
            lifecycle,
            provider,
            settings,
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    /// The paced provider handle
    pub fn provider(&self) -> Arc<dyn MetadataProvider> {
        self.provider.clone()
    }

    /// Take the run lock without waiting
    pub fn try_acquire(&self) -> Result<RunGuard, ReconcileError> {
        self.run_lock
            .clone()
            .try_lock_owned()
            .map(|guard| RunGuard {
                lock: self.run_lock.clone(),
                _guard: guard,
            })
            .map_err(|_| ReconcileError::AlreadyRunning)
    }

    pub fn is_running(&self) -> bool {
        self.run_lock.try_lock().is_err()
    }

    /// Run to completion, failing fast if another run holds the lock
    pub async fn run(&self) -> Result<RunReport, ReconcileError> {
        let guard = self.try_acquire()?;
        self.run_locked(guard).await
    }

    /// Run with a lock the caller already holds. The guard must come from
    /// this reconciler's [`Reconciler::try_acquire`].
    pub async fn run_locked(&self, guard: RunGuard) -> Result<RunReport, ReconcileError> {
        if !Arc::ptr_eq(&guard.lock, &self.run_lock) {
            return Err(ReconcileError::ForeignGuard);
        }

        let mut report = RunReport::new(Utc::now());
        let started = Instant::now();

        let items = self.snapshot_ids().await.map_err(ReconcileError::Snapshot)?;
        let total = items.len();

        tracing::info!(
            items = total,
            delay_ms = self.settings.inter_call_delay.as_millis() as u64,
            "Reconciliation started"
        );

        for (index, (origin, id)) in items.into_iter().enumerate() {
            if let Some(reason) = self.budget_exhausted(report.processed, started) {
                report.truncated = true;
                report.skipped = total - index;
                tracing::warn!(skipped = report.skipped, reason, "Reconciliation budget exhausted");
                break;
            }

            let outcome = self.provider.fetch(id).await;
            tracing::debug!(id = %id, origin = %origin, outcome = outcome.label(), "Fetched");

            report.processed += 1;
            self.apply(origin, id, outcome, &mut report).await;
        }

        report.finish();

        tracing::info!(
            processed = report.processed,
            updated = report.updated,
            archived = report.archived,
            revived = report.revived,
            kept_archived = report.kept_archived,
            failed = report.failed,
            skipped = report.skipped,
            truncated = report.truncated,
            elapsed_seconds = report.elapsed_seconds(),
            "Reconciliation finished"
        );

        if let Err(e) = save_run_report(self.lifecycle.store().pool(), &report).await {
            tracing::error!(error = %e, "Failed to persist reconciliation report");
        }

        drop(guard);
        Ok(report)
    }

    /// Most recent finished run
    pub async fn last_report(&self) -> CatalogResult<Option<RunReport>> {
        load_last_run_report(self.lifecycle.store().pool()).await
    }

    /// Active ids first, then archived
    async fn snapshot_ids(&self) -> CatalogResult<Vec<(Collection, ExternalId)>> {
        let store = self.lifecycle.store();
        let active = store.list_ids(Collection::Active).await?;
        let archived = store.list_ids(Collection::Archived).await?;

        Ok(active
            .into_iter()
            .map(|id| (Collection::Active, id))
            .chain(archived.into_iter().map(|id| (Collection::Archived, id)))
            .collect())
    }

    fn budget_exhausted(&self, processed: usize, started: Instant) -> Option<&'static str> {
        if self.settings.max_items.is_some_and(|max| processed >= max) {
            return Some("max_items");
        }
        if self
            .settings
            .max_run_duration
            .is_some_and(|max| started.elapsed() >= max)
        {
            return Some("max_run_duration");
        }
        None
    }

    async fn apply(
        &self,
        origin: Collection,
        id: ExternalId,
        outcome: FetchOutcome,
        report: &mut RunReport,
    ) {
        let result = match plan_transition(origin, outcome) {
            Transition::Refresh(metadata) => self
                .lifecycle
                .refresh(id, &metadata)
                .await
                .map(|()| report.updated += 1),
            Transition::Archive => self
                .lifecycle
                .archive(id)
                .await
                .map(|_| report.archived += 1),
            Transition::Revive(metadata) => self
                .lifecycle
                .revive(id, metadata)
                .await
                .map(|_| report.revived += 1),
            Transition::KeepArchived => {
                report.kept_archived += 1;
                Ok(())
            }
            Transition::RecordFailure(reason) => {
                tracing::warn!(id = %id, origin = %origin, reason = %reason, "Provider lookup failed");
                report.record_failure(id);
                Ok(())
            }
        };

        if let Err(e) = result {
            tracing::warn!(id = %id, origin = %origin, error = %e, "Failed to apply transition");
            report.record_failure(id);
        }
    }
}
