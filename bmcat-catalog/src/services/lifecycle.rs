//! Lifecycle controller
//!
//! Every transition of a beatmap set between pending, active and archived
//! goes through here. Cross-collection transitions are single
//! `move_atomic` calls; the rest are guarded single-row updates.
//!
//! ```text
//! Unknown -> Pending(awaiting) -> Active <-> Archived
//!            Pending(awaiting) -> Pending(denied)
//! ```

use crate::db::{Record, StorePartition};
use crate::error::{CatalogError, CatalogResult};
use crate::models::{
    normalize_genres, BeatmapMetadata, CatalogEntry, Collection, ExternalId, ModerationStatus,
    PendingSubmission,
};

#[derive(Debug, Clone)]
pub struct LifecycleController {
    store: StorePartition,
}

impl LifecycleController {
    pub fn new(store: StorePartition) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &StorePartition {
        &self.store
    }

    /// Record a new submission awaiting moderation
    pub async fn submit(
        &self,
        id: ExternalId,
        submitter: &str,
        suggested_genres: Vec<String>,
    ) -> CatalogResult<PendingSubmission> {
        let submitter = submitter.trim();
        if submitter.is_empty() {
            return Err(CatalogError::InvalidInput("submitter is required".to_string()));
        }

        let submission =
            PendingSubmission::new(id, submitter.to_string(), normalize_genres(suggested_genres));
        self.store.create(&Record::Pending(submission.clone())).await?;

        tracing::info!(
            id = %id,
            submitter = %submission.submitter,
            genres = ?submission.suggested_genres,
            "Submission received"
        );

        Ok(submission)
    }

    /// Move an awaiting submission into the catalog.
    ///
    /// `curated_genres` replaces the submitter's suggestions when given.
    pub async fn approve(
        &self,
        id: ExternalId,
        metadata: BeatmapMetadata,
        curated_genres: Option<Vec<String>>,
    ) -> CatalogResult<CatalogEntry> {
        let submission = self.awaiting_submission(id).await?;

        let genres = match curated_genres {
            Some(genres) => normalize_genres(genres),
            None => submission.suggested_genres,
        };
        let entry = CatalogEntry::new(id, metadata, genres);

        self.store
            .move_atomic(
                id,
                Collection::Pending,
                Collection::Active,
                &Record::Active(entry.clone()),
            )
            .await
            .map_err(|err| match err {
                // Denied or approved by someone else since we looked
                CatalogError::Conflict { .. } => CatalogError::NotPending(id),
                other => other,
            })?;

        tracing::info!(id = %id, guid = %entry.guid, genres = ?entry.genres, "Submission approved");
        Ok(entry)
    }

    /// Mark a pending submission as denied. Denying twice is a no-op.
    pub async fn deny(&self, id: ExternalId) -> CatalogResult<()> {
        let submission = self
            .store
            .get_pending(id)
            .await?
            .ok_or(CatalogError::NotPending(id))?;

        if submission.status == ModerationStatus::Denied {
            tracing::debug!(id = %id, "Submission already denied");
            return Ok(());
        }

        let changed = self
            .store
            .set_pending_status(id, ModerationStatus::Awaiting, ModerationStatus::Denied)
            .await?;

        if !changed {
            // Lost a race: fine if it is now denied, not if it was approved
            match self.store.get_pending(id).await? {
                Some(current) if current.status == ModerationStatus::Denied => {}
                _ => return Err(CatalogError::NotPending(id)),
            }
        }

        tracing::info!(id = %id, "Submission denied");
        Ok(())
    }

    /// Replace the curated genres of an active entry
    pub async fn edit_genres(&self, id: ExternalId, genres: Vec<String>) -> CatalogResult<Vec<String>> {
        let genres = normalize_genres(genres);

        if !self.store.replace_genres(id, &genres).await? {
            return Err(CatalogError::NotFound {
                id,
                collection: Collection::Active,
            });
        }

        tracing::info!(id = %id, genres = ?genres, "Genres updated");
        Ok(genres)
    }

    /// Replace the genres of several active entries together. Either every
    /// entry changes or, when one id is not active, none does.
    pub async fn edit_genres_many(
        &self,
        edits: Vec<(ExternalId, Vec<String>)>,
    ) -> CatalogResult<usize> {
        let edits: Vec<_> = edits
            .into_iter()
            .map(|(id, genres)| (id, normalize_genres(genres)))
            .collect();

        self.store.replace_genres_many(&edits).await?;

        tracing::info!(entries = edits.len(), "Genres updated in batch");
        Ok(edits.len())
    }

    /// Active -> Archived, keeping the last known metadata and genres
    pub async fn archive(&self, id: ExternalId) -> CatalogResult<CatalogEntry> {
        let entry = self.require_entry(Collection::Active, id).await?;

        self.store
            .move_atomic(
                id,
                Collection::Active,
                Collection::Archived,
                &Record::Archived(entry.clone()),
            )
            .await?;

        tracing::info!(id = %id, guid = %entry.guid, "Entry archived");
        Ok(entry)
    }

    /// Archived -> Active with fresh provider metadata
    pub async fn revive(
        &self,
        id: ExternalId,
        metadata: BeatmapMetadata,
    ) -> CatalogResult<CatalogEntry> {
        let entry = self
            .require_entry(Collection::Archived, id)
            .await?
            .with_metadata(metadata);

        self.store
            .move_atomic(
                id,
                Collection::Archived,
                Collection::Active,
                &Record::Active(entry.clone()),
            )
            .await?;

        tracing::info!(id = %id, guid = %entry.guid, "Entry revived");
        Ok(entry)
    }

    /// Overwrite the provider metadata of an active entry in place
    pub async fn refresh(&self, id: ExternalId, metadata: &BeatmapMetadata) -> CatalogResult<()> {
        if !self.store.refresh_metadata(id, metadata).await? {
            return Err(CatalogError::NotFound {
                id,
                collection: Collection::Active,
            });
        }

        tracing::debug!(id = %id, title = %metadata.title, "Entry refreshed");
        Ok(())
    }

    /// Listed entry by id
    pub async fn get_active(&self, id: ExternalId) -> CatalogResult<CatalogEntry> {
        self.require_entry(Collection::Active, id).await
    }

    /// The submission for `id`, provided it is still awaiting moderation
    pub async fn awaiting_submission(&self, id: ExternalId) -> CatalogResult<PendingSubmission> {
        match self.store.get_pending(id).await? {
            Some(submission) if submission.is_awaiting() => Ok(submission),
            _ => Err(CatalogError::NotPending(id)),
        }
    }

    async fn require_entry(&self, collection: Collection, id: ExternalId) -> CatalogResult<CatalogEntry> {
        self.store
            .get_entry(collection, id)
            .await?
            .ok_or(CatalogError::NotFound { id, collection })
    }
}
