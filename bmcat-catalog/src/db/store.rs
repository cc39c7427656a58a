//! Store partition: pending, active and archived collections
//!
//! Every external id has at most one row in `catalog_ids`, naming the
//! collection that holds its record. Creation claims that row; moves rewrite
//! it inside the same transaction that deletes the source record and inserts
//! the destination record.

use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{
    BeatmapMetadata, CatalogEntry, Collection, Difficulty, ExternalId, ModerationStatus,
    PendingSubmission,
};
use crate::utils::retry_on_lock;
use bmcat_common::db::init::DEFAULT_MAX_LOCK_WAIT_MS;

const ENTRY_COLUMNS: &str = "external_id, guid, title, artist, creator, uploader_id, \
     uploader_username, bpm, status_label, difficulties, last_updated, thumbnail_url, nsfw, \
     tags, genres";

const PENDING_COLUMNS: &str = "external_id, submitter, suggested_genres, status, created_at";

/// A record together with the collection it belongs to
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Pending(PendingSubmission),
    Active(CatalogEntry),
    Archived(CatalogEntry),
}

impl Record {
    pub fn id(&self) -> ExternalId {
        match self {
            Record::Pending(submission) => submission.id,
            Record::Active(entry) | Record::Archived(entry) => entry.id,
        }
    }

    pub fn collection(&self) -> Collection {
        match self {
            Record::Pending(_) => Collection::Pending,
            Record::Active(_) => Collection::Active,
            Record::Archived(_) => Collection::Archived,
        }
    }
}

/// Number of ids per collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogCounts {
    pub pending: u64,
    pub active: u64,
    pub archived: u64,
}

/// Handle on the three collections. Cheap to clone.
#[derive(Debug, Clone)]
pub struct StorePartition {
    pool: SqlitePool,
    max_lock_wait_ms: u64,
}

impl StorePartition {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            max_lock_wait_ms: DEFAULT_MAX_LOCK_WAIT_MS as u64,
        }
    }

    /// Build with the lock-retry ceiling stored in `settings`
    pub async fn from_settings(pool: SqlitePool) -> CatalogResult<Self> {
        let max_wait_ms: i64 = sqlx::query_scalar(
            "SELECT CAST(value AS INTEGER) FROM settings WHERE key = 'db_max_lock_wait_ms'",
        )
        .fetch_optional(&pool)
        .await?
        .unwrap_or(DEFAULT_MAX_LOCK_WAIT_MS);

        Ok(Self {
            pool,
            max_lock_wait_ms: max_wait_ms.max(0) as u64,
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Which collection currently holds `id`, if any
    pub async fn exists(&self, id: ExternalId) -> CatalogResult<Option<Collection>> {
        let mut conn = self.pool.acquire().await?;
        collection_of(&mut conn, id).await
    }

    /// Insert a new record. Fails with `Duplicate` if the id is already in
    /// any collection.
    pub async fn create(&self, record: &Record) -> CatalogResult<()> {
        let id = record.id();
        let collection = record.collection();

        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query(
            "INSERT INTO catalog_ids (external_id, collection) VALUES (?, ?) \
             ON CONFLICT(external_id) DO NOTHING",
        )
        .bind(id.get())
        .bind(collection.as_str())
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            let existing = collection_of(&mut *tx, id).await?.unwrap_or(collection);
            return Err(CatalogError::Duplicate {
                id,
                collection: existing,
            });
        }

        match insert_record(&mut *tx, record).await {
            Ok(()) => {}
            Err(CatalogError::Database(err)) if is_unique_violation(&err) => {
                // Row without an index entry: treat as already present
                return Err(CatalogError::Duplicate { id, collection });
            }
            Err(err) => return Err(err),
        }

        tx.commit().await?;

        tracing::debug!(id = %id, collection = %collection, "Created catalog record");
        Ok(())
    }

    /// Move `id` from one collection to another, replacing its record.
    ///
    /// Fails with `Conflict` if `id` is not currently in `from` or already
    /// exists in `to`. Only awaiting submissions can leave `Pending`. The
    /// index update, delete and insert commit together or not at all.
    pub async fn move_atomic(
        &self,
        id: ExternalId,
        from: Collection,
        to: Collection,
        record: &Record,
    ) -> CatalogResult<()> {
        if from == to {
            return Err(CatalogError::InvalidInput(format!(
                "cannot move beatmap set {} within {}",
                id, from
            )));
        }
        if record.id() != id || record.collection() != to {
            return Err(CatalogError::InvalidInput(format!(
                "record for {} in {} does not match move of {} into {}",
                record.id(),
                record.collection(),
                id,
                to
            )));
        }

        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query(
            "UPDATE catalog_ids SET collection = ? WHERE external_id = ? AND collection = ?",
        )
        .bind(to.as_str())
        .bind(id.get())
        .bind(from.as_str())
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            let reason = match collection_of(&mut *tx, id).await? {
                None => "not cataloged".to_string(),
                Some(current) if current == to => format!("already in {}", to),
                Some(current) => format!("expected in {}, found in {}", from, current),
            };
            return Err(CatalogError::Conflict { id, reason });
        }

        // Denied submissions are terminal and never leave the pending store
        let delete_sql = match from {
            Collection::Pending => format!(
                "DELETE FROM {} WHERE external_id = ? AND status = 'awaiting'",
                from.table()
            ),
            _ => format!("DELETE FROM {} WHERE external_id = ?", from.table()),
        };
        let deleted = sqlx::query(&delete_sql)
            .bind(id.get())
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            let reason = match from {
                Collection::Pending => "submission is not awaiting moderation".to_string(),
                _ => format!("indexed in {} but no record there", from),
            };
            return Err(CatalogError::Conflict { id, reason });
        }

        match insert_record(&mut *tx, record).await {
            Ok(()) => {}
            Err(CatalogError::Database(err)) if is_unique_violation(&err) => {
                return Err(CatalogError::Conflict {
                    id,
                    reason: format!("already exists in {}", to),
                });
            }
            Err(err) => return Err(err),
        }

        tx.commit().await?;

        tracing::debug!(id = %id, from = %from, to = %to, "Moved catalog record");
        Ok(())
    }

    pub async fn get_pending(&self, id: ExternalId) -> CatalogResult<Option<PendingSubmission>> {
        let sql = format!(
            "SELECT {} FROM pending_submissions WHERE external_id = ?",
            PENDING_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(pending_from_row).transpose()
    }

    /// Active or archived entry by id
    pub async fn get_entry(
        &self,
        collection: Collection,
        id: ExternalId,
    ) -> CatalogResult<Option<CatalogEntry>> {
        let table = entry_table(collection)?;
        let sql = format!("SELECT {} FROM {} WHERE external_id = ?", ENTRY_COLUMNS, table);
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(entry_from_row).transpose()
    }

    /// Ids currently in `collection`, ascending
    pub async fn list_ids(&self, collection: Collection) -> CatalogResult<Vec<ExternalId>> {
        let raw_ids: Vec<i64> = sqlx::query_scalar(
            "SELECT external_id FROM catalog_ids WHERE collection = ? ORDER BY external_id",
        )
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await?;

        raw_ids.into_iter().map(stored_id).collect()
    }

    /// Pending submissions, oldest first, optionally filtered by status
    pub async fn list_pending(
        &self,
        status: Option<ModerationStatus>,
    ) -> CatalogResult<Vec<PendingSubmission>> {
        let rows = match status {
            Some(status) => {
                let sql = format!(
                    "SELECT {} FROM pending_submissions WHERE status = ? ORDER BY created_at, external_id",
                    PENDING_COLUMNS
                );
                sqlx::query(&sql)
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM pending_submissions ORDER BY created_at, external_id",
                    PENDING_COLUMNS
                );
                sqlx::query(&sql).fetch_all(&self.pool).await?
            }
        };

        rows.iter().map(pending_from_row).collect()
    }

    /// All active or archived entries, ascending by id
    pub async fn list_entries(&self, collection: Collection) -> CatalogResult<Vec<CatalogEntry>> {
        let table = entry_table(collection)?;
        let sql = format!("SELECT {} FROM {} ORDER BY external_id", ENTRY_COLUMNS, table);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(entry_from_row).collect()
    }

    pub async fn counts(&self) -> CatalogResult<CatalogCounts> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT collection, COUNT(*) FROM catalog_ids GROUP BY collection")
                .fetch_all(&self.pool)
                .await?;

        let mut counts = CatalogCounts::default();
        for (collection, count) in rows {
            let count = count.max(0) as u64;
            match collection.parse::<Collection>().map_err(CatalogError::Corrupt)? {
                Collection::Pending => counts.pending = count,
                Collection::Active => counts.active = count,
                Collection::Archived => counts.archived = count,
            }
        }
        Ok(counts)
    }

    /// Change a pending submission's status if it currently has `expected`.
    ///
    /// Returns whether a row changed.
    pub async fn set_pending_status(
        &self,
        id: ExternalId,
        expected: ModerationStatus,
        status: ModerationStatus,
    ) -> CatalogResult<bool> {
        retry_on_lock("set_pending_status", self.max_lock_wait_ms, || async {
            let result = sqlx::query(
                "UPDATE pending_submissions SET status = ? WHERE external_id = ? AND status = ?",
            )
            .bind(status.as_str())
            .bind(id.get())
            .bind(expected.as_str())
            .execute(&self.pool)
            .await?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }

    /// Replace the curated genres of an active entry. Returns whether it exists.
    pub async fn replace_genres(&self, id: ExternalId, genres: &[String]) -> CatalogResult<bool> {
        let genres_json = serde_json::to_string(genres)?;

        retry_on_lock("replace_genres", self.max_lock_wait_ms, || async {
            let result = sqlx::query("UPDATE active_entries SET genres = ? WHERE external_id = ?")
                .bind(&genres_json)
                .bind(id.get())
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }

    /// Replace the genres of several active entries in one transaction.
    ///
    /// Fails with `NotFound` naming the first id that is not active, in
    /// which case no entry changes.
    pub async fn replace_genres_many(&self, edits: &[(ExternalId, Vec<String>)]) -> CatalogResult<()> {
        let encoded = edits
            .iter()
            .map(|(id, genres)| Ok((*id, serde_json::to_string(genres)?)))
            .collect::<CatalogResult<Vec<_>>>()?;

        retry_on_lock("replace_genres_many", self.max_lock_wait_ms, || async {
            let mut tx = self.pool.begin().await?;

            for (id, genres_json) in &encoded {
                let result =
                    sqlx::query("UPDATE active_entries SET genres = ? WHERE external_id = ?")
                        .bind(genres_json)
                        .bind(id.get())
                        .execute(&mut *tx)
                        .await?;

                if result.rows_affected() == 0 {
                    return Err(CatalogError::NotFound {
                        id: *id,
                        collection: Collection::Active,
                    });
                }
            }

            tx.commit().await?;
            Ok(())
        })
        .await
    }

    /// Overwrite the provider fields of an active entry, leaving identity and
    /// genres alone. Returns whether it exists.
    pub async fn refresh_metadata(
        &self,
        id: ExternalId,
        metadata: &BeatmapMetadata,
    ) -> CatalogResult<bool> {
        let difficulties = serde_json::to_string(&metadata.difficulties)?;
        let last_updated = metadata.last_updated.map(|dt| dt.to_rfc3339());

        retry_on_lock("refresh_metadata", self.max_lock_wait_ms, || async {
            let result = sqlx::query(
                r#"
                UPDATE active_entries SET
                    title = ?,
                    artist = ?,
                    creator = ?,
                    uploader_id = ?,
                    uploader_username = ?,
                    bpm = ?,
                    status_label = ?,
                    difficulties = ?,
                    last_updated = ?,
                    thumbnail_url = ?,
                    nsfw = ?,
                    tags = ?
                WHERE external_id = ?
                "#,
            )
            .bind(&metadata.title)
            .bind(&metadata.artist)
            .bind(&metadata.creator)
            .bind(metadata.uploader_id)
            .bind(&metadata.uploader_username)
            .bind(metadata.bpm)
            .bind(&metadata.status)
            .bind(&difficulties)
            .bind(&last_updated)
            .bind(&metadata.thumbnail_url)
            .bind(metadata.nsfw)
            .bind(&metadata.tags)
            .bind(id.get())
            .execute(&self.pool)
            .await?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

fn entry_table(collection: Collection) -> CatalogResult<&'static str> {
    match collection {
        Collection::Active | Collection::Archived => Ok(collection.table()),
        Collection::Pending => Err(CatalogError::InvalidInput(
            "pending submissions are not catalog entries".to_string(),
        )),
    }
}

fn stored_id(raw: i64) -> CatalogResult<ExternalId> {
    ExternalId::new(raw).ok_or_else(|| CatalogError::Corrupt(format!("stored id {} is not positive", raw)))
}

pub(crate) async fn collection_of(
    conn: &mut SqliteConnection,
    id: ExternalId,
) -> CatalogResult<Option<Collection>> {
    let collection: Option<String> =
        sqlx::query_scalar("SELECT collection FROM catalog_ids WHERE external_id = ?")
            .bind(id.get())
            .fetch_optional(&mut *conn)
            .await?;

    collection
        .map(|c| c.parse::<Collection>().map_err(CatalogError::Corrupt))
        .transpose()
}

/// Insert the record row only; the caller owns the `catalog_ids` row
pub(crate) async fn insert_record(conn: &mut SqliteConnection, record: &Record) -> CatalogResult<()> {
    match record {
        Record::Pending(submission) => insert_pending(conn, submission).await,
        Record::Active(entry) => insert_entry(conn, Collection::Active, entry).await,
        Record::Archived(entry) => insert_entry(conn, Collection::Archived, entry).await,
    }
}

async fn insert_pending(conn: &mut SqliteConnection, submission: &PendingSubmission) -> CatalogResult<()> {
    let suggested_genres = serde_json::to_string(&submission.suggested_genres)?;
    let sql = format!(
        "INSERT INTO pending_submissions ({}) VALUES (?, ?, ?, ?, ?)",
        PENDING_COLUMNS
    );

    sqlx::query(&sql)
        .bind(submission.id.get())
        .bind(&submission.submitter)
        .bind(&suggested_genres)
        .bind(submission.status.as_str())
        .bind(submission.created_at.to_rfc3339())
        .execute(&mut *conn)
        .await?;

    Ok(())
}

async fn insert_entry(
    conn: &mut SqliteConnection,
    collection: Collection,
    entry: &CatalogEntry,
) -> CatalogResult<()> {
    let table = entry_table(collection)?;
    let metadata = &entry.metadata;
    let difficulties = serde_json::to_string(&metadata.difficulties)?;
    let genres = serde_json::to_string(&entry.genres)?;
    let last_updated = metadata.last_updated.map(|dt| dt.to_rfc3339());

    let sql = format!(
        "INSERT INTO {} ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        table, ENTRY_COLUMNS
    );

    sqlx::query(&sql)
        .bind(entry.id.get())
        .bind(entry.guid.to_string())
        .bind(&metadata.title)
        .bind(&metadata.artist)
        .bind(&metadata.creator)
        .bind(metadata.uploader_id)
        .bind(&metadata.uploader_username)
        .bind(metadata.bpm)
        .bind(&metadata.status)
        .bind(&difficulties)
        .bind(&last_updated)
        .bind(&metadata.thumbnail_url)
        .bind(metadata.nsfw)
        .bind(&metadata.tags)
        .bind(&genres)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

fn parse_timestamp(raw: &str, field: &str) -> CatalogResult<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| CatalogError::Corrupt(format!("Failed to parse {}: {}", field, e)))
}

fn pending_from_row(row: &SqliteRow) -> CatalogResult<PendingSubmission> {
    let suggested_genres: String = row.try_get("suggested_genres")?;
    let status: String = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(PendingSubmission {
        id: stored_id(row.try_get("external_id")?)?,
        submitter: row.try_get("submitter")?,
        suggested_genres: serde_json::from_str(&suggested_genres)?,
        status: status.parse().map_err(CatalogError::Corrupt)?,
        created_at: parse_timestamp(&created_at, "created_at")?,
    })
}

fn entry_from_row(row: &SqliteRow) -> CatalogResult<CatalogEntry> {
    let guid: String = row.try_get("guid")?;
    let difficulties: String = row.try_get("difficulties")?;
    let genres: String = row.try_get("genres")?;
    let last_updated: Option<String> = row.try_get("last_updated")?;

    let difficulties: Vec<Difficulty> = serde_json::from_str(&difficulties)?;
    let last_updated = last_updated
        .map(|raw| parse_timestamp(&raw, "last_updated"))
        .transpose()?;

    Ok(CatalogEntry {
        id: stored_id(row.try_get("external_id")?)?,
        guid: Uuid::parse_str(&guid)
            .map_err(|e| CatalogError::Corrupt(format!("Failed to parse guid: {}", e)))?,
        metadata: BeatmapMetadata {
            title: row.try_get("title")?,
            artist: row.try_get("artist")?,
            creator: row.try_get("creator")?,
            uploader_id: row.try_get("uploader_id")?,
            uploader_username: row.try_get("uploader_username")?,
            bpm: row.try_get("bpm")?,
            status: row.try_get("status_label")?,
            difficulties,
            last_updated,
            thumbnail_url: row.try_get("thumbnail_url")?,
            nsfw: row.try_get("nsfw")?,
            tags: row.try_get("tags")?,
        },
        genres: serde_json::from_str(&genres)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GameMode;

    fn id(raw: i64) -> ExternalId {
        ExternalId::new(raw).unwrap()
    }

    fn metadata(title: &str) -> BeatmapMetadata {
        BeatmapMetadata {
            title: title.to_string(),
            artist: "Artist".to_string(),
            creator: "Mapper".to_string(),
            uploader_id: Some(2),
            uploader_username: Some("Mapper".to_string()),
            bpm: Some(174.0),
            status: "ranked".to_string(),
            difficulties: vec![Difficulty {
                mode: GameMode::Taiko,
                stars: 5.25,
            }],
            last_updated: Some(chrono::Utc::now()),
            thumbnail_url: Some("https://assets.ppy.sh/beatmaps/1/covers/card.jpg".to_string()),
            nsfw: false,
            tags: "tag one".to_string(),
        }
    }

    async fn store() -> StorePartition {
        let pool = bmcat_common::db::init_memory_database().await.unwrap();
        StorePartition::from_settings(pool).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_rejects_id_in_any_collection() {
        let store = store().await;
        let entry = CatalogEntry::new(id(10), metadata("T"), vec![]);
        store.create(&Record::Archived(entry)).await.unwrap();

        let submission = PendingSubmission::new(id(10), "user".to_string(), vec![]);
        let err = store.create(&Record::Pending(submission)).await.unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Duplicate { collection: Collection::Archived, .. }
        ));
        assert!(store.get_pending(id(10)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_entry_round_trips_through_storage() {
        let store = store().await;
        let entry = CatalogEntry::new(id(11), metadata("Stored"), vec!["Rock".to_string()]);
        store.create(&Record::Active(entry.clone())).await.unwrap();

        let loaded = store.get_entry(Collection::Active, id(11)).await.unwrap().unwrap();
        assert_eq!(loaded.guid, entry.guid);
        assert_eq!(loaded.genres, entry.genres);
        assert_eq!(loaded.metadata.difficulties, entry.metadata.difficulties);
        assert_eq!(loaded.metadata.title, "Stored");
    }

    #[tokio::test]
    async fn test_move_requires_source_collection() {
        let store = store().await;
        let entry = CatalogEntry::new(id(12), metadata("T"), vec![]);
        store.create(&Record::Active(entry.clone())).await.unwrap();

        let err = store
            .move_atomic(id(12), Collection::Archived, Collection::Active, &Record::Active(entry))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Conflict { .. }));
        assert_eq!(store.exists(id(12)).await.unwrap(), Some(Collection::Active));
    }

    #[tokio::test]
    async fn test_move_rolls_back_when_destination_occupied() {
        let store = store().await;
        let entry = CatalogEntry::new(id(13), metadata("T"), vec![]);
        store.create(&Record::Active(entry.clone())).await.unwrap();

        // Stray archived row without an index entry
        let mut conn = store.pool().acquire().await.unwrap();
        insert_entry(&mut conn, Collection::Archived, &entry).await.unwrap();
        drop(conn);

        let err = store
            .move_atomic(
                id(13),
                Collection::Active,
                Collection::Archived,
                &Record::Archived(entry),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Conflict { .. }));

        // Nothing changed: still indexed and stored as active
        assert_eq!(store.exists(id(13)).await.unwrap(), Some(Collection::Active));
        assert!(store.get_entry(Collection::Active, id(13)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_counts_per_collection() {
        let store = store().await;
        store
            .create(&Record::Pending(PendingSubmission::new(id(1), "u".to_string(), vec![])))
            .await
            .unwrap();
        store
            .create(&Record::Active(CatalogEntry::new(id(2), metadata("a"), vec![])))
            .await
            .unwrap();
        store
            .create(&Record::Active(CatalogEntry::new(id(3), metadata("b"), vec![])))
            .await
            .unwrap();

        let counts = store.counts().await.unwrap();
        assert_eq!(
            counts,
            CatalogCounts {
                pending: 1,
                active: 2,
                archived: 0
            }
        );
        assert_eq!(store.list_ids(Collection::Active).await.unwrap(), vec![id(2), id(3)]);
    }

    #[tokio::test]
    async fn test_batch_genre_edit_is_all_or_nothing() {
        let store = store().await;
        for raw in [1, 2] {
            store
                .create(&Record::Active(CatalogEntry::new(id(raw), metadata("t"), vec![])))
                .await
                .unwrap();
        }

        let err = store
            .replace_genres_many(&[
                (id(1), vec!["Rock".to_string()]),
                (id(9), vec!["Pop".to_string()]),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { id: missing, .. } if missing == id(9)));
        assert!(store
            .get_entry(Collection::Active, id(1))
            .await
            .unwrap()
            .unwrap()
            .genres
            .is_empty());

        store
            .replace_genres_many(&[
                (id(1), vec!["Rock".to_string()]),
                (id(2), vec!["Jazz".to_string()]),
            ])
            .await
            .unwrap();
        let second = store.get_entry(Collection::Active, id(2)).await.unwrap().unwrap();
        assert_eq!(second.genres, vec!["Jazz".to_string()]);
    }

    #[tokio::test]
    async fn test_refresh_metadata_keeps_genres() {
        let store = store().await;
        let entry = CatalogEntry::new(id(20), metadata("Old"), vec!["Pop".to_string()]);
        store.create(&Record::Active(entry)).await.unwrap();

        assert!(store.refresh_metadata(id(20), &metadata("New")).await.unwrap());
        assert!(!store.refresh_metadata(id(21), &metadata("New")).await.unwrap());

        let loaded = store.get_entry(Collection::Active, id(20)).await.unwrap().unwrap();
        assert_eq!(loaded.metadata.title, "New");
        assert_eq!(loaded.genres, vec!["Pop"]);
    }
}
