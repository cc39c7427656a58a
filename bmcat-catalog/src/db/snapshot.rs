//! Whole-catalog export and import
//!
//! Import replaces all three collections in one transaction; a rejected
//! document leaves the catalog untouched.

use crate::error::{CatalogError, CatalogResult};
use crate::models::{CatalogSnapshot, Collection};

use super::store::{insert_record, Record, StorePartition};

impl StorePartition {
    /// Literal contents of the three collections
    pub async fn export_snapshot(&self) -> CatalogResult<CatalogSnapshot> {
        let snapshot = CatalogSnapshot {
            pending: self.list_pending(None).await?,
            active: self.list_entries(Collection::Active).await?,
            archived: self.list_entries(Collection::Archived).await?,
        };

        tracing::info!(
            pending = snapshot.pending.len(),
            active = snapshot.active.len(),
            archived = snapshot.archived.len(),
            "Exported catalog snapshot"
        );

        Ok(snapshot)
    }

    /// Replace every collection with the snapshot's contents
    pub async fn import_snapshot(&self, snapshot: &CatalogSnapshot) -> CatalogResult<()> {
        let duplicates = snapshot.duplicate_ids();
        if !duplicates.is_empty() {
            let ids: Vec<String> = duplicates.iter().map(|id| id.to_string()).collect();
            return Err(CatalogError::InvalidSnapshot(format!(
                "ids listed more than once: {}",
                ids.join(", ")
            )));
        }

        let records = snapshot
            .pending
            .iter()
            .cloned()
            .map(Record::Pending)
            .chain(snapshot.active.iter().cloned().map(Record::Active))
            .chain(snapshot.archived.iter().cloned().map(Record::Archived));

        let mut tx = self.pool().begin().await?;

        for table in [
            "catalog_ids",
            "pending_submissions",
            "active_entries",
            "archived_entries",
        ] {
            let sql = format!("DELETE FROM {}", table);
            sqlx::query(&sql).execute(&mut *tx).await?;
        }

        for record in records {
            sqlx::query("INSERT INTO catalog_ids (external_id, collection) VALUES (?, ?)")
                .bind(record.id().get())
                .bind(record.collection().as_str())
                .execute(&mut *tx)
                .await?;

            insert_record(&mut *tx, &record).await.map_err(|err| match err {
                CatalogError::Database(db_err) if super::store::is_unique_violation(&db_err) => {
                    CatalogError::InvalidSnapshot(format!(
                        "record {} conflicts with another record: {}",
                        record.id(),
                        db_err
                    ))
                }
                other => other,
            })?;
        }

        tx.commit().await?;

        tracing::info!(
            pending = snapshot.pending.len(),
            active = snapshot.active.len(),
            archived = snapshot.archived.len(),
            "Imported catalog snapshot"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BeatmapMetadata, CatalogEntry, ExternalId, PendingSubmission};

    fn id(raw: i64) -> ExternalId {
        ExternalId::new(raw).unwrap()
    }

    fn entry(raw: i64, title: &str) -> CatalogEntry {
        CatalogEntry::new(
            id(raw),
            BeatmapMetadata {
                title: title.to_string(),
                artist: "a".to_string(),
                creator: "c".to_string(),
                uploader_id: None,
                uploader_username: None,
                bpm: None,
                status: "loved".to_string(),
                difficulties: vec![],
                last_updated: None,
                thumbnail_url: None,
                nsfw: false,
                tags: String::new(),
            },
            vec!["Jazz".to_string()],
        )
    }

    async fn store() -> StorePartition {
        StorePartition::new(bmcat_common::db::init_memory_database().await.unwrap())
    }

    #[tokio::test]
    async fn test_import_replaces_everything() {
        let store = store().await;
        store.create(&Record::Active(entry(1, "old"))).await.unwrap();

        let snapshot = CatalogSnapshot {
            pending: vec![PendingSubmission::new(id(2), "u".to_string(), vec![])],
            active: vec![entry(3, "new")],
            archived: vec![entry(4, "gone")],
        };
        store.import_snapshot(&snapshot).await.unwrap();

        assert_eq!(store.exists(id(1)).await.unwrap(), None);
        assert_eq!(store.exists(id(2)).await.unwrap(), Some(Collection::Pending));
        assert_eq!(store.exists(id(3)).await.unwrap(), Some(Collection::Active));
        assert_eq!(store.exists(id(4)).await.unwrap(), Some(Collection::Archived));

        let exported = store.export_snapshot().await.unwrap();
        assert_eq!(exported.active, snapshot.active);
        assert_eq!(exported.archived, snapshot.archived);
        assert_eq!(exported.pending.len(), 1);
    }

    #[tokio::test]
    async fn test_import_with_duplicate_ids_changes_nothing() {
        let store = store().await;
        store.create(&Record::Active(entry(1, "kept"))).await.unwrap();

        let snapshot = CatalogSnapshot {
            pending: vec![],
            active: vec![entry(7, "x")],
            archived: vec![entry(7, "y")],
        };
        let err = store.import_snapshot(&snapshot).await.unwrap_err();
        assert!(matches!(err, CatalogError::InvalidSnapshot(_)));

        assert_eq!(store.exists(id(1)).await.unwrap(), Some(Collection::Active));
        assert_eq!(store.exists(id(7)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_import_rolls_back_on_guid_clash() {
        let store = store().await;
        store.create(&Record::Active(entry(1, "kept"))).await.unwrap();

        let first = entry(8, "x");
        let mut second = entry(9, "y");
        second.guid = first.guid;

        let snapshot = CatalogSnapshot {
            pending: vec![],
            active: vec![first, second],
            archived: vec![],
        };
        let err = store.import_snapshot(&snapshot).await.unwrap_err();
        assert!(matches!(err, CatalogError::InvalidSnapshot(_)));

        assert_eq!(store.exists(id(1)).await.unwrap(), Some(Collection::Active));
        assert_eq!(store.exists(id(8)).await.unwrap(), None);
    }
}
