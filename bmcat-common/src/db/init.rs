//! Database initialization
//!
//! Creates the SQLite database on first run and applies the schema
//! idempotently on every start.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Busy timeout applied to every connection; writers retry on top of this
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 250;

/// Default ceiling for lock retries performed by writers
pub const DEFAULT_MAX_LOCK_WAIT_MS: i64 = 5000;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Per-connection pragmas
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// In-memory database with the full schema.
///
/// Limited to one connection: every `sqlite::memory:` connection is a distinct
/// database, so a larger pool would split the data.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_settings_table(pool).await?;
    create_catalog_ids_table(pool).await?;
    create_pending_submissions_table(pool).await?;
    create_entry_table(pool, "active_entries").await?;
    create_entry_table(pool, "archived_entries").await?;
    create_reconcile_runs_table(pool).await?;

    init_default_settings(pool).await?;

    info!("Database schema ready");
    Ok(())
}

/// Create the settings table
///
/// Stores service configuration key-value pairs.
async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Partition index: one row per known external id, naming its collection.
///
/// The primary key is what keeps an id in at most one collection.
async fn create_catalog_ids_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS catalog_ids (
            external_id INTEGER PRIMARY KEY,
            collection TEXT NOT NULL CHECK (collection IN ('pending', 'active', 'archived'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_pending_submissions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pending_submissions (
            external_id INTEGER PRIMARY KEY,
            submitter TEXT NOT NULL,
            suggested_genres TEXT NOT NULL DEFAULT '[]',
            status TEXT NOT NULL CHECK (status IN ('awaiting', 'denied')),
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Active and archived entries share one shape
async fn create_entry_table(pool: &SqlitePool, table: &str) -> Result<()> {
    let sql = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            external_id INTEGER PRIMARY KEY,
            guid TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            artist TEXT NOT NULL,
            creator TEXT NOT NULL,
            uploader_id INTEGER,
            uploader_username TEXT,
            bpm REAL,
            status_label TEXT NOT NULL,
            difficulties TEXT NOT NULL DEFAULT '[]',
            last_updated TEXT,
            thumbnail_url TEXT,
            nsfw INTEGER NOT NULL DEFAULT 0,
            tags TEXT NOT NULL DEFAULT '',
            genres TEXT NOT NULL DEFAULT '[]'
        )
        "#,
        table
    );
    sqlx::query(&sql).execute(pool).await?;

    Ok(())
}

async fn create_reconcile_runs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reconcile_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NOT NULL,
            report TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    ensure_setting(pool, "db_max_lock_wait_ms", &DEFAULT_MAX_LOCK_WAIT_MS.to_string()).await?;
    Ok(())
}

/// Insert a setting if it is missing or NULL; existing values are kept
async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value) VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        WHERE settings.value IS NULL
        "#,
    )
    .bind(key)
    .bind(default_value)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn table_names(pool: &SqlitePool) -> Vec<String> {
        sqlx::query_scalar::<_, String>(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(pool)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_memory_database_has_schema() {
        let pool = init_memory_database().await.unwrap();
        let tables = table_names(&pool).await;

        for expected in [
            "active_entries",
            "archived_entries",
            "catalog_ids",
            "pending_submissions",
            "reconcile_runs",
            "settings",
        ] {
            assert!(tables.contains(&expected.to_string()), "missing table {}", expected);
        }
    }

    #[tokio::test]
    async fn test_catalog_ids_rejects_unknown_collection() {
        let pool = init_memory_database().await.unwrap();
        let result = sqlx::query("INSERT INTO catalog_ids (external_id, collection) VALUES (1, 'limbo')")
            .execute(&pool)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_init_database_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("bmcat.db");

        let pool = init_database(&db_path).await.unwrap();
        sqlx::query("UPDATE settings SET value = '9000' WHERE key = 'db_max_lock_wait_ms'")
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;

        let pool = init_database(&db_path).await.unwrap();
        let value: String =
            sqlx::query_scalar("SELECT value FROM settings WHERE key = 'db_max_lock_wait_ms'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(value, "9000");
    }
}
