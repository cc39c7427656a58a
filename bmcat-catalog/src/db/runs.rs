//! Reconciliation run history

use sqlx::SqlitePool;

use crate::error::CatalogResult;
use crate::models::RunReport;

/// Persist a finished run report
pub async fn save_run_report(pool: &SqlitePool, report: &RunReport) -> CatalogResult<()> {
    let body = serde_json::to_string(report)?;
    let finished_at = report.finished_at.unwrap_or_else(chrono::Utc::now);

    sqlx::query("INSERT INTO reconcile_runs (started_at, finished_at, report) VALUES (?, ?, ?)")
        .bind(report.started_at.to_rfc3339())
        .bind(finished_at.to_rfc3339())
        .bind(&body)
        .execute(pool)
        .await?;

    Ok(())
}

/// Most recently finished run, if any
pub async fn load_last_run_report(pool: &SqlitePool) -> CatalogResult<Option<RunReport>> {
    let body: Option<String> =
        sqlx::query_scalar("SELECT report FROM reconcile_runs ORDER BY run_id DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(body.map(|b| serde_json::from_str(&b)).transpose()?)
}
