//! Reconciliation run report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ExternalId;

/// Outcome counters of one reconciliation run.
///
/// Every visited item lands in exactly one of `updated`, `archived`,
/// `revived`, `kept_archived` or `failed`; `processed` is their sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Items visited (active and archived)
    pub processed: usize,
    /// Active entries refreshed in place
    pub updated: usize,
    /// Active entries moved to the archive
    pub archived: usize,
    /// Archived entries moved back to active
    pub revived: usize,
    /// Archived entries still unresolvable upstream
    pub kept_archived: usize,
    pub failed: usize,
    pub failed_ids: Vec<ExternalId>,
    /// Snapshot items never visited because the run budget ran out
    pub skipped: usize,
    pub truncated: bool,
}

impl RunReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: None,
            processed: 0,
            updated: 0,
            archived: 0,
            revived: 0,
            kept_archived: 0,
            failed: 0,
            failed_ids: Vec::new(),
            skipped: 0,
            truncated: false,
        }
    }

    pub fn record_failure(&mut self, id: ExternalId) {
        self.failed += 1;
        self.failed_ids.push(id);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration, once finished
    pub fn elapsed_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_seconds())
    }
}
