//! Data models for the beatmap catalog
//!
//! - Beatmap metadata and catalog entries (active and archived share one shape)
//! - Pending submissions and their moderation status
//! - Reconciliation run reports
//! - Whole-catalog snapshots for export/import

pub mod beatmap;
pub mod collection;
pub mod genres;
pub mod run_report;
pub mod snapshot;
pub mod submission;

pub use beatmap::{BeatmapMetadata, CatalogEntry, Difficulty, ExternalId, GameMode};
pub use collection::Collection;
pub use genres::normalize_genres;
pub use run_report::RunReport;
pub use snapshot::CatalogSnapshot;
pub use submission::{ModerationStatus, PendingSubmission};
