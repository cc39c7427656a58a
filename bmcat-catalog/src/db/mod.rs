//! Database access for bmcat-catalog
//!
//! The schema itself lives in `bmcat_common::db`.

pub mod runs;
pub mod snapshot;
pub mod store;

pub use store::{CatalogCounts, Record, StorePartition};
