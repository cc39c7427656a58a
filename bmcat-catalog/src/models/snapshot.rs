//! Whole-catalog snapshot used by export/import

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{CatalogEntry, ExternalId, PendingSubmission};

/// Literal contents of the three collections.
///
/// All three arrays are required; a document missing any of them fails to
/// deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub pending: Vec<PendingSubmission>,
    pub active: Vec<CatalogEntry>,
    pub archived: Vec<CatalogEntry>,
}

impl CatalogSnapshot {
    /// Ids occurring more than once across (or within) the three arrays
    pub fn duplicate_ids(&self) -> Vec<ExternalId> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();

        let ids = self
            .pending
            .iter()
            .map(|p| p.id)
            .chain(self.active.iter().map(|e| e.id))
            .chain(self.archived.iter().map(|e| e.id));

        for id in ids {
            if !seen.insert(id) && !duplicates.contains(&id) {
                duplicates.push(id);
            }
        }
        duplicates
    }

    pub fn len(&self) -> usize {
        self.pending.len() + self.active.len() + self.archived.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
