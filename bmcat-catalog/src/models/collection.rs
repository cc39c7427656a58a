//! The three disjoint collections of the store partition

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where an external id currently lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Pending,
    Active,
    Archived,
}

impl Collection {
    /// Value stored in `catalog_ids.collection`
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Pending => "pending",
            Collection::Active => "active",
            Collection::Archived => "archived",
        }
    }

    /// Table holding this collection's records
    pub fn table(self) -> &'static str {
        match self {
            Collection::Pending => "pending_submissions",
            Collection::Active => "active_entries",
            Collection::Archived => "archived_entries",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Collection::Pending),
            "active" => Ok(Collection::Active),
            "archived" => Ok(Collection::Archived),
            other => Err(format!("unknown collection '{}'", other)),
        }
    }
}
