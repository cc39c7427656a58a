//! Pending submissions awaiting moderation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::ExternalId;

/// Moderation status of a pending submission.
///
/// `Denied` is terminal; the record stays in the pending store so the same
/// id cannot be resubmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    Awaiting,
    Denied,
}

impl ModerationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ModerationStatus::Awaiting => "awaiting",
            ModerationStatus::Denied => "denied",
        }
    }
}

impl FromStr for ModerationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "awaiting" => Ok(ModerationStatus::Awaiting),
            "denied" => Ok(ModerationStatus::Denied),
            other => Err(format!("unknown moderation status '{}'", other)),
        }
    }
}

/// A user-submitted beatmap set reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSubmission {
    pub id: ExternalId,
    /// Stable reference to the submitting user account
    pub submitter: String,
    /// Genres proposed by the submitter; carried into the catalog once on approval
    #[serde(default)]
    pub suggested_genres: Vec<String>,
    pub status: ModerationStatus,
    pub created_at: DateTime<Utc>,
}

impl PendingSubmission {
    pub fn new(id: ExternalId, submitter: String, suggested_genres: Vec<String>) -> Self {
        Self {
            id,
            submitter,
            suggested_genres,
            status: ModerationStatus::Awaiting,
            created_at: Utc::now(),
        }
    }

    pub fn is_awaiting(&self) -> bool {
        self.status == ModerationStatus::Awaiting
    }
}
