//! Beatmap set identity, provider metadata and catalog entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// osu! beatmapset id, the catalog's primary key. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct ExternalId(i64);

impl ExternalId {
    pub fn new(raw: i64) -> Option<Self> {
        (raw > 0).then_some(Self(raw))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for ExternalId {
    type Error = String;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or_else(|| format!("external id must be positive, got {}", raw))
    }
}

impl From<ExternalId> for i64 {
    fn from(id: ExternalId) -> Self {
        id.0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ruleset a difficulty is played in. Serialized as the osu! integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum GameMode {
    Standard,
    Taiko,
    Catch,
    Mania,
}

impl TryFrom<u8> for GameMode {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(GameMode::Standard),
            1 => Ok(GameMode::Taiko),
            2 => Ok(GameMode::Catch),
            3 => Ok(GameMode::Mania),
            other => Err(format!("unknown game mode {}", other)),
        }
    }
}

impl From<GameMode> for u8 {
    fn from(mode: GameMode) -> Self {
        match mode {
            GameMode::Standard => 0,
            GameMode::Taiko => 1,
            GameMode::Catch => 2,
            GameMode::Mania => 3,
        }
    }
}

/// One difficulty of a beatmap set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Difficulty {
    pub mode: GameMode,
    /// Star rating as reported by the provider
    pub stars: f64,
}

/// Provider-sourced fields of a beatmap set.
///
/// Replaced wholesale on approval, refresh and revival; never edited by
/// moderators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatmapMetadata {
    pub title: String,
    pub artist: String,
    pub creator: String,
    pub uploader_id: Option<i64>,
    pub uploader_username: Option<String>,
    pub bpm: Option<f64>,
    /// Ranking status label ("ranked", "loved", "graveyard", ...)
    pub status: String,
    #[serde(default)]
    pub difficulties: Vec<Difficulty>,
    pub last_updated: Option<DateTime<Utc>>,
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub nsfw: bool,
    #[serde(default)]
    pub tags: String,
}

/// A listed (active) or archived beatmap set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: ExternalId,
    /// Internal identifier; survives moves between collections
    pub guid: Uuid,
    #[serde(flatten)]
    pub metadata: BeatmapMetadata,
    /// Curated genres, owned by moderators after approval
    #[serde(default)]
    pub genres: Vec<String>,
}

impl CatalogEntry {
    /// New entry with a fresh internal identifier
    pub fn new(id: ExternalId, metadata: BeatmapMetadata, genres: Vec<String>) -> Self {
        Self {
            id,
            guid: Uuid::new_v4(),
            metadata,
            genres,
        }
    }

    /// Same entry with provider fields replaced; identity and genres kept
    pub fn with_metadata(self, metadata: BeatmapMetadata) -> Self {
        Self { metadata, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_external_id_rejects_non_positive() {
        assert!(ExternalId::new(0).is_none());
        assert!(ExternalId::new(-4).is_none());
        assert_eq!(ExternalId::new(42).map(ExternalId::get), Some(42));

        assert!(serde_json::from_value::<ExternalId>(json!(-1)).is_err());
        assert_eq!(serde_json::from_value::<ExternalId>(json!(7)).unwrap().get(), 7);
    }

    #[test]
    fn test_game_mode_uses_integer_codes() {
        let diff = Difficulty {
            mode: GameMode::Mania,
            stars: 4.5,
        };
        assert_eq!(serde_json::to_value(diff).unwrap(), json!({"mode": 3, "stars": 4.5}));
        assert!(serde_json::from_value::<Difficulty>(json!({"mode": 9, "stars": 1.0})).is_err());
    }

    #[test]
    fn test_catalog_entry_flattens_metadata() {
        let entry = CatalogEntry::new(
            ExternalId::new(100).unwrap(),
            BeatmapMetadata {
                title: "A".to_string(),
                artist: "B".to_string(),
                creator: "C".to_string(),
                uploader_id: Some(3),
                uploader_username: Some("C".to_string()),
                bpm: Some(180.0),
                status: "ranked".to_string(),
                difficulties: vec![],
                last_updated: None,
                thumbnail_url: None,
                nsfw: false,
                tags: String::new(),
            },
            vec!["Rock".to_string()],
        );

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["id"], 100);
        assert_eq!(value["title"], "A");
        assert_eq!(value["genres"], json!(["Rock"]));

        let back: CatalogEntry = serde_json::from_value(value).unwrap();
        assert_eq!(back, entry);
    }
}
