//! osu! API v2 client
//!
//! Client-credentials OAuth token, cached until shortly before it expires,
//! then `GET /api/v2/beatmapsets/{id}` normalized into [`BeatmapMetadata`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

use super::provider::{FetchOutcome, MetadataProvider};
use crate::models::{BeatmapMetadata, Difficulty, ExternalId, GameMode};

pub const OSU_BASE_URL: &str = "https://osu.ppy.sh";
const USER_AGENT: &str = concat!("bmcat/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Tokens are renewed this long before the provider says they expire
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// osu! client errors
#[derive(Debug, Error)]
pub enum OsuError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Beatmap set not found: {0}")]
    NotFound(ExternalId),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// OAuth client credentials
#[derive(Debug, Clone)]
pub struct OsuCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Lifetime in seconds
    expires_in: u64,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + TOKEN_EXPIRY_MARGIN < self.expires_at
    }
}

/// `GET /api/v2/beatmapsets/{id}` response, only the fields we keep
#[derive(Debug, Clone, Deserialize)]
pub struct OsuBeatmapset {
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub creator: String,
    pub user_id: Option<i64>,
    pub bpm: Option<f64>,
    pub status: String,
    #[serde(default)]
    pub beatmaps: Vec<OsuBeatmap>,
    pub last_updated: Option<DateTime<Utc>>,
    pub covers: Option<OsuCovers>,
    #[serde(default)]
    pub nsfw: bool,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub related_users: Vec<OsuUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OsuBeatmap {
    pub mode_int: u8,
    pub difficulty_rating: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OsuCovers {
    pub card: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OsuUser {
    pub id: i64,
    pub username: String,
}

impl OsuBeatmapset {
    /// Normalize into catalog metadata
    pub fn into_metadata(self) -> BeatmapMetadata {
        let uploader_username = self.user_id.and_then(|uid| {
            self.related_users
                .iter()
                .find(|user| user.id == uid)
                .map(|user| user.username.clone())
        });

        let difficulties = self
            .beatmaps
            .iter()
            .filter_map(|beatmap| match GameMode::try_from(beatmap.mode_int) {
                Ok(mode) => Some(Difficulty {
                    mode,
                    stars: beatmap.difficulty_rating,
                }),
                Err(e) => {
                    tracing::warn!(beatmapset = self.id, error = %e, "Skipping difficulty");
                    None
                }
            })
            .collect();

        BeatmapMetadata {
            title: self.title,
            artist: self.artist,
            creator: self.creator,
            uploader_id: self.user_id,
            uploader_username,
            bpm: self.bpm,
            status: self.status,
            difficulties,
            last_updated: self.last_updated,
            thumbnail_url: self.covers.and_then(|covers| covers.card),
            nsfw: self.nsfw,
            tags: self.tags,
        }
    }
}

/// osu! API client
pub struct OsuClient {
    http_client: reqwest::Client,
    base_url: String,
    credentials: OsuCredentials,
    token: Mutex<Option<CachedToken>>,
}

impl OsuClient {
    pub fn new(credentials: OsuCredentials, base_url: Option<String>) -> Result<Self, OsuError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| OsuError::Network(e.to_string()))?;

        let base_url = base_url
            .unwrap_or_else(|| OSU_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            http_client,
            base_url,
            credentials,
            token: Mutex::new(None),
        })
    }

    /// Cached access token, requesting a new one when missing or stale
    async fn access_token(&self) -> Result<String, OsuError> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.access_token.clone());
        }

        let url = format!("{}/oauth/token", self.base_url);
        tracing::debug!(url = %url, "Requesting osu! access token");

        let response = self
            .http_client
            .post(&url)
            .json(&serde_json::json!({
                "client_id": self.credentials.client_id,
                "client_secret": self.credentials.client_secret,
                "grant_type": "client_credentials",
                "scope": "public",
            }))
            .send()
            .await
            .map_err(|e| OsuError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(OsuError::Auth(format!("{}: {}", status.as_u16(), error_text)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| OsuError::Parse(e.to_string()))?;

        let access_token = token.access_token.clone();
        *cached = Some(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });

        tracing::info!(expires_in = token.expires_in, "Obtained osu! access token");
        Ok(access_token)
    }

    async fn drop_token(&self) {
        *self.token.lock().await = None;
    }

    /// Look up one beatmap set
    pub async fn lookup_beatmapset(&self, id: ExternalId) -> Result<OsuBeatmapset, OsuError> {
        let token = self.access_token().await?;
        let url = format!("{}/api/v2/beatmapsets/{}", self.base_url, id);

        tracing::debug!(id = %id, url = %url, "Querying osu! API");

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| OsuError::Network(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(OsuError::NotFound(id));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.drop_token().await;
            return Err(OsuError::Auth("access token rejected".to_string()));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(OsuError::Api(status.as_u16(), error_text));
        }

        let beatmapset: OsuBeatmapset = response
            .json()
            .await
            .map_err(|e| OsuError::Parse(e.to_string()))?;

        tracing::debug!(
            id = %id,
            title = %beatmapset.title,
            artist = %beatmapset.artist,
            "Retrieved beatmap set from osu!"
        );

        Ok(beatmapset)
    }
}

#[async_trait]
impl MetadataProvider for OsuClient {
    async fn fetch(&self, id: ExternalId) -> FetchOutcome {
        match self.lookup_beatmapset(id).await {
            Ok(beatmapset) => FetchOutcome::Resolved(beatmapset.into_metadata()),
            Err(OsuError::NotFound(_)) => FetchOutcome::NotFound,
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "osu! lookup failed");
                FetchOutcome::Transient(e.to_string())
            }
        }
    }
}
