//! Catalog search over active entries
//!
//! The `q` parameter is split on whitespace. Each term is one of:
//! - `id=1,2,3`, `creator=name`, `status=label`, `star=4.5`
//! - `star>4` / `star<6` (only when `star_min` / `star_max` are not given)
//! - anything else: free text, matched case-insensitively against uploader
//!   username, artist, title, tags and status. Any free-text term may match.

use serde::{Deserialize, Serialize};

use crate::models::{CatalogEntry, ExternalId};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;
/// `star_max` values at or above this mean "no upper bound"
const STAR_MAX_CEILING: f64 = 12.0;
/// Star ratings are displayed with two decimals
const STAR_EPSILON: f64 = 0.005;

/// `GET /search` query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    /// Comma-separated mode codes
    pub mode: Option<String>,
    /// Comma-separated genres, any may match
    pub genres: Option<String>,
    /// NSFW entries are included only for `true`
    pub nsfw: Option<String>,
    pub star_min: Option<f64>,
    pub star_max: Option<f64>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub total_count: usize,
    pub page: usize,
    pub limit: usize,
    pub entries: Vec<CatalogEntry>,
}

/// Parsed form of [`SearchParams`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilter {
    ids: Option<Vec<ExternalId>>,
    creator: Option<String>,
    status: Option<String>,
    star_exact: Option<f64>,
    star_min: Option<f64>,
    star_max: Option<f64>,
    free_text: Vec<String>,
    modes: Option<Vec<u8>>,
    genres: Option<Vec<String>>,
    include_nsfw: bool,
}

impl SearchFilter {
    pub fn from_params(params: &SearchParams) -> Self {
        let mut filter = SearchFilter {
            star_min: params.star_min,
            star_max: params.star_max.filter(|max| *max < STAR_MAX_CEILING),
            include_nsfw: params.nsfw.as_deref() == Some("true"),
            ..Default::default()
        };

        for term in params.q.as_deref().unwrap_or_default().split_whitespace() {
            filter.apply_term(term);
        }

        filter.modes = params.mode.as_deref().map(|raw| {
            raw.split(',')
                .filter_map(|code| code.trim().parse::<u8>().ok())
                .collect()
        });

        filter.genres = params
            .genres
            .as_deref()
            .map(|raw| crate::models::normalize_genres(raw.split(',')))
            .filter(|genres| !genres.is_empty());

        filter
    }

    fn apply_term(&mut self, term: &str) {
        if let Some((key, value)) = term.split_once('=') {
            match key {
                "id" => {
                    self.ids = Some(
                        value
                            .split(',')
                            .filter_map(|raw| raw.trim().parse::<i64>().ok())
                            .filter_map(ExternalId::new)
                            .collect(),
                    )
                }
                "creator" => self.creator = Some(value.to_lowercase()),
                "status" => self.status = Some(value.to_lowercase()),
                "star" => self.star_exact = value.parse().ok(),
                _ => {}
            }
        } else if let Some((key, value)) = term.split_once('>') {
            if key == "star" && self.star_min.is_none() {
                self.star_min = value.parse().ok();
            }
        } else if let Some((key, value)) = term.split_once('<') {
            if key == "star" && self.star_max.is_none() {
                self.star_max = value.parse().ok();
            }
        } else {
            self.free_text.push(term.to_lowercase());
        }
    }

    pub fn matches(&self, entry: &CatalogEntry) -> bool {
        let metadata = &entry.metadata;

        if !self.include_nsfw && metadata.nsfw {
            return false;
        }
        if let Some(ids) = &self.ids {
            if !ids.contains(&entry.id) {
                return false;
            }
        }
        if let Some(creator) = &self.creator {
            if !metadata.creator.to_lowercase().contains(creator) {
                return false;
            }
        }
        if let Some(status) = &self.status {
            if !metadata.status.to_lowercase().contains(status) {
                return false;
            }
        }
        if !self.free_text.is_empty() {
            let haystacks = [
                metadata.uploader_username.as_deref().unwrap_or_default().to_lowercase(),
                metadata.artist.to_lowercase(),
                metadata.title.to_lowercase(),
                metadata.tags.to_lowercase(),
                metadata.status.to_lowercase(),
            ];
            let hit = self
                .free_text
                .iter()
                .any(|term| haystacks.iter().any(|h| h.contains(term.as_str())));
            if !hit {
                return false;
            }
        }
        if let Some(genres) = &self.genres {
            if !entry.genres.iter().any(|g| genres.contains(g)) {
                return false;
            }
        }

        let difficulties = &metadata.difficulties;

        if let Some(modes) = &self.modes {
            if !difficulties.iter().any(|d| modes.contains(&u8::from(d.mode))) {
                return false;
            }
        }
        if let Some(star) = self.star_exact {
            if !difficulties.iter().any(|d| (d.stars - star).abs() < STAR_EPSILON) {
                return false;
            }
        }
        if self.star_min.is_some() || self.star_max.is_some() {
            let in_range = difficulties.iter().any(|d| {
                self.star_min.map_or(true, |min| d.stars >= min)
                    && self.star_max.map_or(true, |max| d.stars <= max)
            });
            if !in_range {
                return false;
            }
        }

        true
    }
}

/// Filter and paginate `entries` (already in display order)
pub fn search(entries: Vec<CatalogEntry>, params: &SearchParams) -> SearchResults {
    let filter = SearchFilter::from_params(params);
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    let matched: Vec<CatalogEntry> = entries.into_iter().filter(|e| filter.matches(e)).collect();
    let total_count = matched.len();

    let entries = matched
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .collect();

    SearchResults {
        total_count,
        page,
        limit,
        entries,
    }
}
