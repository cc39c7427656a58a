//! Shared fixtures for bmcat-catalog integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bmcat_catalog::db::StorePartition;
use bmcat_catalog::models::{BeatmapMetadata, Collection, Difficulty, ExternalId, GameMode};
use bmcat_catalog::services::{
    FetchOutcome, LifecycleController, MetadataProvider, ReconcileSettings, Reconciler,
};

/// Provider answering from a script. Unscripted ids are transient failures.
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<HashMap<ExternalId, FetchOutcome>>,
    calls: Mutex<Vec<(ExternalId, Instant)>>,
    delay: Duration,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every fetch sleeps this long before answering
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn set(&self, raw_id: i64, outcome: FetchOutcome) {
        self.responses.lock().unwrap().insert(id(raw_id), outcome);
    }

    pub fn calls(&self) -> Vec<ExternalId> {
        self.calls.lock().unwrap().iter().map(|(id, _)| *id).collect()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }
}

#[async_trait]
impl MetadataProvider for ScriptedProvider {
    async fn fetch(&self, id: ExternalId) -> FetchOutcome {
        self.calls.lock().unwrap().push((id, Instant::now()));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .unwrap_or_else(|| FetchOutcome::Transient("unscripted".to_string()))
    }
}

pub fn id(raw: i64) -> ExternalId {
    ExternalId::new(raw).unwrap()
}

pub fn metadata(title: &str) -> BeatmapMetadata {
    BeatmapMetadata {
        title: title.to_string(),
        artist: "Artist".to_string(),
        creator: "Mapper".to_string(),
        uploader_id: Some(1),
        uploader_username: Some("Mapper".to_string()),
        bpm: Some(150.0),
        status: "ranked".to_string(),
        difficulties: vec![Difficulty {
            mode: GameMode::Standard,
            stars: 3.2,
        }],
        last_updated: None,
        thumbnail_url: None,
        nsfw: false,
        tags: String::new(),
    }
}

pub fn genres(list: &[&str]) -> Vec<String> {
    list.iter().map(|g| g.to_string()).collect()
}

pub async fn test_store() -> StorePartition {
    let pool = bmcat_common::db::init_memory_database()
        .await
        .expect("in-memory database");
    StorePartition::from_settings(pool).await.expect("store")
}

/// Reconciler without inter-call delay
pub fn fast_reconciler(lifecycle: &LifecycleController, provider: Arc<ScriptedProvider>) -> Reconciler {
    Reconciler::new(
        lifecycle.clone(),
        provider,
        ReconcileSettings {
            inter_call_delay: Duration::ZERO,
            max_run_duration: None,
            max_items: None,
        },
    )
}

/// Put `raw_id` straight into the active collection via submit + approve
pub async fn seed_active(lifecycle: &LifecycleController, raw_id: i64, title: &str, genre_list: &[&str]) {
    lifecycle
        .submit(id(raw_id), "seeder", genres(genre_list))
        .await
        .unwrap();
    lifecycle
        .approve(id(raw_id), metadata(title), None)
        .await
        .unwrap();
}

/// Collections holding `raw_id`, checked table by table
pub async fn collections_holding(store: &StorePartition, raw_id: i64) -> Vec<Collection> {
    let mut found = Vec::new();
    if store.get_pending(id(raw_id)).await.unwrap().is_some() {
        found.push(Collection::Pending);
    }
    for collection in [Collection::Active, Collection::Archived] {
        if store.get_entry(collection, id(raw_id)).await.unwrap().is_some() {
            found.push(collection);
        }
    }
    found
}
