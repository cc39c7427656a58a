//! Reconciliation job: transitions, partial failure, single flight, budget

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bmcat_catalog::models::{Collection, ExternalId};
use bmcat_catalog::services::{
    FetchOutcome, LifecycleController, MetadataProvider, ReconcileError, ReconcileSettings,
    Reconciler,
};
use helpers::*;

async fn setup() -> (LifecycleController, Arc<ScriptedProvider>) {
    (LifecycleController::new(test_store().await), Arc::new(ScriptedProvider::new()))
}

#[tokio::test]
async fn test_submit_approve_archive_revive_scenario() {
    let (lifecycle, provider) = setup().await;
    let reconciler = fast_reconciler(&lifecycle, provider.clone());

    lifecycle.submit(id(100), "user-1", genres(&["Rock"])).await.unwrap();
    lifecycle.approve(id(100), metadata("A"), None).await.unwrap();

    let entry = lifecycle.get_active(id(100)).await.unwrap();
    assert_eq!(entry.genres, genres(&["Rock"]));
    assert_eq!(entry.metadata.difficulties[0].stars, 3.2);

    provider.set(100, FetchOutcome::NotFound);
    let report = reconciler.run().await.unwrap();
    assert_eq!(report.archived, 1);

    let archived = lifecycle
        .store()
        .get_entry(Collection::Archived, id(100))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(archived.genres, genres(&["Rock"]));
    assert_eq!(archived.metadata.title, "A");

    provider.set(100, FetchOutcome::Resolved(metadata("A2")));
    let report = reconciler.run().await.unwrap();
    assert_eq!(report.revived, 1);

    let revived = lifecycle.get_active(id(100)).await.unwrap();
    assert_eq!(revived.metadata.title, "A2");
    assert_eq!(revived.genres, genres(&["Rock"]));
    assert_eq!(revived.guid, entry.guid);
}

#[tokio::test]
async fn test_transient_failures_do_not_stop_the_run() {
    let (lifecycle, provider) = setup().await;
    for raw in 1..=5 {
        seed_active(&lifecycle, raw, &format!("old-{}", raw), &[]).await;
    }
    provider.set(1, FetchOutcome::Resolved(metadata("new-1")));
    provider.set(2, FetchOutcome::Resolved(metadata("new-2")));
    provider.set(3, FetchOutcome::NotFound);
    provider.set(4, FetchOutcome::Transient("timeout".to_string()));
    // 5 is unscripted: transient

    let report = fast_reconciler(&lifecycle, provider.clone()).run().await.unwrap();

    assert_eq!(report.processed, 5);
    assert_eq!(report.updated, 2);
    assert_eq!(report.archived, 1);
    assert_eq!(report.failed, 2);
    assert_eq!(report.updated + report.archived + report.failed, 5);
    assert_eq!(report.failed_ids, vec![id(4), id(5)]);
    assert!(!report.truncated);
    assert!(report.finished_at.is_some());

    for raw in [4, 5] {
        let entry = lifecycle.get_active(id(raw)).await.unwrap();
        assert_eq!(entry.metadata.title, format!("old-{}", raw));
    }
    assert_eq!(lifecycle.get_active(id(1)).await.unwrap().metadata.title, "new-1");
    assert_eq!(
        lifecycle.store().exists(id(3)).await.unwrap(),
        Some(Collection::Archived)
    );
}

#[tokio::test]
async fn test_archived_items_revive_or_stay() {
    let (lifecycle, provider) = setup().await;
    for raw in 1..=3 {
        seed_active(&lifecycle, raw, "t", &["Pop"]).await;
        lifecycle.archive(id(raw)).await.unwrap();
    }
    provider.set(1, FetchOutcome::Resolved(metadata("back")));
    provider.set(2, FetchOutcome::NotFound);

    let report = fast_reconciler(&lifecycle, provider).run().await.unwrap();

    assert_eq!(report.revived, 1);
    assert_eq!(report.kept_archived, 1);
    assert_eq!(report.failed_ids, vec![id(3)]);
    assert_eq!(lifecycle.get_active(id(1)).await.unwrap().genres, genres(&["Pop"]));
    for raw in [2, 3] {
        assert_eq!(
            lifecycle.store().exists(id(raw)).await.unwrap(),
            Some(Collection::Archived)
        );
    }
}

#[tokio::test]
async fn test_active_items_are_visited_before_archived() {
    let (lifecycle, provider) = setup().await;
    seed_active(&lifecycle, 1, "t", &[]).await;
    lifecycle.archive(id(1)).await.unwrap();
    seed_active(&lifecycle, 2, "t", &[]).await;
    seed_active(&lifecycle, 3, "t", &[]).await;

    fast_reconciler(&lifecycle, provider.clone()).run().await.unwrap();

    assert_eq!(provider.calls(), vec![id(2), id(3), id(1)]);
}

#[tokio::test]
async fn test_pending_submissions_are_not_reconciled() {
    let (lifecycle, provider) = setup().await;
    lifecycle.submit(id(1), "user", vec![]).await.unwrap();

    let report = fast_reconciler(&lifecycle, provider.clone()).run().await.unwrap();

    assert_eq!(report.processed, 0);
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_second_run_is_rejected_while_first_is_in_flight() {
    let lifecycle = LifecycleController::new(test_store().await);
    let provider = Arc::new(ScriptedProvider::with_delay(Duration::from_millis(300)));
    seed_active(&lifecycle, 1, "t", &[]).await;
    provider.set(1, FetchOutcome::Resolved(metadata("t2")));

    let reconciler = Arc::new(fast_reconciler(&lifecycle, provider.clone()));

    let first = {
        let reconciler = reconciler.clone();
        tokio::spawn(async move { reconciler.run().await })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(reconciler.is_running());
    assert!(matches!(
        reconciler.run().await,
        Err(ReconcileError::AlreadyRunning)
    ));

    let report = first.await.unwrap().unwrap();
    assert_eq!(report.updated, 1);
    assert!(!reconciler.is_running());

    // Lock released: a new run may start
    assert!(reconciler.run().await.is_ok());
    assert_eq!(provider.calls().len(), 2);
}

#[tokio::test]
async fn test_guard_from_another_reconciler_is_refused() {
    let (lifecycle, provider) = setup().await;
    seed_active(&lifecycle, 1, "t", &[]).await;

    let first = fast_reconciler(&lifecycle, provider.clone());
    let second = fast_reconciler(&lifecycle, provider.clone());

    let guard = first.try_acquire().unwrap();
    assert!(matches!(
        second.run_locked(guard).await,
        Err(ReconcileError::ForeignGuard)
    ));
    assert!(provider.calls().is_empty());
    assert!(!first.is_running());

    let guard = second.try_acquire().unwrap();
    assert!(second.run_locked(guard).await.is_ok());
}

#[tokio::test]
async fn test_item_budget_truncates_and_counts_skipped() {
    let (lifecycle, provider) = setup().await;
    for raw in 1..=5 {
        seed_active(&lifecycle, raw, "t", &[]).await;
        provider.set(raw, FetchOutcome::Resolved(metadata("u")));
    }

    let reconciler = Reconciler::new(
        lifecycle.clone(),
        provider.clone(),
        ReconcileSettings {
            inter_call_delay: Duration::ZERO,
            max_run_duration: None,
            max_items: Some(2),
        },
    );
    let report = reconciler.run().await.unwrap();

    assert!(report.truncated);
    assert_eq!(report.processed, 2);
    assert_eq!(report.skipped, 3);
    assert_eq!(provider.calls(), vec![id(1), id(2)]);
}

#[tokio::test]
async fn test_exhausted_duration_visits_nothing() {
    let (lifecycle, provider) = setup().await;
    seed_active(&lifecycle, 1, "t", &[]).await;
    seed_active(&lifecycle, 2, "t", &[]).await;

    let reconciler = Reconciler::new(
        lifecycle.clone(),
        provider.clone(),
        ReconcileSettings {
            inter_call_delay: Duration::ZERO,
            max_run_duration: Some(Duration::ZERO),
            max_items: None,
        },
    );
    let report = reconciler.run().await.unwrap();

    assert!(report.truncated);
    assert_eq!(report.processed, 0);
    assert_eq!(report.skipped, 2);
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_provider_calls_are_spaced() {
    let (lifecycle, provider) = setup().await;
    for raw in 1..=3 {
        seed_active(&lifecycle, raw, "t", &[]).await;
    }

    let reconciler = Reconciler::new(
        lifecycle.clone(),
        provider.clone(),
        ReconcileSettings {
            inter_call_delay: Duration::from_millis(100),
            max_run_duration: None,
            max_items: None,
        },
    );
    reconciler.run().await.unwrap();

    let times = provider.call_times();
    assert_eq!(times.len(), 3);
    for pair in times.windows(2) {
        assert!(pair[1].duration_since(pair[0]) >= Duration::from_millis(95));
    }
}

#[tokio::test]
async fn test_report_is_persisted() {
    let (lifecycle, provider) = setup().await;
    seed_active(&lifecycle, 1, "t", &[]).await;
    let reconciler = fast_reconciler(&lifecycle, provider);

    assert!(reconciler.last_report().await.unwrap().is_none());
    let report = reconciler.run().await.unwrap();
    assert_eq!(reconciler.last_report().await.unwrap(), Some(report));
}

#[tokio::test]
async fn test_unreadable_store_fails_the_run() {
    let (lifecycle, provider) = setup().await;
    let reconciler = fast_reconciler(&lifecycle, provider);

    lifecycle.store().pool().close().await;

    assert!(matches!(
        reconciler.run().await,
        Err(ReconcileError::Snapshot(_))
    ));
    assert!(!reconciler.is_running());
}

/// Archives the entry behind the reconciler's back, then resolves it
struct InterferingProvider {
    lifecycle: LifecycleController,
}

#[async_trait]
impl MetadataProvider for InterferingProvider {
    async fn fetch(&self, id: ExternalId) -> FetchOutcome {
        if id.get() == 1 {
            self.lifecycle.archive(id).await.unwrap();
        }
        FetchOutcome::Resolved(metadata("fresh"))
    }
}

#[tokio::test]
async fn test_store_error_on_one_item_is_recorded() {
    let lifecycle = LifecycleController::new(test_store().await);
    seed_active(&lifecycle, 1, "t", &[]).await;
    seed_active(&lifecycle, 2, "t", &[]).await;

    let reconciler = Reconciler::new(
        lifecycle.clone(),
        Arc::new(InterferingProvider {
            lifecycle: lifecycle.clone(),
        }),
        ReconcileSettings {
            inter_call_delay: Duration::ZERO,
            max_run_duration: None,
            max_items: None,
        },
    );
    let report = reconciler.run().await.unwrap();

    assert_eq!(report.failed_ids, vec![id(1)]);
    assert_eq!(report.updated, 1);
    assert_eq!(lifecycle.get_active(id(2)).await.unwrap().metadata.title, "fresh");
}
