//! Two devices sharing one remote collection.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{at, complete_draft, date, foreign_record};
use goalsync_lib::db::{
    GoalCategory, GoalDraft, GoalMetrics, GoalPatch, MemoryEngine, RecordStore,
};
use goalsync_lib::error::RemoteSyncFailure;
use goalsync_lib::goals::GoalsController;
use goalsync_lib::stats::DEFAULT_EXERCISE_GOAL_MINUTES;
use goalsync_lib::sync::{
    DocumentPath, MemoryRemoteStore, PullOutcome, SyncAdapter, SyncState, DEFAULT_REMOTE_TIMEOUT,
};
use goalsync_lib::utils::fixed_clock;

struct Device {
    store: Arc<RecordStore>,
    sync: Arc<SyncAdapter>,
    controller: GoalsController,
}

async fn device(remote: Arc<MemoryRemoteStore>, hour: u32, timeout: Duration) -> Device {
    let clock = fixed_clock(at(2024, 3, 6, hour));
    let store = Arc::new(RecordStore::new(Arc::new(MemoryEngine::new())));
    store.set_active_partition("u1").unwrap();
    let sync = Arc::new(SyncAdapter::new(
        Arc::clone(&store),
        remote,
        timeout,
        Arc::clone(&clock),
    ));
    let controller = GoalsController::new(
        Arc::clone(&store),
        Arc::clone(&sync),
        clock,
        DEFAULT_EXERCISE_GOAL_MINUTES,
    );
    controller.load().await.unwrap();
    controller.set_user(Some("u1".into())).await;
    Device {
        store,
        sync,
        controller,
    }
}

#[tokio::test]
async fn later_edit_on_another_device_wins_after_pull() {
    let remote = Arc::new(MemoryRemoteStore::new());
    let today = date(2024, 3, 6);

    let phone = device(remote.clone(), 9, DEFAULT_REMOTE_TIMEOUT).await;
    phone.controller.add_goal(complete_draft(today)).await.unwrap();
    phone.controller.wait_for_push().await;
    assert!(remote.document(&DocumentPath::daily_goal("u1", today)).is_some());

    let laptop = device(remote.clone(), 15, DEFAULT_REMOTE_TIMEOUT).await;
    let outcome = laptop.sync.pull_and_merge("u1").await.unwrap();
    assert!(outcome.is_merged());
    laptop.controller.replace_goals(outcome.into_goals()).await;
    let pulled = laptop.controller.get_goal_by_date(today).await.unwrap();
    assert_eq!(laptop.sync.ledger().state(today), SyncState::Synced);

    laptop
        .controller
        .update_goal(&pulled.id, GoalPatch::default().set(GoalCategory::Diet, false))
        .await
        .unwrap();
    laptop.controller.wait_for_push().await;

    let outcome = phone.sync.pull_and_merge("u1").await.unwrap();
    phone.controller.replace_goals(outcome.into_goals()).await;
    let merged = phone.controller.get_goal_by_date(today).await.unwrap();
    assert!(!merged.diet);
    assert_eq!(merged.id, pulled.id);
    assert_eq!(phone.sync.ledger().state(today), SyncState::MergedRemote);
    assert_eq!(phone.controller.get_current_streak().await, 0);
}

#[tokio::test]
async fn offline_pull_returns_local_goals_untouched() {
    let remote = Arc::new(MemoryRemoteStore::new());
    let phone = device(remote.clone(), 9, DEFAULT_REMOTE_TIMEOUT).await;
    phone
        .controller
        .add_goal(complete_draft(date(2024, 3, 5)))
        .await
        .unwrap();

    remote.set_offline(true);
    match phone.sync.pull_and_merge("u1").await.unwrap() {
        PullOutcome::LocalOnly { goals, reason } => {
            assert_eq!(goals.len(), 1);
            assert!(matches!(reason, RemoteSyncFailure::Unavailable(_)));
        }
        other => panic!("expected local-only outcome, got {other:?}"),
    }
    assert_eq!(phone.store.get_daily_goals().await.unwrap().len(), 1);
}

#[tokio::test]
async fn slow_remote_times_out_and_commits_nothing() {
    let remote = Arc::new(MemoryRemoteStore::new());
    let today = date(2024, 3, 6);
    remote.put_raw(
        &DocumentPath::daily_goal("u1", today),
        serde_json::to_value(foreign_record(today, "2024-03-06T23:00:00.000Z", true)).unwrap(),
    );
    remote.set_latency(Duration::from_millis(500));

    let phone = device(remote.clone(), 9, Duration::from_millis(50)).await;
    let outcome = phone.sync.pull_and_merge("u1").await.unwrap();
    match outcome {
        PullOutcome::LocalOnly { goals, reason } => {
            assert!(goals.is_empty());
            assert!(matches!(reason, RemoteSyncFailure::Timeout(_)));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert!(phone.store.get_daily_goals().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_push_does_not_affect_local_write() {
    let remote = Arc::new(MemoryRemoteStore::new());
    remote.set_offline(true);
    let today = date(2024, 3, 6);

    let phone = device(remote.clone(), 9, DEFAULT_REMOTE_TIMEOUT).await;
    phone.controller.add_goal(complete_draft(today)).await.unwrap();
    phone.controller.wait_for_push().await;

    assert!(remote.is_empty());
    assert_eq!(phone.store.get_daily_goals().await.unwrap().len(), 1);
    assert_eq!(phone.sync.ledger().state(today), SyncState::LocalOnly);
}

#[tokio::test]
async fn malformed_remote_documents_are_skipped() {
    let remote = Arc::new(MemoryRemoteStore::new());
    remote.put_raw(
        &DocumentPath::daily_goal("u1", date(2024, 3, 1)),
        serde_json::json!({ "unexpected": true }),
    );
    let good_day = date(2024, 3, 2);
    remote.put_raw(
        &DocumentPath::daily_goal("u1", good_day),
        serde_json::to_value(foreign_record(good_day, "2024-03-02T10:00:00.000Z", true)).unwrap(),
    );

    let phone = device(remote, 9, DEFAULT_REMOTE_TIMEOUT).await;
    let outcome = phone.sync.pull_and_merge("u1").await.unwrap();
    let goals = outcome.into_goals();
    assert_eq!(goals.len(), 1);
    assert_eq!(goals[0].date, good_day);
}

#[tokio::test]
async fn cleared_metric_and_note_do_not_come_back_on_pull() {
    let remote = Arc::new(MemoryRemoteStore::new());
    let today = date(2024, 3, 6);

    let phone = device(remote.clone(), 9, DEFAULT_REMOTE_TIMEOUT).await;
    let mut draft = GoalDraft::new(today)
        .check(GoalCategory::Exercise)
        .with_metrics(GoalMetrics {
            exercise_minutes: Some(40.0),
            ..GoalMetrics::default()
        });
    draft.notes = Some("private note".into());
    let record = phone.controller.add_goal(draft).await.unwrap();
    phone.controller.wait_for_push().await;

    let patch = GoalPatch {
        notes: Some(String::new()),
        ..GoalPatch::default()
    }
    .set(GoalCategory::Exercise, false);
    phone.controller.update_goal(&record.id, patch).await.unwrap();
    phone.controller.wait_for_push().await;

    let document = remote
        .document(&DocumentPath::daily_goal("u1", today))
        .unwrap();
    assert_eq!(document["exercise"], false);
    assert!(document.get("exerciseMinutes").is_none());
    assert!(document.get("notes").is_none());

    let laptop = device(remote.clone(), 15, DEFAULT_REMOTE_TIMEOUT).await;
    let goals = laptop.sync.pull_and_merge("u1").await.unwrap().into_goals();
    assert_eq!(goals.len(), 1);
    assert!(!goals[0].exercise);
    assert_eq!(goals[0].exercise_minutes, None);
    assert_eq!(goals[0].notes, None);
    assert_eq!(goals[0], phone.controller.get_goal_by_date(today).await.unwrap());
}
