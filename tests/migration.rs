//! Legacy key restructuring against storage that already holds data.

mod common;

use std::sync::Arc;

use common::{date, foreign_record, read_goals, write_json, FlakyEngine};
use goalsync_lib::db::{resolve_key, KvEngine, LogicalKey, MemoryEngine, RecordStore};
use goalsync_lib::error::MigrationStage;
use goalsync_lib::profile::{MigrationOutcome, MigrationService};

fn goals_key(user: &str) -> String {
    resolve_key(user, LogicalKey::DailyGoals).unwrap()
}

#[tokio::test]
async fn legacy_goals_merge_into_existing_partition() {
    let engine = Arc::new(MemoryEngine::new());
    let shared = date(2024, 3, 4);

    let legacy = vec![
        foreign_record(shared, "2024-03-04T20:00:00.000Z", true),
        foreign_record(date(2024, 3, 3), "2024-03-03T20:00:00.000Z", true),
    ];
    let partitioned = vec![foreign_record(shared, "2024-03-04T08:00:00.000Z", false)];
    write_json(engine.as_ref(), LogicalKey::DailyGoals.legacy_key(), &legacy).await;
    write_json(engine.as_ref(), &goals_key("u1"), &partitioned).await;
    engine
        .set(LogicalKey::Articles.legacy_key(), b"[]".to_vec())
        .await
        .unwrap();

    let service = MigrationService::new(Arc::new(RecordStore::new(engine.clone())));
    let outcome = service.run("u1").await.unwrap();
    assert_eq!(outcome, MigrationOutcome::Migrated { copied: 2 });

    let merged = read_goals(engine.as_ref(), &goals_key("u1")).await.unwrap();
    assert_eq!(merged.len(), 2);
    let shared_record = merged.iter().find(|goal| goal.date == shared).unwrap();
    assert!(shared_record.exercise, "newer legacy edit should win");

    for logical in LogicalKey::USER_DATA {
        assert!(engine.get(logical.legacy_key()).await.unwrap().is_none());
    }
    let marker = resolve_key("u1", LogicalKey::MigrationMarker).unwrap();
    assert_eq!(engine.get(&marker).await.unwrap(), Some(b"true".to_vec()));

    assert_eq!(service.run("u1").await.unwrap(), MigrationOutcome::NotNeeded);
}

#[tokio::test]
async fn failed_cleanup_leaves_legacy_data_and_no_marker() {
    let engine = FlakyEngine::new();
    let legacy = vec![foreign_record(date(2024, 3, 3), "2024-03-03T20:00:00.000Z", true)];
    write_json(engine.as_ref(), LogicalKey::DailyGoals.legacy_key(), &legacy).await;

    let service = MigrationService::new(Arc::new(RecordStore::new(engine.clone())));
    engine.fail_deletes(true);
    let failure = service.run("u1").await.unwrap_err();
    assert_eq!(failure.stage, MigrationStage::Cleanup);

    assert_eq!(
        read_goals(engine.as_ref(), LogicalKey::DailyGoals.legacy_key()).await,
        Some(legacy.clone())
    );
    let marker = resolve_key("u1", LogicalKey::MigrationMarker).unwrap();
    assert!(engine.get(&marker).await.unwrap().is_none());

    // A retry after the fault clears completes without duplicating records.
    engine.fail_deletes(false);
    let outcome = service.run("u1").await.unwrap();
    assert!(matches!(outcome, MigrationOutcome::Migrated { .. }));
    let migrated = read_goals(engine.as_ref(), &goals_key("u1")).await.unwrap();
    assert_eq!(migrated, legacy);
}

#[tokio::test]
async fn failed_copy_reports_copy_stage() {
    let engine = FlakyEngine::new();
    let legacy = vec![foreign_record(date(2024, 3, 3), "2024-03-03T20:00:00.000Z", true)];
    write_json(engine.as_ref(), LogicalKey::DailyGoals.legacy_key(), &legacy).await;

    let service = MigrationService::new(Arc::new(RecordStore::new(engine.clone())));
    engine.fail_writes(true);
    let failure = service.run("u1").await.unwrap_err();
    assert_eq!(failure.stage, MigrationStage::Copy);

    let status = service.status("u1").await.unwrap();
    assert!(status.has_legacy_data);
    assert_eq!(status.migrated_key_count, 0);
    assert!(!status.marker_present);
}

#[tokio::test]
async fn rollback_restores_legacy_keys() {
    let engine = Arc::new(MemoryEngine::new());
    let legacy = vec![foreign_record(date(2024, 3, 3), "2024-03-03T20:00:00.000Z", true)];
    write_json(engine.as_ref(), LogicalKey::DailyGoals.legacy_key(), &legacy).await;

    let service = MigrationService::new(Arc::new(RecordStore::new(engine.clone())));
    service.run("u1").await.unwrap();
    service.rollback("u1").await.unwrap();

    assert_eq!(
        read_goals(engine.as_ref(), LogicalKey::DailyGoals.legacy_key()).await,
        Some(legacy)
    );
    let status = service.status("u1").await.unwrap();
    assert_eq!(status.migrated_key_count, 0);
    assert!(!status.marker_present);
    assert!(status.has_legacy_data);
}
