//! One-time move of legacy flat keys (`daily_goals`, `goal_stats`,
//! `articles`) into a user's partition.
//!
//! Order is always copy, validate, cleanup. Legacy keys are only removed
//! after validation succeeds, so a failure at any step leaves them intact
//! for a retry.

use std::sync::Arc;

use serde::Serialize;

use crate::db::{
    models::GoalRecord,
    partition::{resolve_key, LogicalKey},
    store::RecordStore,
};
use crate::error::{MigrationFailure, MigrationStage, StorageFailure};
use crate::sync::merge::merge;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationStatus {
    pub has_legacy_data: bool,
    pub is_migrated: bool,
    pub migrated_key_count: usize,
    pub marker_present: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    NotNeeded,
    Migrated { copied: usize },
}

pub struct MigrationService {
    store: Arc<RecordStore>,
}

fn partition_key(
    user_id: &str,
    logical: LogicalKey,
    stage: MigrationStage,
) -> Result<String, MigrationFailure> {
    resolve_key(user_id, logical).map_err(|err| MigrationFailure::new(stage, None, err.to_string()))
}

fn status_key(user_id: &str, logical: LogicalKey) -> Result<String, StorageFailure> {
    resolve_key(user_id, logical).map_err(|err| StorageFailure::read(logical.as_str(), err))
}

fn storage_failure(stage: MigrationStage, err: StorageFailure) -> MigrationFailure {
    MigrationFailure::new(stage, err.key.clone(), err.to_string())
}

impl MigrationService {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    async fn read(
        &self,
        key: &str,
        stage: MigrationStage,
    ) -> Result<Option<Vec<u8>>, MigrationFailure> {
        self.store
            .get_raw(key)
            .await
            .map_err(|err| storage_failure(stage, err))
    }

    /// True when any legacy key still holds data.
    pub async fn needs_migration(&self) -> Result<bool, StorageFailure> {
        for logical in LogicalKey::USER_DATA {
            if self.store.get_raw(logical.legacy_key()).await?.is_some() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Copy each legacy value into `user_id`'s partition. A partitioned key
    /// that already holds data is left alone, except goal collections, which
    /// are merged so neither side loses records. Returns how many keys were
    /// written.
    pub async fn migrate(&self, user_id: &str) -> Result<usize, MigrationFailure> {
        let mut copied = 0;
        for logical in LogicalKey::USER_DATA {
            let legacy_key = logical.legacy_key();
            let Some(legacy) = self.read(legacy_key, MigrationStage::Copy).await? else {
                continue;
            };
            let target = partition_key(user_id, logical, MigrationStage::Copy)?;

            let bytes = match self.read(&target, MigrationStage::Copy).await? {
                None => legacy,
                Some(existing) if logical == LogicalKey::DailyGoals => {
                    match merge_goal_bytes(&existing, &legacy) {
                        Some(merged) => merged,
                        None => {
                            log_warn!("[migration] legacy goals unreadable, keeping {}", target);
                            continue;
                        }
                    }
                }
                Some(_) => {
                    log_info!("[migration] {} already populated, not overwriting", target);
                    continue;
                }
            };

            self.store
                .set_raw(&target, bytes)
                .await
                .map_err(|err| storage_failure(MigrationStage::Copy, err))?;
            log_info!("[migration] copied {} -> {}", legacy_key, target);
            copied += 1;
        }
        Ok(copied)
    }

    /// Every legacy key that holds data must have a populated partitioned
    /// counterpart, and at least one partitioned key must hold data. Legacy
    /// goals that cannot be decoded must have been copied byte for byte,
    /// otherwise cleanup would lose them.
    pub async fn validate(&self, user_id: &str) -> Result<bool, MigrationFailure> {
        let mut any_partitioned = false;
        for logical in LogicalKey::USER_DATA {
            let target = partition_key(user_id, logical, MigrationStage::Validate)?;
            let partitioned = self.read(&target, MigrationStage::Validate).await?;
            let legacy = self
                .read(logical.legacy_key(), MigrationStage::Validate)
                .await?;
            match (&legacy, &partitioned) {
                (Some(_), None) => {
                    log_warn!("[migration] {} was not copied to {}", logical, target);
                    return Ok(false);
                }
                (Some(legacy), Some(partitioned))
                    if logical == LogicalKey::DailyGoals
                        && !goals_carried(legacy, partitioned) =>
                {
                    log_warn!("[migration] unreadable {} not carried into {}", logical, target);
                    return Ok(false);
                }
                _ => {}
            }
            any_partitioned |= partitioned.is_some();
        }
        Ok(any_partitioned)
    }

    pub async fn cleanup(&self) -> Result<(), MigrationFailure> {
        for logical in LogicalKey::USER_DATA {
            self.store
                .remove_raw(logical.legacy_key())
                .await
                .map_err(|err| storage_failure(MigrationStage::Cleanup, err))?;
        }
        log_info!("[migration] legacy keys removed");
        Ok(())
    }

    /// Copy partitioned values back to legacy keys, then drop the
    /// partitioned keys and the completion marker. Never run automatically.
    pub async fn rollback(&self, user_id: &str) -> Result<(), MigrationFailure> {
        for logical in LogicalKey::USER_DATA {
            let target = partition_key(user_id, logical, MigrationStage::Rollback)?;
            if let Some(bytes) = self.read(&target, MigrationStage::Rollback).await? {
                self.store
                    .set_raw(logical.legacy_key(), bytes)
                    .await
                    .map_err(|err| storage_failure(MigrationStage::Rollback, err))?;
            }
        }
        for logical in LogicalKey::USER_DATA {
            let target = partition_key(user_id, logical, MigrationStage::Rollback)?;
            self.store
                .remove_raw(&target)
                .await
                .map_err(|err| storage_failure(MigrationStage::Rollback, err))?;
        }
        let marker =
            partition_key(user_id, LogicalKey::MigrationMarker, MigrationStage::Rollback)?;
        self.store
            .remove_raw(&marker)
            .await
            .map_err(|err| storage_failure(MigrationStage::Rollback, err))?;
        log_info!("[migration] rolled back partition for {}", user_id);
        Ok(())
    }

    pub async fn status(&self, user_id: &str) -> Result<MigrationStatus, StorageFailure> {
        let has_legacy_data = self.needs_migration().await?;
        let mut migrated_key_count = 0;
        for logical in LogicalKey::USER_DATA {
            if self.store.get_raw(&status_key(user_id, logical)?).await?.is_some() {
                migrated_key_count += 1;
            }
        }
        let marker = status_key(user_id, LogicalKey::MigrationMarker)?;
        let marker_present = self.store.get_raw(&marker).await?.is_some();

        Ok(MigrationStatus {
            has_legacy_data,
            is_migrated: migrated_key_count > 0,
            migrated_key_count,
            marker_present,
        })
    }

    /// Copy, validate, clean up, then record completion for `user_id`.
    pub async fn run(&self, user_id: &str) -> Result<MigrationOutcome, MigrationFailure> {
        let needed = self
            .needs_migration()
            .await
            .map_err(|err| storage_failure(MigrationStage::Copy, err))?;
        if !needed {
            return Ok(MigrationOutcome::NotNeeded);
        }

        log_info!("[migration] restructuring legacy data for {}", user_id);
        let copied = self.migrate(user_id).await?;

        if !self.validate(user_id).await? {
            return Err(MigrationFailure::new(
                MigrationStage::Validate,
                None,
                "partitioned data missing after copy",
            ));
        }

        self.cleanup().await?;

        let marker = partition_key(user_id, LogicalKey::MigrationMarker, MigrationStage::Cleanup)?;
        self.store
            .set_raw(&marker, b"true".to_vec())
            .await
            .map_err(|err| storage_failure(MigrationStage::Cleanup, err))?;

        log_info!("[migration] completed for {} ({} keys copied)", user_id, copied);
        Ok(MigrationOutcome::Migrated { copied })
    }
}

/// LWW-merge two encoded goal collections, preferring `existing` on ties.
/// `None` when the legacy side cannot be decoded.
/// Legacy goals survive cleanup when they decode (and were merged) or when
/// the partition holds the same bytes.
fn goals_carried(legacy: &[u8], partitioned: &[u8]) -> bool {
    legacy == partitioned || serde_json::from_slice::<Vec<GoalRecord>>(legacy).is_ok()
}

fn merge_goal_bytes(existing: &[u8], legacy: &[u8]) -> Option<Vec<u8>> {
    let legacy: Vec<GoalRecord> = serde_json::from_slice(legacy).ok()?;
    let existing: Vec<GoalRecord> = serde_json::from_slice(existing).ok()?;
    serde_json::to_vec(&merge(&existing, &legacy)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::engine::MemoryEngine;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn setup() -> (Arc<RecordStore>, MigrationService) {
        let store = Arc::new(RecordStore::new(Arc::new(MemoryEngine::new())));
        let service = MigrationService::new(Arc::clone(&store));
        (store, service)
    }

    fn goals_json(hour: u32) -> Vec<u8> {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap();
        serde_json::to_vec(&vec![GoalRecord::empty(date, at)]).unwrap()
    }

    #[tokio::test]
    async fn copies_then_cleans_up_and_marks_complete() {
        let (store, service) = setup();
        let legacy = goals_json(9);
        store.set_raw("daily_goals", legacy.clone()).await.unwrap();
        store.set_raw("goal_stats", b"{}".to_vec()).await.unwrap();
        assert!(service.needs_migration().await.unwrap());

        let outcome = service.run("u1").await.unwrap();
        assert_eq!(outcome, MigrationOutcome::Migrated { copied: 2 });

        assert_eq!(
            store.get_raw("profile_u1_daily_goals").await.unwrap(),
            Some(legacy)
        );
        assert!(store.get_raw("daily_goals").await.unwrap().is_none());
        assert!(store.get_raw("goal_stats").await.unwrap().is_none());
        assert!(!service.needs_migration().await.unwrap());

        let status = service.status("u1").await.unwrap();
        assert!(status.marker_present);
        assert_eq!(status.migrated_key_count, 2);
        assert!(!status.has_legacy_data);
    }

    #[tokio::test]
    async fn rerun_is_a_no_op() {
        let (store, service) = setup();
        store.set_raw("articles", b"[]".to_vec()).await.unwrap();
        service.run("u1").await.unwrap();
        assert_eq!(service.run("u1").await.unwrap(), MigrationOutcome::NotNeeded);
    }

    #[tokio::test]
    async fn existing_partitioned_data_is_not_overwritten() {
        let (store, service) = setup();
        store.set_raw("goal_stats", b"{\"streak\":1}".to_vec()).await.unwrap();
        store
            .set_raw("profile_u1_goal_stats", b"{\"streak\":9}".to_vec())
            .await
            .unwrap();

        service.migrate("u1").await.unwrap();
        assert_eq!(
            store.get_raw("profile_u1_goal_stats").await.unwrap(),
            Some(b"{\"streak\":9}".to_vec())
        );
        // legacy untouched until cleanup
        assert!(store.get_raw("goal_stats").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn goal_collections_are_merged_not_replaced() {
        let (store, service) = setup();
        let d2 = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap();
        store.set_raw("daily_goals", goals_json(9)).await.unwrap();
        store
            .set_raw(
                "profile_u1_daily_goals",
                serde_json::to_vec(&vec![GoalRecord::empty(d2, at)]).unwrap(),
            )
            .await
            .unwrap();

        service.migrate("u1").await.unwrap();
        let bytes = store.get_raw("profile_u1_daily_goals").await.unwrap().unwrap();
        let merged: Vec<GoalRecord> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(merged.len(), 2);
    }

    #[tokio::test]
    async fn validation_fails_without_partitioned_data() {
        let (store, service) = setup();
        store.set_raw("daily_goals", goals_json(9)).await.unwrap();
        assert!(!service.validate("u1").await.unwrap());
    }

    #[tokio::test]
    async fn unreadable_legacy_goals_block_cleanup() {
        let (store, service) = setup();
        let partitioned = goals_json(9);
        store.set_raw("daily_goals", b"{broken".to_vec()).await.unwrap();
        store
            .set_raw("profile_u1_daily_goals", partitioned.clone())
            .await
            .unwrap();

        let err = service.run("u1").await.unwrap_err();
        assert_eq!(err.stage, MigrationStage::Validate);
        assert_eq!(
            store.get_raw("daily_goals").await.unwrap(),
            Some(b"{broken".to_vec())
        );
        assert_eq!(
            store.get_raw("profile_u1_daily_goals").await.unwrap(),
            Some(partitioned)
        );
        assert!(!service.status("u1").await.unwrap().marker_present);
    }

    #[tokio::test]
    async fn unreadable_legacy_goals_copied_verbatim_still_clean_up() {
        let (store, service) = setup();
        store.set_raw("daily_goals", b"{broken".to_vec()).await.unwrap();

        service.run("u1").await.unwrap();
        assert!(store.get_raw("daily_goals").await.unwrap().is_none());
        assert_eq!(
            store.get_raw("profile_u1_daily_goals").await.unwrap(),
            Some(b"{broken".to_vec())
        );
    }

    #[tokio::test]
    async fn rollback_restores_legacy_keys() {
        let (store, service) = setup();
        let legacy = goals_json(9);
        store.set_raw("daily_goals", legacy.clone()).await.unwrap();
        service.run("u1").await.unwrap();

        service.rollback("u1").await.unwrap();
        assert_eq!(store.get_raw("daily_goals").await.unwrap(), Some(legacy));
        assert!(store.get_raw("profile_u1_daily_goals").await.unwrap().is_none());
        assert!(!service.status("u1").await.unwrap().marker_present);
    }

    #[tokio::test]
    async fn empty_user_id_is_rejected() {
        let (store, service) = setup();
        store.set_raw("articles", b"[]".to_vec()).await.unwrap();
        let err = service.run("").await.unwrap_err();
        assert_eq!(err.stage, MigrationStage::Copy);
        assert!(store.get_raw("articles").await.unwrap().is_some());
    }
}
