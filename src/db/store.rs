//! Namespaced record persistence on top of a [`KvEngine`].
//!
//! Values are JSON. Every operation maps engine and codec errors to a
//! [`StorageFailure`] naming the physical key, so callers can decide
//! whether to fall back or surface the failure.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{de::DeserializeOwned, Serialize};

use crate::db::engine::KvEngine;
use crate::db::partition::{LogicalKey, PartitionError, PartitionResolver};
use crate::error::{StorageFailure, StorageOp};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

pub struct RecordStore {
    engine: Arc<dyn KvEngine>,
    resolver: RwLock<PartitionResolver>,
}

impl RecordStore {
    /// Starts in the legacy key space until a partition is activated.
    pub fn new(engine: Arc<dyn KvEngine>) -> Self {
        Self {
            engine,
            resolver: RwLock::new(PartitionResolver::legacy()),
        }
    }

    pub fn engine(&self) -> Arc<dyn KvEngine> {
        Arc::clone(&self.engine)
    }

    fn resolver(&self) -> RwLockReadGuard<'_, PartitionResolver> {
        match self.resolver.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn resolver_mut(&self) -> RwLockWriteGuard<'_, PartitionResolver> {
        match self.resolver.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn set_active_partition(&self, user_id: &str) -> Result<(), PartitionError> {
        let resolver = PartitionResolver::for_user(user_id)?;
        *self.resolver_mut() = resolver;
        log_info!("[store] partition active for user {}", user_id);
        Ok(())
    }

    pub fn clear_active_partition(&self) {
        *self.resolver_mut() = PartitionResolver::legacy();
        log_info!("[store] partition cleared, using legacy keys");
    }

    pub fn is_partitioned(&self) -> bool {
        self.resolver().is_partitioned()
    }

    pub fn active_user(&self) -> Option<String> {
        self.resolver().user_id().map(str::to_string)
    }

    pub fn physical_key(&self, logical: LogicalKey) -> String {
        self.resolver().resolve(logical)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        logical: LogicalKey,
    ) -> Result<Option<T>, StorageFailure> {
        let key = self.physical_key(logical);
        let Some(bytes) = self.get_raw(&key).await? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes).map(Some).map_err(|err| {
            log_error!("[store] failed to parse stored value for {}: {}", key, err);
            StorageFailure::read(key, err)
        })
    }

    pub async fn set<T: Serialize + ?Sized>(
        &self,
        logical: LogicalKey,
        value: &T,
    ) -> Result<(), StorageFailure> {
        let key = self.physical_key(logical);
        let bytes = serde_json::to_vec(value).map_err(|err| StorageFailure::write(&key, err))?;
        self.set_raw(&key, bytes).await
    }

    pub async fn remove(&self, logical: LogicalKey) -> Result<(), StorageFailure> {
        let key = self.physical_key(logical);
        self.remove_raw(&key).await
    }

    /// Wipes every key in the engine, partitioned or not.
    pub async fn clear(&self) -> Result<(), StorageFailure> {
        self.engine.clear().await.map_err(|err| {
            log_error!("[store] failed to clear storage: {}", err);
            StorageFailure {
                op: StorageOp::Delete,
                key: None,
                source: err,
            }
        })
    }

    pub async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, StorageFailure> {
        self.engine.get(key).await.map_err(|err| {
            log_error!("[store] failed to read {}: {}", key, err);
            StorageFailure::read(key, err)
        })
    }

    pub async fn set_raw(&self, key: &str, value: Vec<u8>) -> Result<(), StorageFailure> {
        log_debug!("[store] writing {} ({} bytes)", key, value.len());
        self.engine.set(key, value).await.map_err(|err| {
            log_error!("[store] failed to write {}: {}", key, err);
            StorageFailure::write(key, err)
        })
    }

    pub async fn remove_raw(&self, key: &str) -> Result<(), StorageFailure> {
        self.engine.remove(key).await.map_err(|err| {
            log_error!("[store] failed to delete {}: {}", key, err);
            StorageFailure::delete(key, err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::engine::MemoryEngine;
    use crate::db::models::GoalStats;

    fn store() -> RecordStore {
        RecordStore::new(Arc::new(MemoryEngine::new()))
    }

    #[tokio::test]
    async fn round_trips_typed_values() {
        let store = store();
        let stats = GoalStats {
            streak: 3,
            weekly_completion: 42.0,
            ..Default::default()
        };
        store.set(LogicalKey::GoalStats, &stats).await.unwrap();
        let loaded: Option<GoalStats> = store.get(LogicalKey::GoalStats).await.unwrap();
        assert_eq!(loaded, Some(stats));
    }

    #[tokio::test]
    async fn absent_key_is_none() {
        let loaded: Option<GoalStats> = store().get(LogicalKey::GoalStats).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn undecodable_value_is_a_read_failure() {
        let store = store();
        store.set_raw("goal_stats", b"{not json".to_vec()).await.unwrap();
        let err = store
            .get::<GoalStats>(LogicalKey::GoalStats)
            .await
            .unwrap_err();
        assert_eq!(err.op, StorageOp::Read);
        assert_eq!(err.key.as_deref(), Some("goal_stats"));
    }

    #[tokio::test]
    async fn partition_switches_physical_keys() {
        let store = store();
        store.set(LogicalKey::Articles, &vec!["legacy"]).await.unwrap();

        store.set_active_partition("u1").unwrap();
        assert!(store.is_partitioned());
        assert_eq!(store.physical_key(LogicalKey::Articles), "profile_u1_articles");
        let partitioned: Option<Vec<String>> = store.get(LogicalKey::Articles).await.unwrap();
        assert!(partitioned.is_none());

        store.clear_active_partition();
        let legacy: Option<Vec<String>> = store.get(LogicalKey::Articles).await.unwrap();
        assert_eq!(legacy, Some(vec!["legacy".to_string()]));
    }

    #[tokio::test]
    async fn empty_partition_is_rejected_and_state_kept() {
        let store = store();
        store.set_active_partition("u1").unwrap();
        assert!(store.set_active_partition("").is_err());
        assert_eq!(store.active_user().as_deref(), Some("u1"));
    }
}
