use crate::db::{models::GoalStats, partition::LogicalKey, store::RecordStore};
use crate::error::StorageFailure;

const ENABLE_LOGS: bool = true;

use crate::log_warn;

impl RecordStore {
    /// Cached statistics. A read failure is logged and treated as absent,
    /// since the cache is rebuilt from goals anyway.
    pub async fn get_goal_stats(&self) -> Option<GoalStats> {
        match self.get::<GoalStats>(LogicalKey::GoalStats).await {
            Ok(stats) => stats,
            Err(err) => {
                log_warn!("[stats] ignoring unreadable cached stats: {}", err);
                None
            }
        }
    }

    pub async fn save_goal_stats(&self, stats: &GoalStats) -> Result<(), StorageFailure> {
        self.set(LogicalKey::GoalStats, stats).await
    }
}
