use crate::db::{models::GoalRecord, partition::LogicalKey, store::RecordStore};
use crate::error::StorageFailure;

const ENABLE_LOGS: bool = true;

use crate::log_error;

impl RecordStore {
    /// Goal collection of the active partition. Absent means empty; a
    /// value that does not decode is a read failure, never "absent".
    pub async fn get_daily_goals(&self) -> Result<Vec<GoalRecord>, StorageFailure> {
        Ok(self
            .get::<Vec<GoalRecord>>(LogicalKey::DailyGoals)
            .await?
            .unwrap_or_default())
    }

    pub async fn save_daily_goals(&self, goals: &[GoalRecord]) -> Result<(), StorageFailure> {
        self.set(LogicalKey::DailyGoals, goals).await.map_err(|err| {
            log_error!("[goals] failed to save {} goal records: {}", goals.len(), err);
            err
        })
    }
}
