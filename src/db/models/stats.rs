use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cached aggregate over the goal collection. Recomputed after every
/// mutation and never treated as a source of truth.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalStats {
    pub weekly_completion: f64,
    pub monthly_completion: f64,
    pub streak: u32,
    pub last_updated: DateTime<Utc>,
}
