//! Maps logical record names onto physical storage keys.
//!
//! Partitioned keys look like `profile_{userId}_{logical}`. No logical name
//! is a suffix of another, so two different (user, logical) pairs can never
//! produce the same physical key.

use std::fmt;

use thiserror::Error;

const PARTITION_PREFIX: &str = "profile_";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionError {
    #[error("user id must not be empty")]
    EmptyUserId,
}

/// Closed set of record names the store knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalKey {
    DailyGoals,
    GoalStats,
    Articles,
    MigrationMarker,
    /// Global; never partitioned.
    Profile,
    /// Global; never partitioned.
    DeviceId,
}

impl LogicalKey {
    /// Keys that hold per-user data and take part in the legacy restructuring.
    pub const USER_DATA: [LogicalKey; 3] = [
        LogicalKey::DailyGoals,
        LogicalKey::GoalStats,
        LogicalKey::Articles,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalKey::DailyGoals => "daily_goals",
            LogicalKey::GoalStats => "goal_stats",
            LogicalKey::Articles => "articles",
            LogicalKey::MigrationMarker => "migration_complete",
            LogicalKey::Profile => "profile",
            LogicalKey::DeviceId => "device_id",
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, LogicalKey::Profile | LogicalKey::DeviceId)
    }

    /// The flat, unpartitioned key older installs stored this record under.
    pub fn legacy_key(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for LogicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical key for `logical` inside `user_id`'s partition.
pub fn resolve_key(user_id: &str, logical: LogicalKey) -> Result<String, PartitionError> {
    if user_id.is_empty() {
        return Err(PartitionError::EmptyUserId);
    }
    if logical.is_global() {
        return Ok(logical.as_str().to_string());
    }
    Ok(format!("{PARTITION_PREFIX}{user_id}_{}", logical.as_str()))
}

/// Resolves keys against the active partition, falling back to the legacy
/// flat key space while no user is known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionResolver {
    user_id: Option<String>,
}

impl PartitionResolver {
    pub fn legacy() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: &str) -> Result<Self, PartitionError> {
        if user_id.is_empty() {
            return Err(PartitionError::EmptyUserId);
        }
        Ok(Self {
            user_id: Some(user_id.to_string()),
        })
    }

    pub fn is_partitioned(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn resolve(&self, logical: LogicalKey) -> String {
        match &self.user_id {
            Some(user_id) if !logical.is_global() => {
                format!("{PARTITION_PREFIX}{user_id}_{}", logical.as_str())
            }
            _ => logical.legacy_key().to_string(),
        }
    }
}
