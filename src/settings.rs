use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use crate::sync::RemoteConfig;

pub const REMOTE_URL_ENV: &str = "GOALSYNC_REMOTE_URL";
pub const REMOTE_TIMEOUT_ENV: &str = "GOALSYNC_REMOTE_TIMEOUT_SECS";
pub const DEBUG_ENV: &str = "GOALSYNC_DEBUG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteSettings {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout_secs: 5,
        }
    }
}

impl RemoteSettings {
    /// Client config when a base URL is set; `None` means local-only.
    pub fn client_config(&self) -> Option<RemoteConfig> {
        let base_url = self.base_url.as_ref()?.trim();
        if base_url.is_empty() {
            return None;
        }
        Some(RemoteConfig {
            base_url: base_url.to_string(),
            api_key: self.api_key.clone(),
            timeout_secs: self.timeout_secs,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoalSettings {
    pub weekly_exercise_goal_minutes: f64,
    pub last_viewed_summary_week: Option<NaiveDate>,
}

impl Default for GoalSettings {
    fn default() -> Self {
        Self {
            weekly_exercise_goal_minutes: 150.0,
            last_viewed_summary_week: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct UserSettings {
    remote: RemoteSettings,
    bootstrap_timeout_secs: u64,
    goals: GoalSettings,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            remote: RemoteSettings::default(),
            bootstrap_timeout_secs: 4,
            goals: GoalSettings::default(),
        }
    }
}

/// Values taken from the environment. They win over the file but are never
/// written back to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvOverrides {
    pub remote_url: Option<String>,
    pub remote_timeout_secs: Option<u64>,
    pub debug: bool,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let remote_url = lookup(REMOTE_URL_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let remote_timeout_secs = lookup(REMOTE_TIMEOUT_ENV)
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0);
        let debug = lookup(DEBUG_ENV)
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            remote_url,
            remote_timeout_secs,
            debug,
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
    overrides: EnvOverrides,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        Self::with_overrides(path, EnvOverrides::from_env())
    }

    pub fn with_overrides(path: PathBuf, overrides: EnvOverrides) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
            overrides,
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, UserSettings> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, UserSettings> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Effective remote settings, environment overrides applied.
    pub fn remote(&self) -> RemoteSettings {
        let mut remote = self.read().remote.clone();
        if let Some(url) = &self.overrides.remote_url {
            remote.base_url = Some(url.clone());
        }
        if let Some(secs) = self.overrides.remote_timeout_secs {
            remote.timeout_secs = secs;
        }
        remote
    }

    pub fn update_remote(&self, settings: RemoteSettings) -> Result<()> {
        let mut guard = self.write();
        guard.remote = settings;
        self.persist(&guard)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote().timeout_secs.max(1))
    }

    pub fn bootstrap_timeout(&self) -> Duration {
        Duration::from_secs(self.read().bootstrap_timeout_secs.max(1))
    }

    pub fn overrides(&self) -> &EnvOverrides {
        &self.overrides
    }

    pub fn weekly_exercise_goal_minutes(&self) -> f64 {
        self.read().goals.weekly_exercise_goal_minutes
    }

    pub fn last_viewed_summary_week(&self) -> Option<NaiveDate> {
        self.read().goals.last_viewed_summary_week
    }

    /// Whether the summary for `week_start` has not been looked at yet.
    pub fn is_summary_unseen(&self, week_start: NaiveDate) -> bool {
        self.last_viewed_summary_week()
            .map_or(true, |viewed| viewed < week_start)
    }

    pub fn mark_summary_viewed(&self, week_start: NaiveDate) -> Result<()> {
        let mut guard = self.write();
        guard.goals.last_viewed_summary_week = Some(week_start);
        self.persist(&guard)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: UserSettings = serde_json::from_str(&contents)?;
        *self.write() = data;
        Ok(())
    }
}
