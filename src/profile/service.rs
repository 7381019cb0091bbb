use std::sync::Arc;

use uuid::Uuid;

use crate::db::{
    helpers::{parse_datetime, timestamp},
    models::{DeviceInfo, Preferences, Profile},
    partition::LogicalKey,
    store::RecordStore,
};
use crate::error::{ProfileIntegrityFailure, StorageFailure};
use crate::profile::ProfileError;
use crate::utils::Clock;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Fields a caller may change. `lastActive` is always refreshed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub preferences: Option<Preferences>,
}

/// Check a stored profile. Returns every problem found, not just the first.
pub fn validate_profile(profile: &Profile) -> Result<(), ProfileIntegrityFailure> {
    let mut issues = Vec::new();

    if profile.device_id.is_empty() {
        issues.push("deviceId is missing".to_string());
    } else if !profile.device_id.contains('_') {
        issues.push(format!(
            "deviceId '{}' has no platform prefix",
            profile.device_id
        ));
    }

    for (field, value) in [
        ("createdAt", &profile.created_at),
        ("lastActive", &profile.last_active),
    ] {
        if value.is_empty() {
            issues.push(format!("{field} is missing"));
        } else if parse_datetime(value, field).is_err() {
            issues.push(format!("{field} '{value}' is not a valid timestamp"));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ProfileIntegrityFailure { issues })
    }
}

pub struct ProfileService {
    store: Arc<RecordStore>,
    clock: Clock,
    platform: String,
}

impl ProfileService {
    pub fn new(store: Arc<RecordStore>, clock: Clock) -> Self {
        Self::with_platform(store, clock, std::env::consts::OS)
    }

    pub fn with_platform(store: Arc<RecordStore>, clock: Clock, platform: &str) -> Self {
        Self {
            store,
            clock,
            platform: platform.to_string(),
        }
    }

    /// The stored device identity, or a new `{platform}_{uuid}_{millis}` one.
    /// An unreadable stored identity is replaced.
    pub async fn generate_device_id(&self) -> Result<DeviceInfo, StorageFailure> {
        match self.store.get::<DeviceInfo>(LogicalKey::DeviceId).await {
            Ok(Some(existing)) if !existing.device_id.is_empty() => return Ok(existing),
            Ok(_) => {}
            Err(err) => log_warn!("[profile] replacing unreadable device id: {}", err),
        }

        let now = (self.clock)();
        let info = DeviceInfo {
            device_id: format!(
                "{}_{}_{}",
                self.platform,
                Uuid::new_v4(),
                now.timestamp_millis()
            ),
            created_at: timestamp(now),
        };
        self.store.set(LogicalKey::DeviceId, &info).await?;
        log_info!("[profile] generated device id {}", info.device_id);
        Ok(info)
    }

    pub async fn create_profile(&self) -> Result<Profile, StorageFailure> {
        let device = self.generate_device_id().await?;
        let profile = Profile {
            device_id: device.device_id,
            created_at: device.created_at,
            last_active: timestamp((self.clock)()),
            preferences: Some(Preferences::default()),
        };
        self.store.set(LogicalKey::Profile, &profile).await?;
        log_info!("[profile] created profile for {}", profile.device_id);
        Ok(profile)
    }

    pub async fn get_profile(&self) -> Result<Option<Profile>, StorageFailure> {
        self.store.get(LogicalKey::Profile).await
    }

    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<Profile, ProfileError> {
        let mut profile = self.get_profile().await?.ok_or(ProfileError::Missing)?;
        if let Some(preferences) = update.preferences {
            profile.preferences = Some(preferences);
        }
        profile.last_active = timestamp((self.clock)());
        self.store.set(LogicalKey::Profile, &profile).await?;
        Ok(profile)
    }

    /// Load the profile, creating one when absent and rebuilding it around
    /// the stored device id when it is unreadable or fails validation.
    pub async fn load_or_recover(&self) -> Result<Profile, StorageFailure> {
        match self.get_profile().await {
            Ok(None) => {
                log_info!("[profile] no profile found, creating one");
                self.create_profile().await
            }
            Ok(Some(profile)) => match validate_profile(&profile) {
                Ok(()) => Ok(profile),
                Err(failure) => {
                    log_warn!("[profile] {}; recovering", failure);
                    self.recover().await
                }
            },
            Err(err) => {
                log_warn!("[profile] stored profile unreadable ({}); recovering", err);
                self.recover().await
            }
        }
    }

    async fn recover(&self) -> Result<Profile, StorageFailure> {
        let profile = self.create_profile().await?;
        log_info!("[profile] recovered profile for {}", profile.device_id);
        Ok(profile)
    }
}
