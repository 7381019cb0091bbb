use serde::Serialize;

use crate::db::store::RecordStore;
use crate::profile::service::{validate_profile, ProfileService};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileHealth {
    pub is_healthy: bool,
    pub profile_exists: bool,
    pub profile_valid: bool,
    pub partition_active: bool,
    pub data_accessible: bool,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Read-only diagnosis of the profile and its storage partition.
pub async fn health_report(profiles: &ProfileService, store: &RecordStore) -> ProfileHealth {
    let mut issues = Vec::new();
    let mut recommendations = Vec::new();

    let profile = match profiles.get_profile().await {
        Ok(profile) => profile,
        Err(err) => {
            issues.push(format!("Profile could not be read: {err}"));
            recommendations.push("Attempt profile recovery".to_string());
            None
        }
    };

    let profile_exists = profile.is_some();
    let profile_valid = match &profile {
        Some(profile) => match validate_profile(profile) {
            Ok(()) => true,
            Err(failure) => {
                issues.extend(failure.issues);
                recommendations.push("Attempt profile recovery".to_string());
                false
            }
        },
        None => {
            if issues.is_empty() {
                issues.push("No profile found in storage".to_string());
                recommendations.push("Initialize profile system".to_string());
            }
            false
        }
    };

    let partition_active = store.is_partitioned();
    if !partition_active {
        issues.push("Profile storage not initialized".to_string());
        recommendations.push("Load profile to initialize storage".to_string());
    }

    let data_accessible = store.get_daily_goals().await.is_ok();
    if !data_accessible {
        issues.push("Data access issues detected".to_string());
        recommendations.push("Check storage permissions and integrity".to_string());
    }

    ProfileHealth {
        is_healthy: profile_exists && profile_valid && partition_active && data_accessible,
        profile_exists,
        profile_valid,
        partition_active,
        data_accessible,
        issues,
        recommendations,
    }
}
