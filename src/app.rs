//! Wires storage, profile, migration, sync and the goals controller
//! together and runs the start-up sequence.

use std::sync::Arc;

use serde::Serialize;

use crate::articles::ArticleLibrary;
use crate::db::{models::Profile, store::RecordStore, KvEngine};
use crate::goals::GoalsController;
use crate::profile::{
    health_report, MigrationOutcome, MigrationService, ProfileHealth, ProfileService,
};
use crate::settings::SettingsStore;
use crate::sync::{MemoryRemoteStore, PullOutcome, RemoteDocumentStore, SyncAdapter};
use crate::utils::{race, system_clock, Clock, Raced};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum MigrationReport {
    /// No user id, so there is no partition to migrate into.
    Skipped,
    NotNeeded,
    Migrated { copied: usize },
    /// Legacy keys are intact and stay active; the session runs local-only.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum PullReport {
    /// No user id or no remote configured.
    Skipped,
    Merged { remote_won: usize, remote_only: usize },
    LocalOnly { reason: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupReport {
    pub profile: Option<Profile>,
    pub profile_timed_out: bool,
    pub partition: Option<String>,
    pub migration: MigrationReport,
    pub goals_loaded: usize,
    /// Readable message when stored goals could not be loaded.
    pub load_error: Option<String>,
    pub pull: PullReport,
}

pub struct App {
    settings: Arc<SettingsStore>,
    store: Arc<RecordStore>,
    profiles: ProfileService,
    migration: MigrationService,
    sync: Arc<SyncAdapter>,
    goals: GoalsController,
    articles: ArticleLibrary,
    remote_enabled: bool,
}

impl App {
    /// `remote = None` keeps the session local-only even with a user id.
    pub fn open(
        settings: Arc<SettingsStore>,
        engine: Arc<dyn KvEngine>,
        remote: Option<Arc<dyn RemoteDocumentStore>>,
    ) -> Self {
        Self::with_clock(settings, engine, remote, system_clock())
    }

    pub fn with_clock(
        settings: Arc<SettingsStore>,
        engine: Arc<dyn KvEngine>,
        remote: Option<Arc<dyn RemoteDocumentStore>>,
        clock: Clock,
    ) -> Self {
        let store = Arc::new(RecordStore::new(engine));
        let remote_enabled = remote.is_some();
        let remote: Arc<dyn RemoteDocumentStore> = match remote {
            Some(remote) => remote,
            None => Arc::new(MemoryRemoteStore::new()),
        };

        let sync = Arc::new(SyncAdapter::new(
            Arc::clone(&store),
            remote,
            settings.remote_timeout(),
            Arc::clone(&clock),
        ));
        let goals = GoalsController::new(
            Arc::clone(&store),
            Arc::clone(&sync),
            Arc::clone(&clock),
            settings.weekly_exercise_goal_minutes(),
        );

        Self {
            profiles: ProfileService::new(Arc::clone(&store), clock),
            migration: MigrationService::new(Arc::clone(&store)),
            articles: ArticleLibrary::new(Arc::clone(&store)),
            settings,
            store,
            sync,
            goals,
            remote_enabled,
        }
    }

    /// Bring the session up: profile, partition, migration, local load,
    /// initial pull, stats. Nothing here is fatal; each step that fails
    /// degrades to local data and is noted in the report.
    pub async fn start(&self, user_id: Option<&str>) -> StartupReport {
        let user_id = user_id.map(str::trim).filter(|id| !id.is_empty());

        let (profile, profile_timed_out) = self.bootstrap_profile().await;

        let partition = match user_id {
            Some(user_id) => match self.store.set_active_partition(user_id) {
                Ok(()) => Some(user_id.to_string()),
                Err(err) => {
                    log_error!("[app] cannot partition storage for {}: {}", user_id, err);
                    None
                }
            },
            None => {
                self.store.clear_active_partition();
                None
            }
        };

        let migration = match &partition {
            Some(user_id) => self.run_migration(user_id).await,
            None => MigrationReport::Skipped,
        };
        // The session fell back to legacy keys, which must never receive
        // a user's remote data.
        let partition = match migration {
            MigrationReport::Failed { .. } => None,
            _ => partition,
        };

        let sync_user = partition.clone().filter(|_| self.remote_enabled);
        self.goals.set_user(sync_user.clone()).await;

        let load_error = match self.goals.load().await {
            Ok(()) => None,
            Err(err) => {
                log_error!("[app] failed to load goals: {}", err);
                Some(err.readable_message().to_string())
            }
        };

        let pull = match (&sync_user, &load_error) {
            (Some(user_id), None) => self.initial_pull(user_id).await,
            _ => PullReport::Skipped,
        };

        let goals_loaded = self.goals.goals().await.len();
        log_info!(
            "[app] started ({} goals, partition {:?}, pull {:?})",
            goals_loaded,
            partition,
            pull
        );

        StartupReport {
            profile,
            profile_timed_out,
            partition,
            migration,
            goals_loaded,
            load_error,
            pull,
        }
    }

    /// End the session: cancel pushes, drop in-memory state, and return to
    /// the legacy key space. Stored data is kept.
    pub async fn logout(&self) {
        self.goals.reset().await;
        self.sync.ledger().clear();
        self.store.clear_active_partition();
        log_info!("[app] logged out");
    }

    async fn bootstrap_profile(&self) -> (Option<Profile>, bool) {
        let limit = self.settings.bootstrap_timeout();
        match race(limit, self.profiles.load_or_recover()).await {
            Raced::Completed(Ok(profile)) => (Some(profile), false),
            Raced::Completed(Err(err)) => {
                log_error!("[app] profile unavailable: {}", err);
                (None, false)
            }
            Raced::TimedOut => {
                log_warn!("[app] profile bootstrap timed out after {:?}", limit);
                (None, true)
            }
        }
    }

    async fn run_migration(&self, user_id: &str) -> MigrationReport {
        match self.migration.run(user_id).await {
            Ok(MigrationOutcome::NotNeeded) => MigrationReport::NotNeeded,
            Ok(MigrationOutcome::Migrated { copied }) => MigrationReport::Migrated { copied },
            Err(failure) => {
                // Legacy keys still hold the data; read them this session
                // without syncing.
                log_error!("[app] {}; staying on legacy keys, local-only", failure);
                self.store.clear_active_partition();
                MigrationReport::Failed {
                    reason: failure.to_string(),
                }
            }
        }
    }

    async fn initial_pull(&self, user_id: &str) -> PullReport {
        match self.sync.pull_and_merge(user_id).await {
            Ok(PullOutcome::Merged { goals, report }) => {
                self.goals.replace_goals(goals).await;
                PullReport::Merged {
                    remote_won: report.remote_won(),
                    remote_only: report.remote_only(),
                }
            }
            Ok(PullOutcome::LocalOnly { reason, .. }) => PullReport::LocalOnly {
                reason: reason.to_string(),
            },
            Err(err) => {
                log_error!("[app] pull could not persist merged goals: {}", err);
                PullReport::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }

    pub async fn health(&self) -> ProfileHealth {
        health_report(&self.profiles, &self.store).await
    }

    pub fn goals(&self) -> &GoalsController {
        &self.goals
    }

    pub fn articles(&self) -> &ArticleLibrary {
        &self.articles
    }

    pub fn profiles(&self) -> &ProfileService {
        &self.profiles
    }

    pub fn migration(&self) -> &MigrationService {
        &self.migration
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn sync(&self) -> &SyncAdapter {
        &self.sync
    }

    pub fn remote_enabled(&self) -> bool {
        self.remote_enabled
    }
}
