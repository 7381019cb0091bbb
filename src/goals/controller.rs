//! The goal API used by front ends.
//!
//! Mutations are serialized behind one async mutex: apply in memory,
//! persist, recompute stats, then schedule a best-effort push of today's
//! record. A failed persist restores the previous in-memory collection.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::db::models::{GoalCategory, GoalDraft, GoalMetrics, GoalPatch, GoalRecord, GoalStats};
use crate::db::store::RecordStore;
use crate::error::{GoalError, StorageFailure};
use crate::goals::commit::Transactional;
use crate::stats::{self, WeeklySummary};
use crate::sync::{PushOutcome, SyncAdapter};
use crate::utils::Clock;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

#[derive(Default)]
struct GoalsState {
    goals: Transactional<Vec<GoalRecord>>,
    stats: GoalStats,
}

#[derive(Clone)]
pub struct GoalsController {
    state: Arc<Mutex<GoalsState>>,
    store: Arc<RecordStore>,
    sync: Arc<SyncAdapter>,
    user_id: Arc<Mutex<Option<String>>>,
    pusher: Arc<Mutex<Option<JoinHandle<()>>>>,
    cancel: Arc<Mutex<CancellationToken>>,
    clock: Clock,
    exercise_goal_minutes: f64,
}

impl GoalsController {
    pub fn new(
        store: Arc<RecordStore>,
        sync: Arc<SyncAdapter>,
        clock: Clock,
        exercise_goal_minutes: f64,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(GoalsState::default())),
            store,
            sync,
            user_id: Arc::new(Mutex::new(None)),
            pusher: Arc::new(Mutex::new(None)),
            cancel: Arc::new(Mutex::new(CancellationToken::new())),
            clock,
            exercise_goal_minutes,
        }
    }

    /// Signed-in user whose records get pushed. `None` keeps everything local.
    pub async fn set_user(&self, user_id: Option<String>) {
        *self.user_id.lock().await = user_id;
    }

    /// Load goals and cached stats from the active partition.
    pub async fn load(&self) -> Result<(), StorageFailure> {
        let goals = self.store.get_daily_goals().await?;
        let cached = self.store.get_goal_stats().await;

        let mut state = self.state.lock().await;
        state.goals.replace(goals);
        match cached {
            Some(stats) => state.stats = stats,
            None => self.refresh_stats(&mut state).await,
        }
        log_info!("[goals] loaded {} goal records", state.goals.get().len());
        Ok(())
    }

    /// Adopt a collection that is already persisted, such as a pull result.
    pub async fn replace_goals(&self, goals: Vec<GoalRecord>) {
        let mut state = self.state.lock().await;
        state.goals.replace(goals);
        self.refresh_stats(&mut state).await;
    }

    pub async fn goals(&self) -> Vec<GoalRecord> {
        self.state.lock().await.goals.get().clone()
    }

    pub async fn stats(&self) -> GoalStats {
        self.state.lock().await.stats.clone()
    }

    pub async fn get_goal_by_date(&self, date: NaiveDate) -> Option<GoalRecord> {
        let state = self.state.lock().await;
        state.goals.get().iter().find(|goal| goal.date == date).cloned()
    }

    pub async fn add_goal(&self, draft: GoalDraft) -> Result<GoalRecord, GoalError> {
        let now = (self.clock)();
        let mut state = self.state.lock().await;

        let store = Arc::clone(&self.store);
        let record = state
            .goals
            .commit(
                |goals| {
                    if goals.iter().any(|goal| goal.date == draft.date) {
                        return Err(GoalError::DuplicateDate(draft.date));
                    }
                    let record = draft.into_record(now)?;
                    goals.push(record.clone());
                    Ok(record)
                },
                |goals| async move { store.save_daily_goals(&goals).await.map_err(GoalError::from) },
            )
            .await?;

        self.after_mutation(&mut state, record.date).await;
        log_info!("[goals] added {} for {}", record.id, record.date);
        Ok(record)
    }

    pub async fn update_goal(&self, id: &str, patch: GoalPatch) -> Result<GoalRecord, GoalError> {
        let now = (self.clock)();
        let mut state = self.state.lock().await;

        let store = Arc::clone(&self.store);
        let record = state
            .goals
            .commit(
                |goals| {
                    let goal = goals
                        .iter_mut()
                        .find(|goal| goal.id == id)
                        .ok_or_else(|| GoalError::NotFound(id.to_string()))?;
                    patch.apply(goal, now)?;
                    Ok(goal.clone())
                },
                |goals| async move { store.save_daily_goals(&goals).await.map_err(GoalError::from) },
            )
            .await
            .map_err(|err| {
                if let GoalError::NotFound(id) = &err {
                    log_warn!("[goals] attempted to update missing goal {}", id);
                }
                err
            })?;

        self.after_mutation(&mut state, record.date).await;
        Ok(record)
    }

    /// Check or uncheck one category for `date`, creating the day's record
    /// if needed. Metrics only apply when checking.
    pub async fn set_category(
        &self,
        date: NaiveDate,
        category: GoalCategory,
        checked: bool,
        metrics: GoalMetrics,
    ) -> Result<GoalRecord, GoalError> {
        match self.get_goal_by_date(date).await {
            Some(existing) => {
                let patch = GoalPatch::default().set(category, checked);
                let patch = if checked { patch.with_metrics(metrics) } else { patch };
                self.update_goal(&existing.id, patch).await
            }
            None => {
                let mut draft = GoalDraft::new(date);
                if checked {
                    draft = draft.check(category).with_metrics(metrics);
                }
                self.add_goal(draft).await
            }
        }
    }

    pub async fn get_weekly_goals(&self, week_start: NaiveDate) -> Vec<GoalRecord> {
        let state = self.state.lock().await;
        stats::records_in_week(state.goals.get(), week_start)
    }

    /// `week_start` is snapped back to its Sunday.
    pub async fn calculate_weekly_summary(&self, week_start: NaiveDate) -> WeeklySummary {
        let state = self.state.lock().await;
        stats::weekly_summary(
            stats::week_start_for(week_start),
            state.goals.get(),
            self.exercise_goal_minutes,
        )
    }

    pub async fn get_current_streak(&self) -> u32 {
        let today = (self.clock)().date_naive();
        let state = self.state.lock().await;
        stats::streak(state.goals.get(), today)
    }

    pub async fn get_completion_rate(&self, days: u32) -> f64 {
        let today = (self.clock)().date_naive();
        let state = self.state.lock().await;
        stats::completion_rate(state.goals.get(), days, today)
    }

    /// Drop in-memory state and cancel pending pushes. Storage is untouched.
    pub async fn reset(&self) {
        {
            let mut cancel = self.cancel.lock().await;
            cancel.cancel();
            *cancel = CancellationToken::new();
        }
        if let Some(handle) = self.pusher.lock().await.take() {
            handle.abort();
        }
        *self.state.lock().await = GoalsState::default();
        *self.user_id.lock().await = None;
        log_info!("[goals] in-memory state reset");
    }

    /// Wait for the most recently scheduled push to finish.
    pub async fn wait_for_push(&self) {
        let handle = self.pusher.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    async fn after_mutation(&self, state: &mut GoalsState, date: NaiveDate) {
        self.sync.ledger().record_local_edit(date);
        self.refresh_stats(state).await;
        self.schedule_push().await;
    }

    /// Recompute and persist stats. A failed save keeps the previous stats;
    /// the goal mutation itself has already been persisted.
    async fn refresh_stats(&self, state: &mut GoalsState) {
        let stats = stats::compute_stats(state.goals.get(), (self.clock)());
        match self.store.save_goal_stats(&stats).await {
            Ok(()) => state.stats = stats,
            Err(err) => {
                log_error!("[goals] failed to save stats, keeping previous: {}", err);
            }
        }
    }

    async fn schedule_push(&self) {
        let Some(user_id) = self.user_id.lock().await.clone() else {
            log_debug!("[goals] no signed-in user, skipping push");
            return;
        };
        let token = self.cancel.lock().await.clone();
        let sync = Arc::clone(&self.sync);

        let mut pusher = self.pusher.lock().await;
        let previous = pusher.take();
        *pusher = Some(tokio::spawn(async move {
            // Keep pushes in mutation order.
            if let Some(previous) = previous {
                let _ = previous.await;
            }
            tokio::select! {
                _ = token.cancelled() => {
                    log_debug!("[goals] push cancelled");
                }
                result = sync.push_today(&user_id) => match result {
                    Ok(PushOutcome::Pushed { date }) => log_debug!("[goals] pushed {}", date),
                    Ok(outcome) => log_debug!("[goals] push skipped: {:?}", outcome),
                    Err(err) => log_warn!("[goals] push failed, will retry on next change: {}", err),
                }
            }
        }));
    }
}
