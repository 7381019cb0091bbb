//! Push/pull between the local record store and the remote document store.
//!
//! Remote failures never reach the user as errors: a push returns its
//! failure for the caller to log, and a pull degrades to the local copy.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde_json::Value;

use crate::db::{models::GoalRecord, store::RecordStore};
use crate::error::{RemoteSyncFailure, StorageFailure};
use crate::sync::merge::{merge_with_report, MergeReport};
use crate::sync::remote::{CollectionPath, DocumentPath, Fields, RemoteDocumentStore};
use crate::sync::state::SyncLedger;
use crate::utils::{race, Clock, Raced};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub enum PushOutcome {
    Pushed { date: NaiveDate },
    /// No record exists for today yet.
    NothingToPush { date: NaiveDate },
    /// Local goals could not be read, so nothing was sent.
    LocalUnreadable { date: NaiveDate },
}

#[derive(Debug)]
pub enum PullOutcome {
    Merged {
        goals: Vec<GoalRecord>,
        report: MergeReport,
    },
    /// The remote store could not be reached; `goals` is the untouched local copy.
    LocalOnly {
        goals: Vec<GoalRecord>,
        reason: RemoteSyncFailure,
    },
}

impl PullOutcome {
    pub fn goals(&self) -> &[GoalRecord] {
        match self {
            PullOutcome::Merged { goals, .. } | PullOutcome::LocalOnly { goals, .. } => goals,
        }
    }

    pub fn into_goals(self) -> Vec<GoalRecord> {
        match self {
            PullOutcome::Merged { goals, .. } | PullOutcome::LocalOnly { goals, .. } => goals,
        }
    }

    pub fn is_merged(&self) -> bool {
        matches!(self, PullOutcome::Merged { .. })
    }
}

pub struct SyncAdapter {
    store: Arc<RecordStore>,
    remote: Arc<dyn RemoteDocumentStore>,
    ledger: Arc<SyncLedger>,
    timeout: Duration,
    clock: Clock,
}

impl SyncAdapter {
    pub fn new(
        store: Arc<RecordStore>,
        remote: Arc<dyn RemoteDocumentStore>,
        timeout: Duration,
        clock: Clock,
    ) -> Self {
        Self {
            store,
            remote,
            ledger: Arc::new(SyncLedger::new()),
            timeout,
            clock,
        }
    }

    pub fn ledger(&self) -> Arc<SyncLedger> {
        Arc::clone(&self.ledger)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Upsert today's local record (UTC calendar date) to
    /// `goals/{userId}/daily/{date}`. Historical records are never pushed.
    pub async fn push_today(&self, user_id: &str) -> Result<PushOutcome, RemoteSyncFailure> {
        let today = (self.clock)().date_naive();
        let goals = match self.store.get_daily_goals().await {
            Ok(goals) => goals,
            Err(err) => {
                log_error!("[sync] push skipped, local goals unreadable: {}", err);
                return Ok(PushOutcome::LocalUnreadable { date: today });
            }
        };

        match goals.iter().find(|goal| goal.date == today) {
            Some(record) => {
                self.push_record(user_id, record).await?;
                Ok(PushOutcome::Pushed { date: today })
            }
            None => Ok(PushOutcome::NothingToPush { date: today }),
        }
    }

    /// Upsert one record with field merge.
    pub async fn push_record(
        &self,
        user_id: &str,
        record: &GoalRecord,
    ) -> Result<(), RemoteSyncFailure> {
        let fields = upsert_fields(record)?;
        let path = DocumentPath::daily_goal(user_id, record.date);

        match race(self.timeout, self.remote.upsert_merge(&path, fields)).await {
            Raced::Completed(Ok(())) => {
                self.ledger.record_push(record.date);
                log_info!("[sync] pushed {}", path);
                Ok(())
            }
            Raced::Completed(Err(err)) => Err(err),
            Raced::TimedOut => Err(RemoteSyncFailure::Timeout(self.timeout)),
        }
    }

    /// Fetch the remote collection, merge it into the local one and
    /// persist the result. Only a local storage failure is an error.
    pub async fn pull_and_merge(&self, user_id: &str) -> Result<PullOutcome, StorageFailure> {
        let local = self.store.get_daily_goals().await?;
        let collection = CollectionPath::daily_goals(user_id);

        let documents = match race(self.timeout, self.remote.list(&collection)).await {
            Raced::Completed(Ok(documents)) => documents,
            Raced::Completed(Err(reason)) => {
                log_warn!("[sync] pull failed, continuing with local data: {}", reason);
                return Ok(PullOutcome::LocalOnly {
                    goals: local,
                    reason,
                });
            }
            Raced::TimedOut => {
                log_warn!("[sync] pull timed out after {:?}, continuing offline", self.timeout);
                return Ok(PullOutcome::LocalOnly {
                    goals: local,
                    reason: RemoteSyncFailure::Timeout(self.timeout),
                });
            }
        };

        let remote = decode_documents(documents);
        let (merged, report) = merge_with_report(&local, &remote);
        log_info!(
            "[sync] merged {} local and {} remote goals into {} (remote won {}, remote only {})",
            local.len(),
            remote.len(),
            merged.len(),
            report.remote_won(),
            report.remote_only()
        );

        self.store.save_daily_goals(&merged).await?;
        self.ledger.record_merge(&report);

        Ok(PullOutcome::Merged {
            goals: merged,
            report,
        })
    }
}

/// The record as merge fields. Cleared optional fields are sent as `null`
/// so the remote drops values left over from an earlier push.
fn upsert_fields(record: &GoalRecord) -> Result<Fields, RemoteSyncFailure> {
    let mut fields = match serde_json::to_value(record) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => return Err(RemoteSyncFailure::Decode("goal record is not an object".into())),
        Err(err) => return Err(RemoteSyncFailure::Decode(err.to_string())),
    };
    for name in GoalRecord::CLEARABLE_FIELDS {
        fields.entry(name).or_insert(Value::Null);
    }
    Ok(fields)
}

/// Malformed documents are skipped rather than failing the whole pull.
fn decode_documents(documents: Vec<Value>) -> Vec<GoalRecord> {
    documents
        .into_iter()
        .filter_map(|document| match serde_json::from_value::<GoalRecord>(document) {
            Ok(record) => Some(record),
            Err(err) => {
                log_warn!("[sync] skipping malformed remote goal: {}", err);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::engine::MemoryEngine;
    use crate::sync::remote::MemoryRemoteStore;
    use crate::sync::state::SyncState;
    use crate::utils::fixed_clock;
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap()
    }

    fn setup(timeout: Duration) -> (Arc<RecordStore>, Arc<MemoryRemoteStore>, SyncAdapter) {
        let store = Arc::new(RecordStore::new(Arc::new(MemoryEngine::new())));
        store.set_active_partition("u1").unwrap();
        let remote = Arc::new(MemoryRemoteStore::new());
        let adapter = SyncAdapter::new(
            Arc::clone(&store),
            remote.clone(),
            timeout,
            fixed_clock(now()),
        );
        (store, remote, adapter)
    }

    fn record(date: NaiveDate, at: DateTime<Utc>) -> GoalRecord {
        GoalRecord::empty(date, at)
    }

    #[tokio::test]
    async fn push_sends_only_today() {
        let (store, remote, adapter) = setup(DEFAULT_REMOTE_TIMEOUT);
        let today = now().date_naive();
        let yesterday = today.pred_opt().unwrap();
        store
            .save_daily_goals(&[record(yesterday, now()), record(today, now())])
            .await
            .unwrap();

        let outcome = adapter.push_today("u1").await.unwrap();
        assert_eq!(outcome, PushOutcome::Pushed { date: today });
        assert_eq!(remote.len(), 1);
        assert!(remote
            .document(&DocumentPath::daily_goal("u1", today))
            .is_some());
        assert_eq!(adapter.ledger().state(today), SyncState::Synced);
    }

    #[test]
    fn cleared_fields_are_sent_as_null() {
        let mut goal = record(now().date_naive(), now());
        goal.sleep = true;
        goal.sleep_hours = Some(7.0);

        let fields = upsert_fields(&goal).unwrap();
        assert_eq!(fields["sleepHours"], json!(7.0));
        for name in ["exerciseMinutes", "cognitiveMinutes", "socialNewPeople", "dietRating", "notes"] {
            assert_eq!(fields[name], Value::Null, "{name} should be explicit null");
        }
    }

    #[tokio::test]
    async fn push_without_today_record_is_a_no_op() {
        let (_store, remote, adapter) = setup(DEFAULT_REMOTE_TIMEOUT);
        let outcome = adapter.push_today("u1").await.unwrap();
        assert!(matches!(outcome, PushOutcome::NothingToPush { .. }));
        assert!(remote.is_empty());
    }

    #[tokio::test]
    async fn push_failure_is_returned() {
        let (store, remote, adapter) = setup(DEFAULT_REMOTE_TIMEOUT);
        store
            .save_daily_goals(&[record(now().date_naive(), now())])
            .await
            .unwrap();
        remote.set_offline(true);
        assert!(adapter.push_today("u1").await.is_err());
    }

    #[tokio::test]
    async fn pull_failure_returns_local_unchanged() {
        let (store, remote, adapter) = setup(DEFAULT_REMOTE_TIMEOUT);
        let local = vec![record(now().date_naive(), now())];
        store.save_daily_goals(&local).await.unwrap();
        remote.set_offline(true);

        let outcome = adapter.pull_and_merge("u1").await.unwrap();
        assert!(!outcome.is_merged());
        assert_eq!(outcome.goals(), local.as_slice());
        assert_eq!(store.get_daily_goals().await.unwrap(), local);
    }

    #[tokio::test]
    async fn slow_remote_times_out_to_local() {
        let (store, remote, adapter) = setup(Duration::from_millis(20));
        store
            .save_daily_goals(&[record(now().date_naive(), now())])
            .await
            .unwrap();
        remote.set_latency(Duration::from_secs(5));

        match adapter.pull_and_merge("u1").await.unwrap() {
            PullOutcome::LocalOnly {
                reason: RemoteSyncFailure::Timeout(limit),
                goals,
            } => {
                assert_eq!(limit, Duration::from_millis(20));
                assert_eq!(goals.len(), 1);
            }
            other => panic!("expected timeout fallback, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn pull_merges_and_persists() {
        let (store, remote, adapter) = setup(DEFAULT_REMOTE_TIMEOUT);
        let d1 = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        let mut local_d1 = record(d1, t1);
        local_d1.exercise = true;
        store.save_daily_goals(&[local_d1]).await.unwrap();

        let mut remote_d1 = record(d1, t2);
        remote_d1.exercise = false;
        let remote_d2 = record(d2, t1);
        for rec in [&remote_d1, &remote_d2] {
            remote.put_raw(
                &DocumentPath::daily_goal("u1", rec.date),
                serde_json::to_value(rec).unwrap(),
            );
        }

        let outcome = adapter.pull_and_merge("u1").await.unwrap();
        let expected = vec![remote_d1, remote_d2];
        assert_eq!(outcome.goals(), expected.as_slice());
        assert_eq!(store.get_daily_goals().await.unwrap(), expected);
        assert_eq!(adapter.ledger().state(d1), SyncState::MergedRemote);
        assert_eq!(adapter.ledger().state(d2), SyncState::Synced);
    }

    #[tokio::test]
    async fn malformed_remote_documents_are_skipped() {
        let (_store, remote, adapter) = setup(DEFAULT_REMOTE_TIMEOUT);
        let d1 = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        remote.put_raw(&DocumentPath::daily_goal("u1", d1), json!({"date": "not-a-date"}));
        remote.put_raw(
            &DocumentPath::daily_goal("u1", d2),
            serde_json::to_value(record(d2, now())).unwrap(),
        );

        let outcome = adapter.pull_and_merge("u1").await.unwrap();
        assert_eq!(outcome.goals().len(), 1);
        assert_eq!(outcome.goals()[0].date, d2);
    }
}
