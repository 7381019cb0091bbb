//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use goalsync_lib::db::{GoalCategory, GoalDraft, GoalRecord, KvEngine, MemoryEngine};

/// Wraps a [`MemoryEngine`] and fails writes or deletes on demand.
#[derive(Default)]
pub struct FlakyEngine {
    inner: MemoryEngine,
    fail_writes: AtomicBool,
    fail_deletes: AtomicBool,
}

impl FlakyEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl KvEngine for FlakyEngine {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("disk full");
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            bail!("device busy");
        }
        self.inner.remove(key).await
    }

    async fn clear(&self) -> Result<()> {
        self.inner.clear().await
    }
}

pub fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn complete_draft(date: NaiveDate) -> GoalDraft {
    GoalCategory::ALL
        .iter()
        .fold(GoalDraft::new(date), |draft, category| draft.check(*category))
}

/// A record as another device would have written it.
pub fn foreign_record(date: NaiveDate, updated_at: &str, exercise: bool) -> GoalRecord {
    let mut record = GoalRecord::empty(date, Utc::now());
    record.exercise = exercise;
    record.updated_at = Some(updated_at.to_string());
    record
}

pub async fn write_json<T: serde::Serialize>(engine: &dyn KvEngine, key: &str, value: &T) {
    engine
        .set(key, serde_json::to_vec(value).unwrap())
        .await
        .unwrap();
}

pub async fn read_goals(engine: &dyn KvEngine, key: &str) -> Option<Vec<GoalRecord>> {
    engine
        .get(key)
        .await
        .unwrap()
        .map(|bytes| serde_json::from_slice(&bytes).unwrap())
}
