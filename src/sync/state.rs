//! Per-record sync lifecycle, tracked in memory for the current session.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDate;
use serde::Serialize;

use crate::sync::merge::{MergeDecision, MergeReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncState {
    /// Written locally, never pushed.
    LocalOnly,
    /// Local copy matches what was last pushed or pulled.
    Synced,
    /// Edited locally after the last successful push.
    LocalDirty,
    /// Replaced by a newer remote copy during a pull.
    MergedRemote,
}

impl SyncState {
    pub fn after_local_edit(self) -> SyncState {
        match self {
            SyncState::LocalOnly => SyncState::LocalOnly,
            SyncState::Synced | SyncState::LocalDirty | SyncState::MergedRemote => {
                SyncState::LocalDirty
            }
        }
    }

    pub fn after_push(self) -> SyncState {
        SyncState::Synced
    }

    /// `None` when the merge left the record untouched.
    pub fn after_merge(self, decision: MergeDecision) -> Option<SyncState> {
        match decision {
            MergeDecision::RemoteWon => Some(SyncState::MergedRemote),
            MergeDecision::RemoteOnly => Some(SyncState::Synced),
            MergeDecision::LocalOnly | MergeDecision::LocalKept => None,
        }
    }
}

/// Sync state per record date. Dates never seen are `LocalOnly`.
#[derive(Debug, Default)]
pub struct SyncLedger {
    states: Mutex<HashMap<NaiveDate, SyncState>>,
}

impl SyncLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, date: NaiveDate) -> SyncState {
        self.states
            .lock()
            .ok()
            .and_then(|states| states.get(&date).copied())
            .unwrap_or(SyncState::LocalOnly)
    }

    fn transition(&self, date: NaiveDate, step: impl FnOnce(SyncState) -> Option<SyncState>) {
        let mut states = match self.states.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let current = states.get(&date).copied().unwrap_or(SyncState::LocalOnly);
        if let Some(next) = step(current) {
            states.insert(date, next);
        }
    }

    pub fn record_local_edit(&self, date: NaiveDate) {
        self.transition(date, |state| Some(state.after_local_edit()));
    }

    pub fn record_push(&self, date: NaiveDate) {
        self.transition(date, |state| Some(state.after_push()));
    }

    pub fn record_merge(&self, report: &MergeReport) {
        for (date, decision) in &report.decisions {
            self.transition(*date, |state| state.after_merge(*decision));
        }
    }

    pub fn clear(&self) {
        if let Ok(mut states) = self.states.lock() {
            states.clear();
        }
    }
}
