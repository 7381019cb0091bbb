//! Last-write-wins reconciliation of two goal collections keyed by date.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::db::models::GoalRecord;

/// What the merge did with one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDecision {
    LocalOnly,
    RemoteOnly,
    LocalKept,
    RemoteWon,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub decisions: BTreeMap<NaiveDate, MergeDecision>,
}

impl MergeReport {
    fn count(&self, decision: MergeDecision) -> usize {
        self.decisions.values().filter(|d| **d == decision).count()
    }

    pub fn local_only(&self) -> usize {
        self.count(MergeDecision::LocalOnly)
    }

    pub fn remote_only(&self) -> usize {
        self.count(MergeDecision::RemoteOnly)
    }

    pub fn local_kept(&self) -> usize {
        self.count(MergeDecision::LocalKept)
    }

    pub fn remote_won(&self) -> usize {
        self.count(MergeDecision::RemoteWon)
    }

    /// True when the merged collection differs from the local input.
    pub fn changed_local(&self) -> bool {
        self.remote_only() > 0 || self.remote_won() > 0
    }
}

/// Merge `remote` into `local`. Remote wins a date only when its `updatedAt`
/// is strictly newer; ties keep the local record. Output is ordered by date.
pub fn merge(local: &[GoalRecord], remote: &[GoalRecord]) -> Vec<GoalRecord> {
    merge_with_report(local, remote).0
}

pub fn merge_with_report(
    local: &[GoalRecord],
    remote: &[GoalRecord],
) -> (Vec<GoalRecord>, MergeReport) {
    let mut by_date: BTreeMap<NaiveDate, GoalRecord> = BTreeMap::new();
    let mut report = MergeReport::default();

    for record in local {
        by_date.insert(record.date, record.clone());
        report.decisions.insert(record.date, MergeDecision::LocalOnly);
    }

    for incoming in remote {
        match by_date.get(&incoming.date) {
            None => {
                by_date.insert(incoming.date, incoming.clone());
                report.decisions.insert(incoming.date, MergeDecision::RemoteOnly);
            }
            Some(existing) => {
                if incoming.mutation_time() > existing.mutation_time() {
                    by_date.insert(incoming.date, incoming.clone());
                    report.decisions.insert(incoming.date, MergeDecision::RemoteWon);
                } else if report.decisions.get(&incoming.date) == Some(&MergeDecision::LocalOnly) {
                    report.decisions.insert(incoming.date, MergeDecision::LocalKept);
                }
            }
        }
    }

    (by_date.into_values().collect(), report)
}
