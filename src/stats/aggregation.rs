//! Completion and streak calculations. All functions are pure and take
//! `today` explicitly.

use std::collections::HashMap;

use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::db::models::{GoalRecord, GoalStats};

pub const WEEKLY_WINDOW_DAYS: u32 = 7;
pub const MONTHLY_WINDOW_DAYS: u32 = 30;

/// A day counts only when all five goals are checked.
pub fn is_complete(record: &GoalRecord) -> bool {
    record.exercise && record.cognitive && record.social && record.sleep && record.diet
}

fn window_start(today: NaiveDate, window_days: u32) -> Option<NaiveDate> {
    today.checked_sub_days(Days::new(u64::from(window_days.saturating_sub(1))))
}

/// Percentage of records dated in `[today - (window_days - 1), today]` that
/// are complete. An empty window yields 0.
pub fn completion_rate(records: &[GoalRecord], window_days: u32, today: NaiveDate) -> f64 {
    if window_days == 0 {
        return 0.0;
    }
    let Some(start) = window_start(today, window_days) else {
        return 0.0;
    };

    let in_window: Vec<&GoalRecord> = records
        .iter()
        .filter(|record| record.date >= start && record.date <= today)
        .collect();
    if in_window.is_empty() {
        return 0.0;
    }

    let complete = in_window.iter().filter(|record| is_complete(record)).count();
    complete as f64 / in_window.len() as f64 * 100.0
}

/// Consecutive complete days ending today. A missing or incomplete day,
/// today included, ends the streak.
pub fn streak(records: &[GoalRecord], today: NaiveDate) -> u32 {
    let by_date: HashMap<NaiveDate, &GoalRecord> =
        records.iter().map(|record| (record.date, record)).collect();

    let mut count = 0;
    let mut day = today;
    while let Some(record) = by_date.get(&day) {
        if !is_complete(record) {
            break;
        }
        count += 1;
        match day.pred_opt() {
            Some(previous) => day = previous,
            None => break,
        }
    }
    count
}

pub fn compute_stats(records: &[GoalRecord], now: DateTime<Utc>) -> GoalStats {
    let today = now.date_naive();
    GoalStats {
        weekly_completion: completion_rate(records, WEEKLY_WINDOW_DAYS, today),
        monthly_completion: completion_rate(records, MONTHLY_WINDOW_DAYS, today),
        streak: streak(records, today),
        last_updated: now,
    }
}
