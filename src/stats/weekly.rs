//! Sunday to Saturday summaries compared with the preceding week.

use chrono::{Datelike, Days, NaiveDate};

use crate::db::models::{GoalCategory, GoalRecord};
use crate::stats::aggregation::is_complete;
use crate::stats::types::{WeekComparison, WeeklySummary};

pub const DAYS_PER_WEEK: u64 = 7;
pub const DEFAULT_EXERCISE_GOAL_MINUTES: f64 = 150.0;

/// The Sunday on or before `date`.
pub fn week_start_for(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_sunday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

fn week_end(week_start: NaiveDate) -> NaiveDate {
    week_start
        .checked_add_days(Days::new(DAYS_PER_WEEK - 1))
        .unwrap_or(week_start)
}

/// Records dated within the 7 days starting at `week_start`.
pub fn records_in_week(records: &[GoalRecord], week_start: NaiveDate) -> Vec<GoalRecord> {
    let end = week_end(week_start);
    records
        .iter()
        .filter(|record| record.date >= week_start && record.date <= end)
        .cloned()
        .collect()
}

#[derive(Debug, Default, Clone, Copy)]
struct WeekMetrics {
    exercise_total: f64,
    cognitive_average: f64,
    social_total: f64,
    diet_average: f64,
    sleep_average: f64,
}

fn metric_values(records: &[GoalRecord], category: GoalCategory) -> Vec<f64> {
    records
        .iter()
        .filter_map(|record| record.metric(category))
        .collect()
}

fn total(values: &[f64]) -> f64 {
    values.iter().sum()
}

fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        round1(total(values) / values.len() as f64)
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl WeekMetrics {
    fn from_records(records: &[GoalRecord]) -> Self {
        Self {
            exercise_total: total(&metric_values(records, GoalCategory::Exercise)),
            cognitive_average: average(&metric_values(records, GoalCategory::Cognitive)),
            social_total: total(&metric_values(records, GoalCategory::Social)),
            diet_average: average(&metric_values(records, GoalCategory::Diet)),
            sleep_average: average(&metric_values(records, GoalCategory::Sleep)),
        }
    }
}

pub fn compare(current: f64, previous: f64) -> WeekComparison {
    let difference = round1(current - previous);
    let percent_change = if previous == 0.0 {
        if current > 0.0 {
            100.0
        } else {
            0.0
        }
    } else {
        round1((current - previous) / previous * 100.0)
    };
    WeekComparison {
        current,
        previous,
        difference,
        percent_change,
        improved: difference > 0.0,
    }
}

/// Summary for the week starting at `week_start`. Comparisons are present
/// only when the preceding 7 days hold at least one record.
pub fn weekly_summary(
    week_start: NaiveDate,
    records: &[GoalRecord],
    exercise_goal_minutes: f64,
) -> WeeklySummary {
    let current = records_in_week(records, week_start);
    let previous_start = week_start
        .checked_sub_days(Days::new(DAYS_PER_WEEK))
        .unwrap_or(week_start);
    let previous = if previous_start < week_start {
        records_in_week(records, previous_start)
    } else {
        Vec::new()
    };

    let now = WeekMetrics::from_records(&current);
    let complete_days = current.iter().filter(|record| is_complete(record)).count();
    let completion_rate = (complete_days as f64 / DAYS_PER_WEEK as f64 * 100.0).round() as u32;

    let is_first_week = previous.is_empty();
    let before = WeekMetrics::from_records(&previous);
    let comparison = |current: f64, previous: f64| {
        (!is_first_week).then(|| compare(current, previous))
    };

    WeeklySummary {
        week_start,
        week_end: week_end(week_start),
        completion_rate,
        exercise_total: now.exercise_total,
        exercise_goal_met: now.exercise_total >= exercise_goal_minutes,
        cognitive_average: now.cognitive_average,
        social_total: now.social_total,
        diet_average: now.diet_average,
        sleep_average: now.sleep_average,
        exercise_comparison: comparison(now.exercise_total, before.exercise_total),
        cognitive_comparison: comparison(now.cognitive_average, before.cognitive_average),
        social_comparison: comparison(now.social_total, before.social_total),
        diet_comparison: comparison(now.diet_average, before.diet_average),
        sleep_comparison: comparison(now.sleep_average, before.sleep_average),
        is_first_week,
    }
}
