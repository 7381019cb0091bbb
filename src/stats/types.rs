use chrono::NaiveDate;
use serde::Serialize;

/// One category's current week against the week before.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekComparison {
    pub current: f64,
    pub previous: f64,
    pub difference: f64,
    pub percent_change: f64,
    pub improved: bool,
}

/// Computed on demand for a Sunday to Saturday week; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySummary {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub completion_rate: u32,
    pub exercise_total: f64,
    pub exercise_goal_met: bool,
    pub cognitive_average: f64,
    pub social_total: f64,
    pub diet_average: f64,
    pub sleep_average: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise_comparison: Option<WeekComparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cognitive_comparison: Option<WeekComparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social_comparison: Option<WeekComparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diet_comparison: Option<WeekComparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_comparison: Option<WeekComparison>,
    pub is_first_week: bool,
}
