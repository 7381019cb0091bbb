pub mod aggregation;
pub mod types;
pub mod weekly;

pub use aggregation::{completion_rate, compute_stats, is_complete, streak};
pub use types::{WeekComparison, WeeklySummary};
pub use weekly::{records_in_week, week_start_for, weekly_summary, DEFAULT_EXERCISE_GOAL_MINUTES};
