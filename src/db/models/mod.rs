pub mod article;
pub mod goal;
pub mod profile;
pub mod stats;

pub use article::{ArticleCategory, ArticleRecord};
pub use goal::{GoalCategory, GoalDraft, GoalMetrics, GoalPatch, GoalRecord};
pub use profile::{DeviceInfo, Preferences, Profile, Theme};
pub use stats::GoalStats;
