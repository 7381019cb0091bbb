//! Daily goal check-in records.
//!
//! The JSON shape is camelCase and is shared by local storage, legacy
//! storage and the remote document store.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::helpers::{parse_datetime, timestamp};
use crate::error::GoalError;

pub const MAX_SLEEP_HOURS: f64 = 24.0;
pub const DIET_RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// The five fixed goal categories of a daily check-in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum GoalCategory {
    Exercise,
    Cognitive,
    Social,
    Sleep,
    Diet,
}

impl GoalCategory {
    pub const ALL: [GoalCategory; 5] = [
        GoalCategory::Exercise,
        GoalCategory::Cognitive,
        GoalCategory::Social,
        GoalCategory::Sleep,
        GoalCategory::Diet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GoalCategory::Exercise => "exercise",
            GoalCategory::Cognitive => "cognitive",
            GoalCategory::Social => "social",
            GoalCategory::Sleep => "sleep",
            GoalCategory::Diet => "diet",
        }
    }
}

impl fmt::Display for GoalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalCategory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "exercise" => Ok(GoalCategory::Exercise),
            "cognitive" => Ok(GoalCategory::Cognitive),
            "social" => Ok(GoalCategory::Social),
            "sleep" => Ok(GoalCategory::Sleep),
            "diet" => Ok(GoalCategory::Diet),
            other => Err(format!("unknown goal category '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalRecord {
    pub id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub exercise: bool,
    #[serde(default)]
    pub cognitive: bool,
    #[serde(default)]
    pub social: bool,
    #[serde(default)]
    pub sleep: bool,
    #[serde(default)]
    pub diet: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_minutes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cognitive_minutes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_new_people: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diet_rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Kept as the raw string so a value written by another client survives
    /// a round trip even when it does not parse.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl GoalRecord {
    /// Wire names of the optional fields a mutation can clear.
    pub const CLEARABLE_FIELDS: [&'static str; 6] = [
        "exerciseMinutes",
        "cognitiveMinutes",
        "socialNewPeople",
        "dietRating",
        "sleepHours",
        "notes",
    ];

    /// A blank check-in for `date` with a fresh id.
    pub fn empty(date: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            id: new_goal_id(),
            date,
            exercise: false,
            cognitive: false,
            social: false,
            sleep: false,
            diet: false,
            exercise_minutes: None,
            cognitive_minutes: None,
            social_new_people: None,
            diet_rating: None,
            sleep_hours: None,
            notes: None,
            updated_at: Some(timestamp(now)),
        }
    }

    pub fn is_checked(&self, category: GoalCategory) -> bool {
        match category {
            GoalCategory::Exercise => self.exercise,
            GoalCategory::Cognitive => self.cognitive,
            GoalCategory::Social => self.social,
            GoalCategory::Sleep => self.sleep,
            GoalCategory::Diet => self.diet,
        }
    }

    /// Set a flag. Unchecking also clears the category's metric.
    pub fn set_checked(&mut self, category: GoalCategory, checked: bool) {
        match category {
            GoalCategory::Exercise => self.exercise = checked,
            GoalCategory::Cognitive => self.cognitive = checked,
            GoalCategory::Social => self.social = checked,
            GoalCategory::Sleep => self.sleep = checked,
            GoalCategory::Diet => self.diet = checked,
        }
        if !checked {
            self.clear_metric(category);
        }
    }

    fn clear_metric(&mut self, category: GoalCategory) {
        match category {
            GoalCategory::Exercise => self.exercise_minutes = None,
            GoalCategory::Cognitive => self.cognitive_minutes = None,
            GoalCategory::Social => self.social_new_people = None,
            GoalCategory::Sleep => self.sleep_hours = None,
            GoalCategory::Diet => self.diet_rating = None,
        }
    }

    /// The category's metric as a number, only when the flag is set.
    pub fn metric(&self, category: GoalCategory) -> Option<f64> {
        if !self.is_checked(category) {
            return None;
        }
        match category {
            GoalCategory::Exercise => self.exercise_minutes,
            GoalCategory::Cognitive => self.cognitive_minutes,
            GoalCategory::Social => self.social_new_people.map(f64::from),
            GoalCategory::Sleep => self.sleep_hours,
            GoalCategory::Diet => self.diet_rating.map(f64::from),
        }
    }

    pub fn checked_count(&self) -> usize {
        GoalCategory::ALL
            .iter()
            .filter(|category| self.is_checked(**category))
            .count()
    }

    /// Mutation time used by the merge; missing or unparseable values count as the epoch.
    pub fn mutation_time(&self) -> DateTime<Utc> {
        self.updated_at
            .as_deref()
            .and_then(|raw| parse_datetime(raw, "updatedAt").ok())
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(timestamp(now));
    }
}

pub fn new_goal_id() -> String {
    format!("goal_{}", Uuid::new_v4())
}

/// Metric values supplied alongside a checked category.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalMetrics {
    #[serde(default)]
    pub exercise_minutes: Option<f64>,
    #[serde(default)]
    pub cognitive_minutes: Option<f64>,
    #[serde(default)]
    pub social_new_people: Option<u32>,
    #[serde(default)]
    pub diet_rating: Option<u8>,
    #[serde(default)]
    pub sleep_hours: Option<f64>,
}

impl GoalMetrics {
    fn validate(&self) -> Result<(), GoalError> {
        if let Some(minutes) = self.exercise_minutes {
            non_negative("exerciseMinutes", minutes)?;
        }
        if let Some(minutes) = self.cognitive_minutes {
            non_negative("cognitiveMinutes", minutes)?;
        }
        if let Some(hours) = self.sleep_hours {
            non_negative("sleepHours", hours)?;
            if hours > MAX_SLEEP_HOURS {
                return Err(GoalError::InvalidMetric {
                    field: "sleepHours",
                    reason: format!("Sleep hours must be between 0 and {MAX_SLEEP_HOURS}."),
                });
            }
        }
        if let Some(rating) = self.diet_rating {
            if !DIET_RATING_RANGE.contains(&rating) {
                return Err(GoalError::InvalidMetric {
                    field: "dietRating",
                    reason: "Diet rating must be between 1 and 5.".into(),
                });
            }
        }
        Ok(())
    }

    /// Copy supplied metrics onto `record`. A metric for an unchecked
    /// category is rejected rather than silently stored.
    fn apply_to(&self, record: &mut GoalRecord) -> Result<(), GoalError> {
        self.validate()?;
        if let Some(value) = self.exercise_minutes {
            require_checked(record, GoalCategory::Exercise, "exerciseMinutes")?;
            record.exercise_minutes = Some(value);
        }
        if let Some(value) = self.cognitive_minutes {
            require_checked(record, GoalCategory::Cognitive, "cognitiveMinutes")?;
            record.cognitive_minutes = Some(value);
        }
        if let Some(value) = self.social_new_people {
            require_checked(record, GoalCategory::Social, "socialNewPeople")?;
            record.social_new_people = Some(value);
        }
        if let Some(value) = self.diet_rating {
            require_checked(record, GoalCategory::Diet, "dietRating")?;
            record.diet_rating = Some(value);
        }
        if let Some(value) = self.sleep_hours {
            require_checked(record, GoalCategory::Sleep, "sleepHours")?;
            record.sleep_hours = Some(value);
        }
        Ok(())
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), GoalError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(GoalError::InvalidMetric {
            field,
            reason: "Please enter a number of zero or more.".into(),
        })
    }
}

fn require_checked(
    record: &GoalRecord,
    category: GoalCategory,
    field: &'static str,
) -> Result<(), GoalError> {
    if record.is_checked(category) {
        Ok(())
    } else {
        Err(GoalError::InvalidMetric {
            field,
            reason: format!("Check the {category} goal before recording its details."),
        })
    }
}

/// Everything needed to create a record except its id and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalDraft {
    pub date: NaiveDate,
    #[serde(default)]
    pub checked: Vec<GoalCategory>,
    #[serde(default, flatten)]
    pub metrics: GoalMetrics,
    #[serde(default)]
    pub notes: Option<String>,
}

impl GoalDraft {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            checked: Vec::new(),
            metrics: GoalMetrics::default(),
            notes: None,
        }
    }

    pub fn check(mut self, category: GoalCategory) -> Self {
        if !self.checked.contains(&category) {
            self.checked.push(category);
        }
        self
    }

    pub fn with_metrics(mut self, metrics: GoalMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn into_record(self, now: DateTime<Utc>) -> Result<GoalRecord, GoalError> {
        let mut record = GoalRecord::empty(self.date, now);
        for category in &self.checked {
            record.set_checked(*category, true);
        }
        self.metrics.apply_to(&mut record)?;
        record.notes = self.notes.filter(|notes| !notes.trim().is_empty());
        Ok(record)
    }
}

/// A partial update. `None` leaves a field untouched; an empty `notes`
/// string clears the notes. The date is the natural key and cannot change.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalPatch {
    #[serde(default)]
    pub exercise: Option<bool>,
    #[serde(default)]
    pub cognitive: Option<bool>,
    #[serde(default)]
    pub social: Option<bool>,
    #[serde(default)]
    pub sleep: Option<bool>,
    #[serde(default)]
    pub diet: Option<bool>,
    #[serde(default, flatten)]
    pub metrics: GoalMetrics,
    #[serde(default)]
    pub notes: Option<String>,
}

impl GoalPatch {
    pub fn set(mut self, category: GoalCategory, checked: bool) -> Self {
        let slot = match category {
            GoalCategory::Exercise => &mut self.exercise,
            GoalCategory::Cognitive => &mut self.cognitive,
            GoalCategory::Social => &mut self.social,
            GoalCategory::Sleep => &mut self.sleep,
            GoalCategory::Diet => &mut self.diet,
        };
        *slot = Some(checked);
        self
    }

    pub fn with_metrics(mut self, metrics: GoalMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Apply to `record` and refresh its `updatedAt`.
    pub fn apply(&self, record: &mut GoalRecord, now: DateTime<Utc>) -> Result<(), GoalError> {
        let flags = [
            (GoalCategory::Exercise, self.exercise),
            (GoalCategory::Cognitive, self.cognitive),
            (GoalCategory::Social, self.social),
            (GoalCategory::Sleep, self.sleep),
            (GoalCategory::Diet, self.diet),
        ];
        for (category, value) in flags {
            if let Some(checked) = value {
                record.set_checked(category, checked);
            }
        }
        self.metrics.apply_to(record)?;
        if let Some(notes) = &self.notes {
            record.notes = if notes.trim().is_empty() {
                None
            } else {
                Some(notes.clone())
            };
        }
        record.touch(now);
        Ok(())
    }
}
