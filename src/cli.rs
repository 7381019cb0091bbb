//! Command-line front end over [`App`].

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde_json::json;

use crate::app::App;
use crate::articles::ArticleFilter;
use crate::db::{models::ArticleCategory, Database, GoalCategory, GoalMetrics};
use crate::settings::SettingsStore;
use crate::stats::week_start_for;
use crate::sync::{RemoteDocumentStore, RestDocumentStore};

const ENABLE_LOGS: bool = true;

use crate::log_info;

pub const DATABASE_FILE: &str = "goalsync.sqlite3";
pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Parser)]
#[command(name = "goalsync", version, about = "Offline-first daily goal tracker")]
pub struct Cli {
    /// Directory holding the database and settings file.
    #[arg(long, env = "GOALSYNC_DATA_DIR", default_value = ".goalsync")]
    pub data_dir: PathBuf,

    /// Signed-in user. Without one everything stays local.
    #[arg(long, env = "GOALSYNC_USER_ID")]
    pub user_id: Option<String>,

    /// Remote document store base URL; overrides the settings file.
    #[arg(long, env = "GOALSYNC_REMOTE_URL")]
    pub remote_url: Option<String>,

    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start-up report, today's record and current stats.
    Status,
    /// Mark a category done, optionally with its metric.
    Check {
        category: GoalCategory,
        #[arg(long)]
        value: Option<f64>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    Uncheck {
        category: GoalCategory,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Weekly summary; defaults to the current week.
    Summary {
        #[arg(long)]
        week_start: Option<NaiveDate>,
    },
    /// Legacy key restructuring status for the user.
    Migration {
        #[arg(long)]
        rollback: bool,
    },
    Articles {
        #[arg(long)]
        category: Option<ArticleCategory>,
        #[arg(long)]
        search: Option<String>,
    },
    Health,
}

/// Metric for one category from a plain number. Counts and ratings must
/// be whole numbers.
pub fn metrics_for(category: GoalCategory, value: Option<f64>) -> Result<GoalMetrics> {
    let mut metrics = GoalMetrics::default();
    let Some(value) = value else {
        return Ok(metrics);
    };

    match category {
        GoalCategory::Exercise => metrics.exercise_minutes = Some(value),
        GoalCategory::Cognitive => metrics.cognitive_minutes = Some(value),
        GoalCategory::Sleep => metrics.sleep_hours = Some(value),
        GoalCategory::Social => {
            if value.fract() != 0.0 || value < 0.0 || value > f64::from(u32::MAX) {
                bail!("social value must be a whole number of people, got {value}");
            }
            metrics.social_new_people = Some(value as u32);
        }
        GoalCategory::Diet => {
            if value.fract() != 0.0 || !(0.0..=f64::from(u8::MAX)).contains(&value) {
                bail!("diet value must be a whole rating, got {value}");
            }
            metrics.diet_rating = Some(value as u8);
        }
    }
    Ok(metrics)
}

fn open_app(cli: &Cli) -> Result<App> {
    std::fs::create_dir_all(&cli.data_dir)
        .with_context(|| format!("failed to create data dir {}", cli.data_dir.display()))?;

    let settings = Arc::new(SettingsStore::new(cli.data_dir.join(SETTINGS_FILE))?);
    let database = Database::new(cli.data_dir.join(DATABASE_FILE))?;

    let mut remote_settings = settings.remote();
    if let Some(url) = &cli.remote_url {
        remote_settings.base_url = Some(url.clone());
    }
    let remote: Option<Arc<dyn RemoteDocumentStore>> = match remote_settings.client_config() {
        Some(config) => {
            log_info!("[cli] syncing with {}", config.base_url);
            Some(Arc::new(RestDocumentStore::new(config)?))
        }
        None => None,
    };

    Ok(App::open(settings, Arc::new(database), remote))
}

/// Run one command and return what should be printed.
pub async fn execute(cli: Cli) -> Result<String> {
    let app = open_app(&cli)?;
    let today = Utc::now().date_naive();

    // The migration command inspects storage as it is, before start-up
    // would restructure it.
    let startup = match cli.command {
        Command::Migration { .. } => None,
        _ => Some(app.start(cli.user_id.as_deref()).await),
    };

    let output = match cli.command {
        Command::Status => json!({
            "startup": startup,
            "today": app.goals().get_goal_by_date(today).await,
            "stats": app.goals().stats().await,
        }),
        Command::Check {
            category,
            value,
            date,
        } => {
            let metrics = metrics_for(category, value)?;
            let date = date.unwrap_or(today);
            let record = app
                .goals()
                .set_category(date, category, true, metrics)
                .await
                .map_err(|err| anyhow::anyhow!(err.readable_message()))?;
            app.goals().wait_for_push().await;
            json!({ "goal": record, "stats": app.goals().stats().await })
        }
        Command::Uncheck { category, date } => {
            let date = date.unwrap_or(today);
            let record = app
                .goals()
                .set_category(date, category, false, GoalMetrics::default())
                .await
                .map_err(|err| anyhow::anyhow!(err.readable_message()))?;
            app.goals().wait_for_push().await;
            json!({ "goal": record, "stats": app.goals().stats().await })
        }
        Command::Summary { week_start } => {
            let week_start = week_start_for(week_start.unwrap_or(today));
            let unseen = app.settings().is_summary_unseen(week_start);
            let summary = app.goals().calculate_weekly_summary(week_start).await;
            app.settings().mark_summary_viewed(week_start)?;
            json!({ "summary": summary, "unseen": unseen })
        }
        Command::Articles { category, search } => {
            let filter = ArticleFilter {
                category,
                query: search,
            };
            json!(app.articles().filtered(&filter).await)
        }
        Command::Health => json!(app.health().await),
        Command::Migration { rollback } => {
            let Some(user_id) = cli.user_id.as_deref() else {
                bail!("migration needs --user-id");
            };
            if rollback {
                app.migration().rollback(user_id).await?;
            }
            json!(app.migration().status(user_id).await?)
        }
    };

    Ok(serde_json::to_string_pretty(&output)?)
}
