use crate::articles::default_articles;
use crate::db::{models::ArticleRecord, partition::LogicalKey, store::RecordStore};
use crate::error::StorageFailure;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

impl RecordStore {
    /// Article collection. The first read seeds and persists the bundled
    /// defaults; any read failure falls back to the defaults.
    pub async fn get_articles(&self) -> Vec<ArticleRecord> {
        match self.get::<Vec<ArticleRecord>>(LogicalKey::Articles).await {
            Ok(Some(articles)) => articles,
            Ok(None) => {
                let defaults = default_articles();
                match self.save_articles(&defaults).await {
                    Ok(()) => log_info!("[articles] seeded {} default articles", defaults.len()),
                    Err(err) => log_warn!("[articles] failed to seed defaults: {}", err),
                }
                defaults
            }
            Err(err) => {
                log_warn!("[articles] falling back to defaults: {}", err);
                default_articles()
            }
        }
    }

    pub async fn save_articles(&self, articles: &[ArticleRecord]) -> Result<(), StorageFailure> {
        self.set(LogicalKey::Articles, articles).await
    }
}
