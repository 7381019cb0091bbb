//! Read-mostly article library. Articles are local only; the remote store
//! never sees them.

mod defaults;

use std::sync::Arc;

use crate::db::models::{ArticleCategory, ArticleRecord};
use crate::db::store::RecordStore;
use crate::error::StorageFailure;

pub use defaults::default_articles;

const ENABLE_LOGS: bool = true;

use crate::log_info;

/// Category and free-text filter. An empty query matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleFilter {
    pub category: Option<ArticleCategory>,
    pub query: Option<String>,
}

impl ArticleFilter {
    fn matches(&self, article: &ArticleRecord) -> bool {
        if let Some(category) = self.category {
            if article.category != category {
                return false;
            }
        }
        match self.query.as_deref().map(str::trim) {
            Some(query) if !query.is_empty() => {
                let needle = query.to_lowercase();
                article.title.to_lowercase().contains(&needle)
                    || article.description.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }
}

pub fn filter_articles(articles: &[ArticleRecord], filter: &ArticleFilter) -> Vec<ArticleRecord> {
    articles
        .iter()
        .filter(|article| filter.matches(article))
        .cloned()
        .collect()
}

pub struct ArticleLibrary {
    store: Arc<RecordStore>,
}

impl ArticleLibrary {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    pub async fn all(&self) -> Vec<ArticleRecord> {
        self.store.get_articles().await
    }

    pub async fn filtered(&self, filter: &ArticleFilter) -> Vec<ArticleRecord> {
        filter_articles(&self.all().await, filter)
    }

    pub async fn reset_to_defaults(&self) -> Result<Vec<ArticleRecord>, StorageFailure> {
        let defaults = default_articles();
        self.store.save_articles(&defaults).await?;
        log_info!("[articles] restored {} default articles", defaults.len());
        Ok(defaults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::engine::MemoryEngine;

    #[test]
    fn defaults_cover_each_goal_category() {
        let articles = default_articles();
        assert_eq!(articles.len(), 5);
        for category in [
            ArticleCategory::Exercise,
            ArticleCategory::Cognitive,
            ArticleCategory::Social,
            ArticleCategory::Sleep,
            ArticleCategory::Diet,
        ] {
            assert!(articles.iter().any(|a| a.category == category));
        }
    }

    #[test]
    fn filter_by_category_and_query() {
        let articles = default_articles();

        let sleep = filter_articles(
            &articles,
            &ArticleFilter {
                category: Some(ArticleCategory::Sleep),
                query: None,
            },
        );
        assert_eq!(sleep.len(), 1);
        assert_eq!(sleep[0].id, "sleep_cdc");

        let brain = filter_articles(
            &articles,
            &ArticleFilter {
                category: None,
                query: Some("MIND diet".into()),
            },
        );
        assert_eq!(brain.len(), 1);
        assert_eq!(brain[0].id, "nutrition_harvard");

        let none = filter_articles(
            &articles,
            &ArticleFilter {
                category: Some(ArticleCategory::General),
                query: None,
            },
        );
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn reset_restores_defaults() {
        let store = Arc::new(RecordStore::new(Arc::new(MemoryEngine::new())));
        store.save_articles(&[]).await.unwrap();
        let library = ArticleLibrary::new(Arc::clone(&store));
        assert!(library.all().await.is_empty());

        library.reset_to_defaults().await.unwrap();
        assert_eq!(library.all().await.len(), 5);
    }
}
