//! Read-mostly article catalogue entries. Articles are links to external
//! content and are never merged with the remote store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ArticleCategory {
    Exercise,
    Cognitive,
    Social,
    Sleep,
    Diet,
    General,
}

impl ArticleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleCategory::Exercise => "exercise",
            ArticleCategory::Cognitive => "cognitive",
            ArticleCategory::Social => "social",
            ArticleCategory::Sleep => "sleep",
            ArticleCategory::Diet => "diet",
            ArticleCategory::General => "general",
        }
    }
}

impl fmt::Display for ArticleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArticleCategory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "exercise" => Ok(ArticleCategory::Exercise),
            "cognitive" => Ok(ArticleCategory::Cognitive),
            "social" => Ok(ArticleCategory::Social),
            "sleep" => Ok(ArticleCategory::Sleep),
            "diet" => Ok(ArticleCategory::Diet),
            "general" => Ok(ArticleCategory::General),
            other => Err(format!("unknown article category '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    pub id: String,
    pub title: String,
    pub category: ArticleCategory,
    pub description: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}
