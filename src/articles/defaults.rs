use crate::db::models::{ArticleCategory, ArticleRecord};

struct Seed {
    id: &'static str,
    title: &'static str,
    category: ArticleCategory,
    description: &'static str,
    url: &'static str,
    source: &'static str,
}

const SEEDS: [Seed; 5] = [
    Seed {
        id: "exercise_nia",
        title: "Exercise and Physical Activity",
        category: ArticleCategory::Exercise,
        description: "Learn about the four main types of exercise and how they can help maintain and improve your health as you age.",
        url: "https://www.nia.nih.gov/health/exercise-physical-activity",
        source: "National Institute on Aging",
    },
    Seed {
        id: "sleep_cdc",
        title: "Sleep and Brain Health",
        category: ArticleCategory::Sleep,
        description: "Discover how quality sleep impacts brain health and learn practical tips for better sleep habits.",
        url: "https://www.cdc.gov/sleep/about_sleep/index.html",
        source: "CDC",
    },
    Seed {
        id: "cognitive_ncbi",
        title: "Cognitive Training in Older Adults",
        category: ArticleCategory::Cognitive,
        description: "Research on cognitive training methods and their effectiveness in maintaining brain health.",
        url: "https://www.ncbi.nlm.nih.gov/pmc/articles/PMC3386797/",
        source: "NIH",
    },
    Seed {
        id: "nutrition_harvard",
        title: "The MIND Diet and Brain Health",
        category: ArticleCategory::Diet,
        description: "Explore the MIND diet and its potential benefits for brain health and cognitive function.",
        url: "https://www.health.harvard.edu/blog/mind-diet-may-protect-against-alzheimers-201502148735",
        source: "Harvard Health",
    },
    Seed {
        id: "social_nia",
        title: "Social Connections and Cognitive Health",
        category: ArticleCategory::Social,
        description: "Understanding the vital link between social connections and cognitive health in older adults.",
        url: "https://www.nia.nih.gov/health/cognitive-health/social-activities",
        source: "National Institute on Aging",
    },
];

/// The bundled catalogue used to seed a fresh store.
pub fn default_articles() -> Vec<ArticleRecord> {
    SEEDS
        .iter()
        .map(|seed| ArticleRecord {
            id: seed.id.to_string(),
            title: seed.title.to_string(),
            category: seed.category,
            description: seed.description.to_string(),
            url: seed.url.to_string(),
            image_url: None,
            source: Some(seed.source.to_string()),
        })
        .collect()
}
