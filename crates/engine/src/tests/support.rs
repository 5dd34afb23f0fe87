//! In-memory collaborators for engine scenario tests.

use std::collections::{HashMap, HashSet};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::collaborative::AffinityPredictor;
use crate::store::{ArticleStore, EmbeddingSource, InteractionStore};
use crate::types::{Article, Interaction};

pub const MS_PER_DAY: i64 = 86_400_000;

/// Article catalog plus interaction log backed by plain vectors.
pub struct MemoryData {
    pub articles: Vec<Article>,
    pub interactions: Vec<Interaction>,
}

impl MemoryData {
    pub fn new(articles: Vec<Article>, interactions: Vec<Interaction>) -> Self {
        Self {
            articles,
            interactions,
        }
    }
}

#[async_trait]
impl ArticleStore for MemoryData {
    async fn get_all_articles(&self) -> Result<Vec<Article>> {
        Ok(self.articles.clone())
    }
}

#[async_trait]
impl InteractionStore for MemoryData {
    async fn get_all_interactions(&self) -> Result<Vec<Interaction>> {
        Ok(self.interactions.clone())
    }

    async fn get_clicked_by_user(&self, user_id: i64) -> Result<Vec<i64>> {
        let mut clicks: Vec<&Interaction> = self
            .interactions
            .iter()
            .filter(|i| i.user_id == user_id)
            .collect();
        clicks.sort_by_key(|i| std::cmp::Reverse(i.timestamp_ms));

        let mut seen = HashSet::new();
        Ok(clicks
            .into_iter()
            .filter(|i| seen.insert(i.article_id))
            .map(|i| i.article_id)
            .collect())
    }

    async fn get_last_clicked(&self, user_id: i64) -> Result<Option<i64>> {
        Ok(self
            .interactions
            .iter()
            .filter(|i| i.user_id == user_id)
            .max_by_key(|i| i.timestamp_ms)
            .map(|i| i.article_id))
    }
}

/// Interaction store whose per-user lookups always fail; the bulk log load
/// still succeeds so engine construction works.
pub struct FailingHistoryStore(pub MemoryData);

#[async_trait]
impl InteractionStore for FailingHistoryStore {
    async fn get_all_interactions(&self) -> Result<Vec<Interaction>> {
        self.0.get_all_interactions().await
    }

    async fn get_clicked_by_user(&self, _user_id: i64) -> Result<Vec<i64>> {
        Err(anyhow!("history lookup unavailable"))
    }

    async fn get_last_clicked(&self, _user_id: i64) -> Result<Option<i64>> {
        Err(anyhow!("last-click lookup unavailable"))
    }
}

pub struct MapEmbeddings(pub HashMap<i64, Vec<f32>>);

#[async_trait]
impl EmbeddingSource for MapEmbeddings {
    async fn load(&self) -> Result<HashMap<i64, Vec<f32>>> {
        Ok(self.0.clone())
    }
}

/// Predictor with a fixed per-article score table; users are ignored.
pub struct ScriptedPredictor {
    pub scores: HashMap<i64, f64>,
}

impl ScriptedPredictor {
    pub fn empty() -> Self {
        Self {
            scores: HashMap::new(),
        }
    }

    pub fn new(entries: &[(i64, f64)]) -> Self {
        Self {
            scores: entries.iter().copied().collect(),
        }
    }
}

impl AffinityPredictor for ScriptedPredictor {
    fn predict(&self, _user_id: i64, article_id: i64) -> f64 {
        self.scores.get(&article_id).copied().unwrap_or(0.0)
    }

    fn knows(&self, article_id: i64) -> bool {
        self.scores.contains_key(&article_id)
    }
}

pub fn article(article_id: i64, created_day: i64) -> Article {
    Article {
        article_id,
        created_at_ms: created_day * MS_PER_DAY,
    }
}

pub fn click(user_id: i64, article_id: i64, timestamp_ms: i64) -> Interaction {
    Interaction {
        user_id,
        session_id: 1,
        article_id,
        timestamp_ms,
    }
}
