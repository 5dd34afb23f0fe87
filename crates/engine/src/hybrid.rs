//! Hybrid blending of freshness, popularity, content and collaborative
//! signals.
//!
//! The blender is the top-level orchestrator: it gathers every available
//! signal column for the article set, computes adaptive weights from the
//! requesting user's history depth, merges, ranks and truncates. A missing
//! signal never fails a request; only unavailable base data does, and only
//! at construction.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::collaborative::{AffinityPredictor, CollaborativeEngine};
use crate::content_based::ContentSimilarityEngine;
use crate::scores::{compute_base_scores, BaseScores};
use crate::store::{ArticleStore, EmbeddingSource, InteractionStore};
use crate::types::RankedArticle;

/// Collaborative ramp steepness and center: personalization only dominates
/// once a user has an established history of about 8 clicks.
const CF_RAMP_STEEPNESS: f64 = 0.3;
const CF_RAMP_CENTER: f64 = 8.0;
const CB_WEIGHT_MARGIN: f64 = 0.2;
const CB_WEIGHT_CAP: f64 = 0.5;
const FRESH_POP_FLOOR: f64 = 0.2;

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Per-request signal weights, non-negative and summing to 1.
///
/// Absent columns carry weight 0 and the remainder is renormalized, so the
/// invariant holds whatever subset of signals resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalWeights {
    pub freshness: f64,
    pub popularity: f64,
    pub content: f64,
    pub collaborative: f64,
}

impl SignalWeights {
    /// Adaptive weights from history depth (the number of distinct articles
    /// the user has clicked) and the set of columns actually present.
    pub fn compute(history_depth: usize, has_content: bool, has_collaborative: bool) -> Self {
        let cf = if history_depth > 0 {
            sigmoid(CF_RAMP_STEEPNESS * (history_depth as f64 - CF_RAMP_CENTER))
        } else {
            0.0
        };
        let cb = (cf + CB_WEIGHT_MARGIN).min(CB_WEIGHT_CAP);
        let fresh_pop = (1.0 - cf).max(FRESH_POP_FLOOR);

        let mut weights = Self {
            freshness: fresh_pop / 2.0,
            popularity: fresh_pop / 2.0,
            content: if has_content { cb } else { 0.0 },
            collaborative: if has_collaborative { cf } else { 0.0 },
        };

        let sum = weights.sum();
        if sum > 0.0 {
            weights.freshness /= sum;
            weights.popularity /= sum;
            weights.content /= sum;
            weights.collaborative /= sum;
        }
        weights
    }

    pub fn sum(&self) -> f64 {
        self.freshness + self.popularity + self.content + self.collaborative
    }
}

/// The assembled recommendation engine.
///
/// All base tables are immutable after construction; a single instance can
/// serve concurrent requests without synchronization. Refresh by building a
/// new instance.
pub struct HybridEngine {
    /// Ascending article ids, the full catalog.
    articles: Vec<i64>,
    base: HashMap<i64, BaseScores>,
    content: ContentSimilarityEngine,
    collaborative: CollaborativeEngine,
    interactions: Arc<dyn InteractionStore>,
    n_recs: usize,
}

impl HybridEngine {
    /// Build the engine from its collaborators. Any store failure here is
    /// fatal and propagates to the caller.
    pub async fn new(
        articles: &dyn ArticleStore,
        interactions: Arc<dyn InteractionStore>,
        embeddings: &dyn EmbeddingSource,
        predictor: Box<dyn AffinityPredictor>,
        n_recs: usize,
    ) -> Result<Self> {
        let catalog = articles
            .get_all_articles()
            .await
            .context("loading article metadata")?;
        let log = interactions
            .get_all_interactions()
            .await
            .context("loading interaction log")?;
        let embedding_table = embeddings
            .load()
            .await
            .context("loading article embeddings")?;

        let base = compute_base_scores(&catalog, &log);
        let content = ContentSimilarityEngine::new(&catalog, &embedding_table);

        let mut ids: Vec<i64> = catalog.iter().map(|a| a.article_id).collect();
        ids.sort_unstable();
        ids.dedup();

        tracing::info!(
            articles = ids.len(),
            interactions = log.len(),
            embedded = content.len(),
            "hybrid engine initialized"
        );

        Ok(Self {
            articles: ids,
            base,
            content,
            collaborative: CollaborativeEngine::new(predictor),
            interactions,
            n_recs,
        })
    }

    /// Recommend up to `n_recs` articles for an optional user and/or
    /// reference article.
    ///
    /// Freshness and popularity always contribute; content similarity joins
    /// when a reference article resolves (explicit argument wins, else the
    /// user's last click) and collaborative affinity joins when the user has
    /// at least one prior click. Unresolvable references degrade the signal
    /// set, they never fail the request.
    pub async fn recommend(
        &self,
        user_id: Option<i64>,
        article_id: Option<i64>,
    ) -> Result<Vec<RankedArticle>> {
        tracing::debug!(?user_id, ?article_id, "recommendation request");

        let reference = match article_id {
            Some(id) => Some(id),
            None => match user_id {
                Some(uid) => match self.interactions.get_last_clicked(uid).await {
                    Ok(last) => last,
                    Err(error) => {
                        tracing::warn!(user_id = uid, %error, "could not resolve last click");
                        None
                    }
                },
                None => None,
            },
        };

        let content_scores: Option<HashMap<i64, f64>> = reference.and_then(|id| {
            let similar = self.content.recommend(id, None);
            if similar.is_empty() {
                tracing::debug!(article_id = id, "no content similarity for reference");
                None
            } else {
                Some(similar.into_iter().collect())
            }
        });

        let (history_depth, collaborative_scores) = match user_id {
            Some(uid) => self.collaborative_column(uid).await,
            None => (0, None),
        };

        let weights = SignalWeights::compute(
            history_depth,
            content_scores.is_some(),
            collaborative_scores.is_some(),
        );
        tracing::debug!(?weights, history_depth, "blend weights");

        let mut ranked: Vec<RankedArticle> = self
            .articles
            .iter()
            .map(|&id| {
                let base = self.base.get(&id).copied().unwrap_or(BaseScores {
                    freshness: 0.0,
                    popularity: 0.0,
                });
                let content_score = content_scores
                    .as_ref()
                    .and_then(|column| column.get(&id).copied());
                let collaborative_score = collaborative_scores
                    .as_ref()
                    .and_then(|column| column.get(&id).copied());

                // Missing entries in a present column contribute 0 without
                // shifting the column's weight.
                let overall_score = weights.freshness * base.freshness
                    + weights.popularity * base.popularity
                    + weights.content * content_score.unwrap_or(0.0)
                    + weights.collaborative * collaborative_score.unwrap_or(0.0);

                RankedArticle {
                    article_id: id,
                    freshness_score: base.freshness,
                    popularity_score: base.popularity,
                    content_score,
                    collaborative_score,
                    overall_score,
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.overall_score
                .total_cmp(&a.overall_score)
                .then(a.article_id.cmp(&b.article_id))
        });
        ranked.truncate(self.n_recs);
        Ok(ranked)
    }

    /// Collaborative scores over "all articles minus those already clicked",
    /// plus the user's history depth. Store failures degrade to no column.
    async fn collaborative_column(&self, user_id: i64) -> (usize, Option<HashMap<i64, f64>>) {
        let clicked = match self.interactions.get_clicked_by_user(user_id).await {
            Ok(clicked) => clicked,
            Err(error) => {
                tracing::warn!(user_id, %error, "could not load user history");
                return (0, None);
            }
        };

        let seen: HashSet<i64> = clicked.into_iter().collect();
        let depth = seen.len();
        if depth == 0 {
            return (0, None);
        }

        let candidates: Vec<i64> = self
            .articles
            .iter()
            .copied()
            .filter(|id| !seen.contains(id))
            .collect();
        let scored = self
            .collaborative
            .recommend_for_user(user_id, &candidates, None);
        if scored.is_empty() {
            (depth, None)
        } else {
            (depth, Some(scored.into_iter().collect()))
        }
    }

    /// Global popularity ranking, ignoring any user context.
    pub fn popular(&self, n: usize) -> Vec<(i64, f64)> {
        self.ranked_by(n, |scores| scores.popularity)
    }

    /// Global freshness ranking, ignoring any user context.
    pub fn newest(&self, n: usize) -> Vec<(i64, f64)> {
        self.ranked_by(n, |scores| scores.freshness)
    }

    fn ranked_by(&self, n: usize, key: impl Fn(&BaseScores) -> f64) -> Vec<(i64, f64)> {
        let mut ranked: Vec<(i64, f64)> = self
            .articles
            .iter()
            .filter_map(|id| self.base.get(id).map(|scores| (*id, key(scores))))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }

    pub fn n_recs(&self) -> usize {
        self.n_recs
    }
}
