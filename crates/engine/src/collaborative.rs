//! Collaborative affinity scoring over an opaque latent-factor predictor.
//!
//! The predictor is a pre-fitted artifact; this module owns candidate
//! filtering and per-request score normalization, not model fitting.

use std::collections::HashSet;

/// Pre-fitted user-article affinity predictor.
///
/// Any matrix-factorization or neighborhood model satisfying this contract
/// is substitutable without touching the blender. Predictors may
/// extrapolate for a never-seen user; cold users are handled by the
/// blender's weighting, not here.
pub trait AffinityPredictor: Send + Sync {
    /// Estimated affinity of `user_id` for `article_id`.
    fn predict(&self, user_id: i64, article_id: i64) -> f64;
    /// Whether the article was part of the predictor's training set.
    fn knows(&self, article_id: i64) -> bool;
}

/// Candidate scoring wrapper around an [`AffinityPredictor`].
pub struct CollaborativeEngine {
    predictor: Box<dyn AffinityPredictor>,
}

impl CollaborativeEngine {
    pub fn new(predictor: Box<dyn AffinityPredictor>) -> Self {
        Self { predictor }
    }

    /// Ordered `(article_id, normalized_score)` pairs for the known subset
    /// of `candidates`.
    ///
    /// Unknown candidates are logged and dropped, never an error. Raw
    /// predictions are min-max normalized to [0, 1] across this request's
    /// candidate set only; a flat batch normalizes to all zeros. Ties break
    /// by ascending article id.
    pub fn recommend_for_user(
        &self,
        user_id: i64,
        candidates: &[i64],
        top_n: Option<usize>,
    ) -> Vec<(i64, f64)> {
        // Pure set intersection keeps the result independent of candidate
        // order.
        let mut known: Vec<i64> = candidates
            .iter()
            .copied()
            .collect::<HashSet<_>>()
            .into_iter()
            .filter(|&id| {
                let keep = self.predictor.knows(id);
                if !keep {
                    tracing::debug!(article_id = id, "candidate unknown to predictor; dropping");
                }
                keep
            })
            .collect();
        known.sort_unstable();

        if known.is_empty() {
            tracing::debug!(user_id, "no known candidate articles");
            return Vec::new();
        }

        let raw: Vec<f64> = known
            .iter()
            .map(|&id| self.predictor.predict(user_id, id))
            .collect();
        let min = raw.iter().copied().fold(f64::INFINITY, f64::min);
        let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let span = max - min;

        let mut scored: Vec<(i64, f64)> = known
            .iter()
            .zip(&raw)
            .map(|(&id, &score)| {
                let normalized = if span > 0.0 { (score - min) / span } else { 0.0 };
                (id, normalized)
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        if let Some(n) = top_n {
            scored.truncate(n);
        }
        scored
    }
}
