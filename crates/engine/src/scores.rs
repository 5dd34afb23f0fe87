//! Global freshness and popularity scoring.
//!
//! Both scores are user-independent and computed once per engine
//! (re)initialization; personalization happens entirely in the blender.

use std::collections::HashMap;

use crate::ratings::recency_weight;
use crate::types::{Article, Interaction};

/// 100 days in milliseconds; freshness half-life is roughly 69.3 days.
const DECAY_CONSTANT_MS: f64 = 100.0 * 24.0 * 3600.0 * 1000.0;

/// User-independent base scores, both in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseScores {
    pub freshness: f64,
    pub popularity: f64,
}

/// Compute freshness and popularity for every article in the catalog.
///
/// Freshness decays exponentially with age relative to the newest article,
/// which scores exactly 1.0. Popularity is the log-normalized recency mass
/// of an article's clicks across all users, against a single batch-wide
/// reference timestamp; articles with no clicks score 0 but stay in the
/// table and may still be recommended on freshness alone.
pub fn compute_base_scores(
    articles: &[Article],
    interactions: &[Interaction],
) -> HashMap<i64, BaseScores> {
    let max_created = articles.iter().map(|a| a.created_at_ms).max();

    let mut recency_sums: HashMap<i64, f64> = HashMap::new();
    if let Some(max_ts) = interactions.iter().map(|i| i.timestamp_ms).max() {
        for event in interactions {
            *recency_sums.entry(event.article_id).or_insert(0.0) +=
                recency_weight(event.timestamp_ms, max_ts);
        }
    }
    let max_recency = recency_sums.values().fold(0.0_f64, |acc, &v| acc.max(v));

    articles
        .iter()
        .map(|article| {
            let freshness = match max_created {
                Some(newest) => {
                    (-((newest - article.created_at_ms) as f64) / DECAY_CONSTANT_MS).exp()
                }
                None => 0.0,
            };
            let popularity = match recency_sums.get(&article.article_id) {
                Some(sum) if max_recency > 0.0 => sum.ln_1p() / max_recency.ln_1p(),
                _ => 0.0,
            };
            (article.article_id, BaseScores { freshness, popularity })
        })
        .collect()
}
