//! Content similarity over pre-computed article embeddings.
//!
//! The embedding table is sliced to the known article set at load time and
//! every retained vector is L2-normalized once, so cosine similarity
//! reduces to a dot product per query.

use std::collections::HashMap;

use ndarray::{Array1, Array2};

use crate::types::Article;

/// Item-to-item similarity engine over a normalized embedding matrix.
///
/// Articles with metadata but no embedding are excluded from this engine
/// entirely (not zero-scored); the blender treats them as having no content
/// column entry.
pub struct ContentSimilarityEngine {
    /// Ascending, deduplicated.
    article_ids: Vec<i64>,
    index: HashMap<i64, usize>,
    /// Row-normalized, one row per retained article.
    embeddings: Array2<f64>,
}

impl ContentSimilarityEngine {
    pub fn new(articles: &[Article], embeddings: &HashMap<i64, Vec<f32>>) -> Self {
        let mut ids: Vec<i64> = articles
            .iter()
            .map(|a| a.article_id)
            .filter(|id| embeddings.contains_key(id))
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let dim = ids
            .first()
            .map(|id| embeddings[id].len())
            .unwrap_or_default();
        ids.retain(|id| {
            let keep = embeddings[id].len() == dim;
            if !keep {
                tracing::warn!(article_id = id, "embedding dimension mismatch; excluding");
            }
            keep
        });

        let mut matrix = Array2::<f64>::zeros((ids.len(), dim));
        for (row, id) in ids.iter().enumerate() {
            for (col, &value) in embeddings[id].iter().enumerate() {
                matrix[[row, col]] = f64::from(value);
            }
            let norm = matrix.row(row).dot(&matrix.row(row)).sqrt();
            if norm > 0.0 {
                let normalized = matrix.row(row).mapv(|v| v / norm);
                matrix.row_mut(row).assign(&normalized);
            }
        }

        let index = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        Self {
            article_ids: ids,
            index,
            embeddings: matrix,
        }
    }

    /// Number of articles retained by this engine.
    pub fn len(&self) -> usize {
        self.article_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.article_ids.is_empty()
    }

    pub fn contains(&self, article_id: i64) -> bool {
        self.index.contains_key(&article_id)
    }

    /// Ordered `(article_id, similarity)` pairs against the reference
    /// article, similarity rescaled from cosine [-1, 1] to [0, 1].
    ///
    /// The reference article is excluded from the result. An unknown
    /// reference yields an empty result. Ties break by ascending article id;
    /// `limit = None` returns every retained article.
    pub fn recommend(&self, reference: i64, limit: Option<usize>) -> Vec<(i64, f64)> {
        let Some(&row) = self.index.get(&reference) else {
            return Vec::new();
        };

        // Stored rows are normalized at load time, but the query vector is
        // re-normalized rather than trusted.
        let mut query: Array1<f64> = self.embeddings.row(row).to_owned();
        let norm = query.dot(&query).sqrt();
        if norm > 0.0 {
            query.mapv_inplace(|v| v / norm);
        }

        let similarities = self.embeddings.dot(&query);
        let mut results: Vec<(i64, f64)> = self
            .article_ids
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != row)
            .map(|(i, &id)| (id, (similarities[i] + 1.0) / 2.0))
            .collect();

        results.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        if let Some(n) = limit {
            results.truncate(n);
        }
        results
    }
}
