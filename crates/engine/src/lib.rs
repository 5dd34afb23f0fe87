//! Readfeed hybrid recommendation engine
//!
//! Blends four signal sources into a single ranked article list: global
//! freshness, global popularity, content similarity to a reference article,
//! and personalized collaborative-filtering affinity. The blend weights
//! adapt to how much click history the requesting user has.
//!
//! The engine is read-mostly: all base tables (article metadata, freshness
//! and popularity scores, the normalized embedding matrix, the trained
//! predictor) are built once at construction and never mutated. Refresh by
//! constructing a new engine instance.

pub mod artifact;
pub mod collaborative;
pub mod content_based;
pub mod hybrid;
pub mod matrix_factorization;
pub mod ratings;
pub mod scores;
pub mod store;
pub mod types;

// Re-export key types
pub use collaborative::{AffinityPredictor, CollaborativeEngine};
pub use content_based::ContentSimilarityEngine;
pub use hybrid::{HybridEngine, SignalWeights};
pub use matrix_factorization::{FactorConfig, FactorModel};
pub use ratings::derive_affinity_ratings;
pub use scores::{compute_base_scores, BaseScores};
pub use store::{ArticleStore, EmbeddingSource, InteractionStore};
pub use types::{AffinityRating, Article, Interaction, RankedArticle};

#[cfg(test)]
mod tests;
