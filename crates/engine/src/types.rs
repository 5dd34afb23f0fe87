//! Core data model shared across the engine modules.
//!
//! Identifiers are validated `i64` values; callers reject anything else
//! before it reaches the engine. Scoring arithmetic is `f64`.

use serde::{Deserialize, Serialize};

/// A single click event from the interaction log.
///
/// Multiple interactions per (user, article) pair are expected and carry a
/// frequency signal. Immutable once read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: i64,
    pub session_id: i64,
    pub article_id: i64,
    /// Epoch milliseconds.
    pub timestamp_ms: i64,
}

/// Article metadata. One record per article; `article_id` is unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub article_id: i64,
    /// Epoch milliseconds.
    pub created_at_ms: i64,
}

/// Synthetic implicit-feedback rating in [1, 5], one row per distinct
/// (user, article) pair observed in a batch. Built fresh on every training
/// pass; never persisted independently of the trained model artifact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffinityRating {
    pub user_id: i64,
    pub article_id: i64,
    pub rating: f64,
}

/// A fully scored article as returned by the hybrid blender.
///
/// The two optional columns are present only when the corresponding
/// reference (article or user) was resolvable; an article the content
/// engine excluded keeps `None` even when the column itself was computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedArticle {
    pub article_id: i64,
    pub freshness_score: f64,
    pub popularity_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collaborative_score: Option<f64>,
    pub overall_score: f64,
}
