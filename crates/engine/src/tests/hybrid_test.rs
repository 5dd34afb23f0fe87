//! End-to-end blender scenarios over in-memory collaborators.

use std::collections::HashMap;
use std::sync::Arc;

use super::support::{article, click, FailingHistoryStore, MapEmbeddings, MemoryData, ScriptedPredictor, MS_PER_DAY};
use crate::hybrid::{HybridEngine, SignalWeights};
use crate::store::InteractionStore;

fn flat_embeddings(ids: &[i64]) -> MapEmbeddings {
    // Near-parallel vectors: every pairwise similarity is close to 1.
    MapEmbeddings(
        ids.iter()
            .map(|&id| (id, vec![1.0_f32, 0.001 * id as f32]))
            .collect(),
    )
}

async fn three_article_engine() -> HybridEngine {
    let data = Arc::new(MemoryData::new(
        vec![article(1, 0), article(2, 50), article(3, 100)],
        Vec::new(),
    ));
    HybridEngine::new(
        data.as_ref(),
        data.clone(),
        &flat_embeddings(&[1, 2, 3]),
        Box::new(ScriptedPredictor::empty()),
        5,
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_freshness_only_scenario() {
    let engine = three_article_engine().await;
    let recs = engine.recommend(None, None).await.unwrap();

    assert_eq!(recs.len(), 3);
    let ids: Vec<i64> = recs.iter().map(|r| r.article_id).collect();
    assert_eq!(ids, vec![3, 2, 1]);

    assert!((recs[0].freshness_score - 1.0).abs() < 1e-12);
    for rec in &recs {
        assert_eq!(rec.popularity_score, 0.0);
        assert_eq!(rec.content_score, None);
        assert_eq!(rec.collaborative_score, None);
        // Only freshness and popularity carry weight: 0.5 each.
        let expected = 0.5 * rec.freshness_score + 0.5 * rec.popularity_score;
        assert!((rec.overall_score - expected).abs() < 1e-12);
    }
}

#[tokio::test]
async fn test_zero_history_user_gets_base_signals_only() {
    let engine = three_article_engine().await;
    let recs = engine.recommend(Some(42), None).await.unwrap();

    assert_eq!(recs.len(), 3);
    for rec in &recs {
        assert_eq!(rec.content_score, None);
        assert_eq!(rec.collaborative_score, None);
    }

    let weights = SignalWeights::compute(0, false, false);
    assert_eq!(weights.collaborative, 0.0);
    assert_eq!(weights.content, 0.0);
    assert!((weights.freshness - 0.5).abs() < 1e-12);
    assert!((weights.popularity - 0.5).abs() < 1e-12);
}

#[tokio::test]
async fn test_explicit_reference_wins_over_last_click() {
    let data = Arc::new(MemoryData::new(
        vec![article(1, 0), article(2, 0), article(3, 0)],
        vec![click(7, 2, 10 * MS_PER_DAY)],
    ));
    let engine = HybridEngine::new(
        data.as_ref(),
        data.clone(),
        &flat_embeddings(&[1, 2, 3]),
        Box::new(ScriptedPredictor::empty()),
        5,
    )
    .await
    .unwrap();

    let recs = engine.recommend(Some(7), Some(3)).await.unwrap();
    let by_id: HashMap<i64, _> = recs.iter().map(|r| (r.article_id, r)).collect();

    // Reference article 3 is excluded from its own content column; the
    // last-clicked article 2 still has an entry.
    assert_eq!(by_id[&3].content_score, None);
    assert!(by_id[&2].content_score.is_some());
    assert!(by_id[&1].content_score.is_some());
}

#[tokio::test]
async fn test_established_user_is_collaborative_dominated() {
    let mut articles = Vec::new();
    for id in 1..=25 {
        articles.push(article(id, 100));
    }
    // User 7 clicked articles 1..=20 on distinct days.
    let interactions = (1..=20)
        .map(|id| click(7, id, id * MS_PER_DAY))
        .collect();
    let data = Arc::new(MemoryData::new(articles, interactions));

    let predictor = ScriptedPredictor::new(&[
        (21, 1.0),
        (22, 2.0),
        (23, 3.0),
        (24, 4.0),
        (25, 5.0),
    ]);
    let ids: Vec<i64> = (1..=25).collect();
    let engine = HybridEngine::new(
        data.as_ref(),
        data.clone(),
        &flat_embeddings(&ids),
        Box::new(predictor),
        30,
    )
    .await
    .unwrap();

    let weights = SignalWeights::compute(20, true, true);
    assert!(weights.collaborative > 0.55);
    assert!((weights.content - 0.5 / 1.6734).abs() < 1e-3);
    assert!((weights.sum() - 1.0).abs() < 1e-9);

    let recs = engine.recommend(Some(7), Some(1)).await.unwrap();
    let by_id: HashMap<i64, _> = recs.iter().map(|r| (r.article_id, r.clone())).collect();

    // Highest raw prediction normalizes to 1.0 and dominates the ranking.
    assert_eq!(recs[0].article_id, 25);
    assert_eq!(by_id[&25].collaborative_score, Some(1.0));
    // Already-clicked articles are never collaborative candidates.
    assert_eq!(by_id[&5].collaborative_score, None);
    assert_eq!(by_id[&20].collaborative_score, None);
}

#[tokio::test]
async fn test_weights_sum_to_one_for_all_column_subsets() {
    for &depth in &[0_usize, 1, 4, 8, 20, 100] {
        for &has_content in &[false, true] {
            for &has_collaborative in &[false, true] {
                let weights = SignalWeights::compute(depth, has_content, has_collaborative);
                assert!(
                    (weights.sum() - 1.0).abs() < 1e-9,
                    "depth={depth} content={has_content} collaborative={has_collaborative}"
                );
                assert!(weights.freshness >= 0.0);
                assert!(weights.popularity >= 0.0);
                assert!(weights.content >= 0.0);
                assert!(weights.collaborative >= 0.0);
            }
        }
    }
}

#[tokio::test]
async fn test_content_weight_is_capped() {
    let weights = SignalWeights::compute(50, true, true);
    // Pre-normalization cap is 0.5; after renormalization the content
    // share stays below the collaborative share.
    assert!(weights.content < weights.collaborative);

    let shallow = SignalWeights::compute(1, true, true);
    assert!(shallow.collaborative < shallow.content);
}

#[tokio::test]
async fn test_recommend_is_idempotent() {
    let articles = (1..=10).map(|id| article(id, id)).collect();
    let interactions = (1..=6).map(|id| click(3, id, id * MS_PER_DAY)).collect();
    let data = Arc::new(MemoryData::new(articles, interactions));

    let ids: Vec<i64> = (1..=10).collect();
    let engine = HybridEngine::new(
        data.as_ref(),
        data.clone(),
        &flat_embeddings(&ids),
        Box::new(ScriptedPredictor::new(&[(7, 2.0), (8, 4.0), (9, 1.0)])),
        5,
    )
    .await
    .unwrap();

    let first = engine.recommend(Some(3), None).await.unwrap();
    let second = engine.recommend(Some(3), None).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_history_store_failure_degrades_gracefully() {
    let catalog = MemoryData::new(vec![article(1, 0), article(2, 10)], Vec::new());
    let failing = Arc::new(FailingHistoryStore(MemoryData::new(
        Vec::new(),
        vec![click(7, 1, MS_PER_DAY)],
    )));

    let engine = HybridEngine::new(
        &catalog,
        failing.clone() as Arc<dyn InteractionStore>,
        &flat_embeddings(&[1, 2]),
        Box::new(ScriptedPredictor::empty()),
        5,
    )
    .await
    .unwrap();

    // Both per-user lookups fail; the request still succeeds on base
    // signals alone.
    let recs = engine.recommend(Some(7), None).await.unwrap();
    assert_eq!(recs.len(), 2);
    for rec in &recs {
        assert_eq!(rec.content_score, None);
        assert_eq!(rec.collaborative_score, None);
    }
}

#[tokio::test]
async fn test_empty_catalog_yields_empty_result() {
    let data = Arc::new(MemoryData::new(Vec::new(), Vec::new()));
    let engine = HybridEngine::new(
        data.as_ref(),
        data.clone(),
        &MapEmbeddings(HashMap::new()),
        Box::new(ScriptedPredictor::empty()),
        5,
    )
    .await
    .unwrap();

    assert!(engine.recommend(Some(1), Some(2)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_truncation_to_n_recs() {
    let articles = (1..=10).map(|id| article(id, id)).collect();
    let data = Arc::new(MemoryData::new(articles, Vec::new()));
    let ids: Vec<i64> = (1..=10).collect();
    let engine = HybridEngine::new(
        data.as_ref(),
        data.clone(),
        &flat_embeddings(&ids),
        Box::new(ScriptedPredictor::empty()),
        4,
    )
    .await
    .unwrap();

    assert_eq!(engine.recommend(None, None).await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_popular_and_newest_shortcuts() {
    let articles = vec![article(1, 0), article(2, 50), article(3, 100)];
    let now = 100 * MS_PER_DAY;
    let interactions = vec![
        click(10, 1, now),
        click(11, 1, now),
        click(12, 1, now),
        click(10, 2, now),
    ];
    let data = Arc::new(MemoryData::new(articles, interactions));
    let engine = HybridEngine::new(
        data.as_ref(),
        data.clone(),
        &flat_embeddings(&[1, 2, 3]),
        Box::new(ScriptedPredictor::empty()),
        5,
    )
    .await
    .unwrap();

    let popular = engine.popular(2);
    assert_eq!(popular[0].0, 1);
    assert!((popular[0].1 - 1.0).abs() < 1e-12);
    assert_eq!(popular[1].0, 2);

    let newest = engine.newest(3);
    assert_eq!(newest[0].0, 3);
    assert!((newest[0].1 - 1.0).abs() < 1e-12);
}
