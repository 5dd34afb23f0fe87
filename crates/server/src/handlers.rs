//! HTTP handlers for the recommendation service.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use readfeed_engine::types::RankedArticle;
use readfeed_engine::HybridEngine;

use crate::error::{ApiError, Result};

/// Query parameters for `GET /recommendations`.
///
/// Identifiers arrive as raw strings so that a non-integer value produces a
/// client-visible validation failure rather than an opaque framework error.
#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub user_id: Option<String>,
    pub article_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub generated_at: DateTime<Utc>,
    pub recommendations: Vec<RankedArticle>,
}

fn parse_id(name: &str, raw: Option<&str>) -> Result<Option<i64>> {
    match raw.map(str::trim) {
        None => Ok(None),
        Some("") => Ok(None),
        Some(value) => value
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ApiError::InvalidArgument(format!("{name} must be an integer"))),
    }
}

pub async fn recommendations(
    engine: web::Data<HybridEngine>,
    query: web::Query<RecommendationQuery>,
) -> Result<HttpResponse> {
    let user_id = parse_id("user_id", query.user_id.as_deref())?;
    let article_id = parse_id("article_id", query.article_id.as_deref())?;
    tracing::info!(?user_id, ?article_id, "recommendation request");

    let recommendations = engine.recommend(user_id, article_id).await?;
    Ok(HttpResponse::Ok().json(RecommendationResponse {
        generated_at: Utc::now(),
        recommendations,
    }))
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "readfeed-server",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
