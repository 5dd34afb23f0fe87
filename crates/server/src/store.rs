//! Postgres-backed article and click repositories.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row};

use readfeed_engine::store::{ArticleStore, InteractionStore};
use readfeed_engine::types::{Article, Interaction};

/// Article metadata repository.
pub struct PgArticleStore {
    pool: PgPool,
}

impl PgArticleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArticleStore for PgArticleStore {
    async fn get_all_articles(&self) -> Result<Vec<Article>> {
        let rows = sqlx::query(
            r#"
            SELECT article_id, created_at_ts
            FROM articles
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Article {
                article_id: row.get("article_id"),
                created_at_ms: row.get("created_at_ts"),
            })
            .collect())
    }
}

/// Click-log repository.
pub struct PgInteractionStore {
    pool: PgPool,
}

impl PgInteractionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InteractionStore for PgInteractionStore {
    async fn get_all_interactions(&self) -> Result<Vec<Interaction>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT user_id, session_id, click_article_id, click_timestamp
            FROM clicks
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Interaction {
                user_id: row.get("user_id"),
                session_id: row.get("session_id"),
                article_id: row.get("click_article_id"),
                timestamp_ms: row.get("click_timestamp"),
            })
            .collect())
    }

    async fn get_clicked_by_user(&self, user_id: i64) -> Result<Vec<i64>> {
        let rows = sqlx::query(
            r#"
            SELECT click_article_id, MAX(click_timestamp) AS last_click
            FROM clicks
            WHERE user_id = $1
            GROUP BY click_article_id
            ORDER BY last_click DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|row| row.get("click_article_id")).collect())
    }

    async fn get_last_clicked(&self, user_id: i64) -> Result<Option<i64>> {
        let row = sqlx::query(
            r#"
            SELECT click_article_id
            FROM clicks
            WHERE user_id = $1
            ORDER BY click_timestamp DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get("click_article_id")))
    }
}
