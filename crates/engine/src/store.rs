//! Collaborator interfaces to the document and object stores.
//!
//! The engine only ever sees these traits; concrete transports (Postgres,
//! filesystem, blob storage) live with the caller and are injected at
//! construction as immutable handles.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{Article, Interaction};

/// Article metadata source.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn get_all_articles(&self) -> Result<Vec<Article>>;
}

/// Interaction log source.
#[async_trait]
pub trait InteractionStore: Send + Sync {
    async fn get_all_interactions(&self) -> Result<Vec<Interaction>>;

    /// Distinct article ids clicked by the user, most recent first.
    async fn get_clicked_by_user(&self, user_id: i64) -> Result<Vec<i64>>;

    /// The user's most recent click, if any.
    async fn get_last_clicked(&self, user_id: i64) -> Result<Option<i64>>;
}

/// Opaque article-id to embedding-vector mapping, loaded once at engine
/// construction.
#[async_trait]
pub trait EmbeddingSource: Send + Sync {
    async fn load(&self) -> Result<HashMap<i64, Vec<f32>>>;
}
