//! Object-store reads for the trained model and embedding artifacts.
//!
//! Artifacts are opaque byte blobs decoded by [`readfeed_engine::artifact`];
//! this layer only knows where they live.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use readfeed_engine::artifact;
use readfeed_engine::matrix_factorization::FactorModel;
use readfeed_engine::store::EmbeddingSource;

/// Embedding table stored as a bincode artifact on the filesystem.
pub struct FileEmbeddingSource {
    path: PathBuf,
}

impl FileEmbeddingSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl EmbeddingSource for FileEmbeddingSource {
    async fn load(&self) -> Result<HashMap<i64, Vec<f32>>> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("reading embedding artifact {}", self.path.display()))?;
        let table = artifact::decode_embeddings(&bytes)?;
        tracing::info!(
            articles = table.ids.len(),
            dim = table.dim,
            "embedding table loaded"
        );
        Ok(table.into_map())
    }
}

/// Load a fitted factor model artifact from the filesystem.
pub async fn load_factor_model(path: impl AsRef<Path>) -> Result<FactorModel> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading model artifact {}", path.display()))?;
    let model = artifact::decode_model(&bytes)?;
    tracing::info!(
        users = model.num_users(),
        articles = model.num_articles(),
        "factor model loaded"
    );
    Ok(model)
}

/// Write a fitted factor model artifact to the filesystem.
pub async fn save_factor_model(path: impl AsRef<Path>, model: &FactorModel) -> Result<()> {
    let path = path.as_ref();
    let bytes = artifact::encode_model(model)?;
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("writing model artifact {}", path.display()))
}
