//! Binary artifact codecs for the trained model and the embedding table.
//!
//! Matrices are flattened to shape + data vectors through explicit
//! serializable structs and encoded with bincode; the object-store layer
//! only ever sees opaque byte blobs.

use std::collections::HashMap;

use anyhow::{Context, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::matrix_factorization::FactorModel;

/// Serializable form of [`FactorModel`].
#[derive(Debug, Serialize, Deserialize)]
struct SerializableFactorModel {
    global_mean: f32,
    user_ids: Vec<i64>,
    item_ids: Vec<i64>,
    user_bias: Vec<f32>,
    item_bias: Vec<f32>,
    factors: usize,
    user_factor_data: Vec<f32>,
    item_factor_data: Vec<f32>,
}

impl SerializableFactorModel {
    fn from_model(model: &FactorModel) -> Self {
        // Index maps are stored as id vectors in index order.
        let mut user_ids = vec![0_i64; model.user_index.len()];
        for (&id, &idx) in &model.user_index {
            user_ids[idx] = id;
        }
        let mut item_ids = vec![0_i64; model.item_index.len()];
        for (&id, &idx) in &model.item_index {
            item_ids[idx] = id;
        }

        Self {
            global_mean: model.global_mean,
            user_ids,
            item_ids,
            user_bias: model.user_bias.clone(),
            item_bias: model.item_bias.clone(),
            factors: model.user_factors.ncols(),
            user_factor_data: model.user_factors.iter().copied().collect(),
            item_factor_data: model.item_factors.iter().copied().collect(),
        }
    }

    fn into_model(self) -> Result<FactorModel> {
        let num_users = self.user_ids.len();
        let num_items = self.item_ids.len();

        let user_factors =
            Array2::from_shape_vec((num_users, self.factors), self.user_factor_data)
                .context("reconstructing user factor matrix")?;
        let item_factors =
            Array2::from_shape_vec((num_items, self.factors), self.item_factor_data)
                .context("reconstructing article factor matrix")?;

        anyhow::ensure!(
            self.user_bias.len() == num_users && self.item_bias.len() == num_items,
            "bias vector length does not match id map"
        );

        Ok(FactorModel {
            global_mean: self.global_mean,
            user_index: self
                .user_ids
                .iter()
                .enumerate()
                .map(|(idx, &id)| (id, idx))
                .collect(),
            item_index: self
                .item_ids
                .iter()
                .enumerate()
                .map(|(idx, &id)| (id, idx))
                .collect(),
            user_bias: self.user_bias,
            item_bias: self.item_bias,
            user_factors,
            item_factors,
        })
    }
}

/// Encode a fitted model for object storage.
pub fn encode_model(model: &FactorModel) -> Result<Vec<u8>> {
    bincode::serialize(&SerializableFactorModel::from_model(model))
        .context("serializing factor model artifact")
}

/// Decode a model artifact previously produced by [`encode_model`].
pub fn decode_model(bytes: &[u8]) -> Result<FactorModel> {
    let serializable: SerializableFactorModel =
        bincode::deserialize(bytes).context("deserializing factor model artifact")?;
    serializable.into_model()
}

/// Flat on-disk form of the article embedding table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingTable {
    pub dim: usize,
    pub ids: Vec<i64>,
    /// Row-major, `ids.len() * dim` values.
    pub data: Vec<f32>,
}

impl EmbeddingTable {
    pub fn from_map(embeddings: &HashMap<i64, Vec<f32>>, dim: usize) -> Self {
        let mut ids: Vec<i64> = embeddings.keys().copied().collect();
        ids.sort_unstable();

        let mut data = Vec::with_capacity(ids.len() * dim);
        for id in &ids {
            let vector = &embeddings[id];
            data.extend(vector.iter().copied().take(dim));
            data.extend(std::iter::repeat(0.0).take(dim.saturating_sub(vector.len())));
        }
        Self { dim, ids, data }
    }

    pub fn into_map(self) -> HashMap<i64, Vec<f32>> {
        self.ids
            .iter()
            .enumerate()
            .map(|(row, &id)| (id, self.data[row * self.dim..(row + 1) * self.dim].to_vec()))
            .collect()
    }
}

/// Encode the embedding table for object storage.
pub fn encode_embeddings(table: &EmbeddingTable) -> Result<Vec<u8>> {
    bincode::serialize(table).context("serializing embedding table artifact")
}

/// Decode an embedding table artifact.
pub fn decode_embeddings(bytes: &[u8]) -> Result<EmbeddingTable> {
    let table: EmbeddingTable =
        bincode::deserialize(bytes).context("deserializing embedding table artifact")?;
    anyhow::ensure!(
        table.data.len() == table.ids.len() * table.dim,
        "embedding table shape mismatch: {} values for {} ids of dim {}",
        table.data.len(),
        table.ids.len(),
        table.dim
    );
    Ok(table)
}
