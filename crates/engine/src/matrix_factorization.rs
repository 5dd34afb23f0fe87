//! Biased matrix factorization trained by stochastic gradient descent.
//!
//! One substitutable implementation of [`AffinityPredictor`]: estimates
//! affinity as `global_mean + user_bias + article_bias + p_u . q_i` over
//! learned low-dimensional factors. Fitted offline from derived affinity
//! ratings and persisted through [`crate::artifact`].

use std::collections::HashMap;

use anyhow::{bail, Result};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::collaborative::AffinityPredictor;
use crate::types::AffinityRating;

/// Training hyperparameters.
#[derive(Debug, Clone)]
pub struct FactorConfig {
    /// Dimensionality of the latent vectors.
    pub factors: usize,
    /// Training passes over the rating set.
    pub epochs: usize,
    /// Learning rate for all biases and factors.
    pub learning_rate: f32,
    /// Regularization, slightly higher than usual for implicit data.
    pub regularization: f32,
    /// RNG seed for factor initialization; fixed for reproducible fits.
    pub seed: u64,
}

impl Default for FactorConfig {
    fn default() -> Self {
        Self {
            factors: 100,
            epochs: 20,
            learning_rate: 0.004,
            regularization: 0.04,
            seed: 42,
        }
    }
}

/// A fitted latent-factor model.
pub struct FactorModel {
    pub(crate) global_mean: f32,
    pub(crate) user_index: HashMap<i64, usize>,
    pub(crate) item_index: HashMap<i64, usize>,
    pub(crate) user_bias: Vec<f32>,
    pub(crate) item_bias: Vec<f32>,
    /// [num_users x factors]
    pub(crate) user_factors: Array2<f32>,
    /// [num_items x factors]
    pub(crate) item_factors: Array2<f32>,
}

impl FactorModel {
    /// Fit the model on a rating batch. Fails on an empty batch; the rating
    /// deriver already guarantees values in [1, 5].
    pub fn fit(config: FactorConfig, ratings: &[AffinityRating]) -> Result<Self> {
        if ratings.is_empty() {
            bail!("cannot fit factor model on an empty rating set");
        }

        let mut user_index: HashMap<i64, usize> = HashMap::new();
        let mut item_index: HashMap<i64, usize> = HashMap::new();
        for rating in ratings {
            let next_user = user_index.len();
            user_index.entry(rating.user_id).or_insert(next_user);
            let next_item = item_index.len();
            item_index.entry(rating.article_id).or_insert(next_item);
        }

        let num_users = user_index.len();
        let num_items = item_index.len();
        let k = config.factors;
        let global_mean =
            (ratings.iter().map(|r| r.rating).sum::<f64>() / ratings.len() as f64) as f32;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut user_factors = Array2::<f32>::zeros((num_users, k));
        let mut item_factors = Array2::<f32>::zeros((num_items, k));
        for v in user_factors.iter_mut() {
            *v = rng.gen_range(-0.1..0.1);
        }
        for v in item_factors.iter_mut() {
            *v = rng.gen_range(-0.1..0.1);
        }
        let mut user_bias = vec![0.0_f32; num_users];
        let mut item_bias = vec![0.0_f32; num_items];

        let lr = config.learning_rate;
        let reg = config.regularization;

        for epoch in 0..config.epochs {
            let mut squared_error = 0.0_f64;
            for rating in ratings {
                let u = user_index[&rating.user_id];
                let i = item_index[&rating.article_id];

                let dot = user_factors.row(u).dot(&item_factors.row(i));
                let estimate = global_mean + user_bias[u] + item_bias[i] + dot;
                let err = rating.rating as f32 - estimate;
                squared_error += f64::from(err * err);

                user_bias[u] += lr * (err - reg * user_bias[u]);
                item_bias[i] += lr * (err - reg * item_bias[i]);
                for f in 0..k {
                    let pu = user_factors[[u, f]];
                    let qi = item_factors[[i, f]];
                    user_factors[[u, f]] += lr * (err * qi - reg * pu);
                    item_factors[[i, f]] += lr * (err * pu - reg * qi);
                }
            }

            if epoch % 5 == 0 {
                let rmse = (squared_error / ratings.len() as f64).sqrt();
                tracing::debug!(epoch, rmse, "factor model training");
            }
        }

        tracing::info!(
            users = num_users,
            articles = num_items,
            factors = k,
            "factor model fitted"
        );

        Ok(Self {
            global_mean,
            user_index,
            item_index,
            user_bias,
            item_bias,
            user_factors,
            item_factors,
        })
    }

    pub fn num_users(&self) -> usize {
        self.user_index.len()
    }

    pub fn num_articles(&self) -> usize {
        self.item_index.len()
    }
}

impl AffinityPredictor for FactorModel {
    /// Estimate affinity; unseen users or articles fall back to whatever
    /// bias terms are available, down to the global mean alone.
    fn predict(&self, user_id: i64, article_id: i64) -> f64 {
        let user = self.user_index.get(&user_id);
        let item = self.item_index.get(&article_id);

        let mut estimate = self.global_mean;
        if let Some(&u) = user {
            estimate += self.user_bias[u];
        }
        if let Some(&i) = item {
            estimate += self.item_bias[i];
        }
        if let (Some(&u), Some(&i)) = (user, item) {
            estimate += self.user_factors.row(u).dot(&self.item_factors.row(i));
        }
        f64::from(estimate)
    }

    fn knows(&self, article_id: i64) -> bool {
        self.item_index.contains_key(&article_id)
    }
}
