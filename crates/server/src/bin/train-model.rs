//! Offline training pass: derive affinity ratings from the click log, fit the
//! factor model, and write the artifact the serving process loads at startup.

use anyhow::{ensure, Context};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use readfeed_engine::matrix_factorization::{FactorConfig, FactorModel};
use readfeed_engine::ratings::derive_affinity_ratings;
use readfeed_engine::store::InteractionStore;
use readfeed_server::artifacts::save_factor_model;
use readfeed_server::config::AppConfig;
use readfeed_server::store::PgInteractionStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("loading configuration")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.connect_timeout())
        .connect(&config.database.url)
        .await
        .context("connecting to database")?;

    let interactions = PgInteractionStore::new(pool);
    let clicks = interactions
        .get_all_interactions()
        .await
        .context("loading click log")?;
    ensure!(!clicks.is_empty(), "click log is empty, nothing to train on");
    tracing::info!(clicks = clicks.len(), "click log loaded");

    let ratings = derive_affinity_ratings(&clicks);
    tracing::info!(ratings = ratings.len(), "affinity ratings derived");

    let model = FactorModel::fit(FactorConfig::default(), &ratings)?;
    tracing::info!(
        users = model.num_users(),
        articles = model.num_articles(),
        "factor model fitted"
    );

    save_factor_model(&config.artifacts.model_path, &model).await?;
    tracing::info!(path = %config.artifacts.model_path, "model artifact written");

    Ok(())
}
