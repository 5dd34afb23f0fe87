use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use readfeed_engine::HybridEngine;
use readfeed_server::artifacts::{load_factor_model, FileEmbeddingSource};
use readfeed_server::config::AppConfig;
use readfeed_server::handlers;
use readfeed_server::store::{PgArticleStore, PgInteractionStore};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        "starting readfeed-server"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.connect_timeout())
        .connect(&config.database.url)
        .await
        .context("connecting to database")?;

    let articles = PgArticleStore::new(pool.clone());
    let interactions = Arc::new(PgInteractionStore::new(pool.clone()));
    let embeddings = FileEmbeddingSource::new(&config.artifacts.embeddings_path);
    let model = load_factor_model(&config.artifacts.model_path)
        .await
        .context("loading factor model artifact")?;

    let engine = HybridEngine::new(
        &articles,
        interactions,
        &embeddings,
        Box::new(model),
        config.engine.n_recs,
    )
    .await
    .context("building recommendation engine")?;
    let engine = web::Data::new(engine);

    let bind_addr = (config.server.host.clone(), config.server.port);
    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(engine.clone())
            .route("/health", web::get().to(handlers::health))
            .route("/recommendations", web::get().to(handlers::recommendations))
    })
    .bind(bind_addr)
    .context("binding HTTP server")?;

    if let Some(workers) = config.server.workers {
        server = server.workers(workers);
    }

    server.run().await.context("running HTTP server")
}
