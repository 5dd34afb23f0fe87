//! Service configuration, layered from an optional file and `READFEED_`
//! environment variables.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Model and embedding artifact locations
    pub artifacts: ArtifactConfig,

    /// Recommendation engine configuration
    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server host
    pub host: String,

    /// Server port (default: 8083)
    pub port: u16,

    /// Worker threads
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Connection pool size
    pub max_connections: u32,

    /// Connection timeout
    pub connect_timeout_sec: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtifactConfig {
    /// Trained factor-model artifact path
    pub model_path: String,

    /// Article embedding table artifact path
    pub embeddings_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Recommendations returned per request
    pub n_recs: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { n_recs: 5 }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8083,
                workers: None,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/readfeed".to_string(),
                max_connections: 10,
                connect_timeout_sec: 10,
            },
            artifacts: ArtifactConfig {
                model_path: "./data/factor_model.bin".to_string(),
                embeddings_path: "./data/article_embeddings.bin".to_string(),
            },
            engine: EngineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and config file
    pub fn load() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/readfeed").required(false))
            .add_source(config::Environment::with_prefix("READFEED").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.database.connect_timeout_sec)
    }
}
