//! SayItRight API
//!
//! Backend for refining rough email drafts into polished messages:
//! - Tiered generation with daily quotas and per-request credits
//! - JWT access tokens with rotating refresh sessions
//! - Archives, reusable templates and an expression notebook

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tracing::{info, warn};

use api::state::AppState;
use domain::llm::LlmProvider;
use domain::rate_limit::GuestRateLimitStore;
use infrastructure::llm::{HttpClient, OpenAiProvider};
use infrastructure::rate_limit::{InMemoryRateLimitStore, RedisRateLimitStore};
use infrastructure::storage::{connect, run_migrations, PostgresConfig, Repositories, StorageType};

/// Build the application state from configuration
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let backend = StorageType::parse(&config.storage.backend).ok_or_else(|| {
        anyhow::anyhow!("Unknown storage backend '{}'", config.storage.backend)
    })?;

    info!(backend = ?backend, "Storage backend selected");

    let (repos, db) = match backend {
        StorageType::InMemory => (Repositories::in_memory(), None),
        StorageType::Postgres => {
            let pool = connect_database(config).await?;
            (Repositories::postgres(pool.clone()), Some(pool))
        }
    };

    let llm = create_llm_provider(config)?;
    let guest_limiter = create_guest_limiter(config).await?;

    Ok(AppState::new(config, repos, llm, guest_limiter, db))
}

/// Connect to PostgreSQL, applying pending migrations when enabled
pub async fn connect_database(config: &AppConfig) -> anyhow::Result<PgPool> {
    let url = config
        .database
        .url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for the postgres backend"))?;

    info!("Connecting to PostgreSQL...");
    let pool = connect(
        &PostgresConfig::new(url).with_max_connections(config.database.max_connections),
    )
    .await?;
    info!("PostgreSQL connection established");

    if config.database.run_migrations {
        let applied = run_migrations(&pool).await?;
        info!(applied, "Migrations complete");
    }

    Ok(pool)
}

fn create_llm_provider(config: &AppConfig) -> anyhow::Result<Arc<dyn LlmProvider>> {
    if config.llm.api_key.is_empty() {
        warn!("OPENAI_API_KEY is not set; generation requests will fail");
    }

    let client = HttpClient::with_timeout(Duration::from_secs(config.llm.timeout_secs))?;

    Ok(Arc::new(OpenAiProvider::with_base_url(
        client,
        config.llm.api_key.clone(),
        config.llm.base_url.clone(),
    )))
}

async fn create_guest_limiter(
    config: &AppConfig,
) -> anyhow::Result<Arc<dyn GuestRateLimitStore>> {
    match config.redis.url.as_deref() {
        Some(url) => {
            info!("Using Redis for guest rate limiting");
            Ok(Arc::new(RedisRateLimitStore::connect(url).await?))
        }
        None => {
            info!("Using in-process guest rate limiting");
            Ok(Arc::new(InMemoryRateLimitStore::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_state() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "test-secret".to_string();

        let state = create_app_state(&config).await.unwrap();
        assert!(state.db.is_none());
    }

    #[tokio::test]
    async fn test_unknown_backend_rejected() {
        let mut config = AppConfig::default();
        config.storage.backend = "sqlite".to_string();

        assert!(create_app_state(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_postgres_backend_requires_url() {
        let mut config = AppConfig::default();
        config.storage.backend = "postgres".to_string();

        let err = connect_database(&config).await.unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }
}
