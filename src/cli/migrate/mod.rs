//! Migrate command - applies the schema and exits

use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::storage::{connect, run_migrations, PostgresConfig, PostgresMigrator};

pub async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    init_logging(&config.logging);

    let url = config
        .database
        .url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required to run migrations"))?;

    let pool = connect(&PostgresConfig::new(url)).await?;
    let applied = run_migrations(&pool).await?;
    let version = PostgresMigrator::new(pool).current_version().await?;

    info!(applied, version = ?version, "Database is up to date");
    Ok(())
}
