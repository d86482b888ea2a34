//! Versioned schema migrations recorded in `_migrations`

use sqlx::postgres::PgPool;
use tracing::info;

use crate::domain::DomainError;

#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub description: String,
    pub up: String,
    pub down: String,
}

impl Migration {
    pub fn new(
        version: i64,
        description: impl Into<String>,
        up: impl Into<String>,
        down: impl Into<String>,
    ) -> Self {
        Self {
            version,
            description: description.into(),
            up: up.into(),
            down: down.into(),
        }
    }
}

#[derive(Debug)]
pub struct PostgresMigrator {
    pool: PgPool,
}

impl PostgresMigrator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_migrations_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create migrations table: {}", e)))?;

        Ok(())
    }

    async fn is_applied(&self, version: i64) -> Result<bool, DomainError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _migrations WHERE version = $1)")
            .bind(version)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to check migration status: {}", e)))
    }

    /// Apply one migration and record it in the same transaction.
    /// Returns false when it was already applied.
    pub async fn run_migration(&self, migration: &Migration) -> Result<bool, DomainError> {
        self.ensure_migrations_table().await?;

        if self.is_applied(migration.version).await? {
            return Ok(false);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin migration: {}", e)))?;

        sqlx::raw_sql(&migration.up)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to run migration {}: {}",
                    migration.version, e
                ))
            })?;

        sqlx::query("INSERT INTO _migrations (version, description) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(&migration.description)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to record migration {}: {}",
                    migration.version, e
                ))
            })?;

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit migration: {}", e)))?;

        Ok(true)
    }

    pub async fn current_version(&self) -> Result<Option<i64>, DomainError> {
        self.ensure_migrations_table().await?;

        sqlx::query_scalar("SELECT MAX(version) FROM _migrations")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get migration version: {}", e)))
    }
}

pub fn schema_migrations() -> Vec<Migration> {
    vec![
        Migration::new(
            1,
            "Create users table",
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY,
                email VARCHAR(255) NOT NULL UNIQUE,
                username VARCHAR(20),
                password_hash TEXT NOT NULL,
                credit_balance BIGINT NOT NULL DEFAULT 0 CHECK (credit_balance >= 0),
                tier VARCHAR(16) NOT NULL DEFAULT 'free',
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            "#,
            "DROP TABLE IF EXISTS users;",
        ),
        Migration::new(
            2,
            "Create subscriptions and credit_transactions tables",
            r#"
            CREATE TABLE IF NOT EXISTS subscriptions (
                id UUID PRIMARY KEY,
                user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                status VARCHAR(16) NOT NULL,
                start_at TIMESTAMPTZ NOT NULL,
                end_at TIMESTAMPTZ NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_subscriptions_user ON subscriptions(user_id);

            CREATE TABLE IF NOT EXISTS credit_transactions (
                id UUID PRIMARY KEY,
                user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                amount BIGINT NOT NULL,
                status VARCHAR(16) NOT NULL,
                reason TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE INDEX IF NOT EXISTS idx_credit_transactions_user
                ON credit_transactions(user_id, created_at);
            "#,
            "DROP TABLE IF EXISTS credit_transactions; DROP TABLE IF EXISTS subscriptions;",
        ),
        Migration::new(
            3,
            "Create usage_tracking table",
            r#"
            CREATE TABLE IF NOT EXISTS usage_tracking (
                user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                date DATE NOT NULL,
                basic_requests INTEGER NOT NULL DEFAULT 0,
                advanced_requests INTEGER NOT NULL DEFAULT 0,
                total_tokens_used BIGINT NOT NULL DEFAULT 0,
                PRIMARY KEY (user_id, date)
            );
            "#,
            "DROP TABLE IF EXISTS usage_tracking;",
        ),
        Migration::new(
            4,
            "Create archives table",
            r#"
            CREATE TABLE IF NOT EXISTS archives (
                id UUID PRIMARY KEY,
                user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title VARCHAR(255),
                content TEXT NOT NULL,
                preview TEXT NOT NULL,
                tone VARCHAR(50) NOT NULL,
                purpose VARCHAR(50),
                relationship VARCHAR(50),
                rationale TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE INDEX IF NOT EXISTS idx_archives_user_created ON archives(user_id, created_at);
            "#,
            "DROP TABLE IF EXISTS archives;",
        ),
        Migration::new(
            5,
            "Create templates table",
            r#"
            CREATE TABLE IF NOT EXISTS templates (
                id UUID PRIMARY KEY,
                user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title VARCHAR(255),
                content TEXT NOT NULL,
                preview TEXT NOT NULL,
                tone VARCHAR(50) NOT NULL,
                purpose VARCHAR(50),
                relationship VARCHAR(50),
                rationale TEXT,
                source_archive_id UUID UNIQUE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE INDEX IF NOT EXISTS idx_templates_user_created ON templates(user_id, created_at);
            "#,
            "DROP TABLE IF EXISTS templates;",
        ),
        Migration::new(
            6,
            "Create expression_notes table",
            r#"
            CREATE TABLE IF NOT EXISTS expression_notes (
                id UUID PRIMARY KEY,
                user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                term VARCHAR(255) NOT NULL,
                description TEXT,
                example TEXT,
                is_starred BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE INDEX IF NOT EXISTS idx_expression_notes_user ON expression_notes(user_id);
            "#,
            "DROP TABLE IF EXISTS expression_notes;",
        ),
        Migration::new(
            7,
            "Create refresh_sessions table",
            r#"
            CREATE TABLE IF NOT EXISTS refresh_sessions (
                jti VARCHAR(64) PRIMARY KEY,
                user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                expires_at TIMESTAMPTZ NOT NULL,
                revoked_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE INDEX IF NOT EXISTS idx_refresh_sessions_user ON refresh_sessions(user_id);
            "#,
            "DROP TABLE IF EXISTS refresh_sessions;",
        ),
    ]
}

/// Apply all pending migrations in version order
pub async fn run_migrations(pool: &PgPool) -> Result<usize, DomainError> {
    let migrator = PostgresMigrator::new(pool.clone());
    let mut applied = 0;

    for migration in schema_migrations() {
        if migrator.run_migration(&migration).await? {
            info!(
                version = migration.version,
                description = %migration.description,
                "Applied migration"
            );
            applied += 1;
        }
    }

    Ok(applied)
}
