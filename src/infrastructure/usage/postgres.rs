//! PostgreSQL usage repository

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::usage::{UsageRecord, UsageRepository};
use crate::domain::user::UserId;
use crate::domain::DomainError;

#[derive(Debug, Clone)]
pub struct PostgresUsageRepository {
    pool: PgPool,
}

impl PostgresUsageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageRepository for PostgresUsageRepository {
    async fn get_or_create(
        &self,
        user_id: &UserId,
        date: NaiveDate,
    ) -> Result<UsageRecord, DomainError> {
        // The no-op update makes RETURNING yield the existing row on conflict
        let row = sqlx::query(
            r#"
            INSERT INTO usage_tracking (user_id, date)
            VALUES ($1, $2)
            ON CONFLICT (user_id, date) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING user_id, date, basic_requests, advanced_requests, total_tokens_used
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get usage: {}", e)))?;

        Ok(row_to_usage(&row))
    }

    async fn increment(
        &self,
        user_id: &UserId,
        date: NaiveDate,
        is_advanced: bool,
        tokens_used: u64,
    ) -> Result<UsageRecord, DomainError> {
        let (basic, advanced) = if is_advanced { (0, 1) } else { (1, 0) };

        let row = sqlx::query(
            r#"
            INSERT INTO usage_tracking (user_id, date, basic_requests, advanced_requests,
                                        total_tokens_used)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, date) DO UPDATE SET
                basic_requests = usage_tracking.basic_requests + EXCLUDED.basic_requests,
                advanced_requests = usage_tracking.advanced_requests + EXCLUDED.advanced_requests,
                total_tokens_used = usage_tracking.total_tokens_used + EXCLUDED.total_tokens_used
            RETURNING user_id, date, basic_requests, advanced_requests, total_tokens_used
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(date)
        .bind(basic)
        .bind(advanced)
        .bind(tokens_used as i64)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to increment usage: {}", e)))?;

        Ok(row_to_usage(&row))
    }

    async fn list_range(
        &self,
        user_id: &UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<UsageRecord>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, date, basic_requests, advanced_requests, total_tokens_used
            FROM usage_tracking
            WHERE user_id = $1 AND date >= $2 AND date <= $3
            ORDER BY date DESC
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list usage: {}", e)))?;

        Ok(rows.iter().map(row_to_usage).collect())
    }
}

fn row_to_usage(row: &PgRow) -> UsageRecord {
    let basic: i32 = row.get("basic_requests");
    let advanced: i32 = row.get("advanced_requests");
    let tokens: i64 = row.get("total_tokens_used");

    UsageRecord {
        user_id: UserId::new(row.get("user_id")),
        date: row.get("date"),
        basic_requests: basic.max(0) as u32,
        advanced_requests: advanced.max(0) as u32,
        total_tokens_used: tokens.max(0) as u64,
    }
}
