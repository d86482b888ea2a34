use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::domain::archive::{Archive, ArchiveRepository};
use crate::domain::listing::ListFilter;
use crate::domain::user::UserId;
use crate::domain::DomainError;
use crate::infrastructure::storage::push_list_filter;

const ARCHIVE_COLUMNS: &str =
    "id, user_id, title, content, preview, tone, purpose, relationship, rationale, created_at";

#[derive(Debug, Clone)]
pub struct PostgresArchiveRepository {
    pool: PgPool,
}

impl PostgresArchiveRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArchiveRepository for PostgresArchiveRepository {
    async fn create(&self, archive: Archive) -> Result<Archive, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO archives (id, user_id, title, content, preview, tone, purpose,
                                  relationship, rationale, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(archive.id)
        .bind(archive.user_id.as_uuid())
        .bind(&archive.title)
        .bind(&archive.content)
        .bind(&archive.preview)
        .bind(&archive.tone)
        .bind(&archive.purpose)
        .bind(&archive.relationship)
        .bind(&archive.rationale)
        .bind(archive.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create archive: {}", e)))?;

        Ok(archive)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Archive>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM archives WHERE id = $1",
            ARCHIVE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get archive: {}", e)))?;

        Ok(row.as_ref().map(row_to_archive))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM archives WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete archive: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(
        &self,
        user_id: &UserId,
        filter: &ListFilter,
    ) -> Result<(Vec<Archive>, u64), DomainError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM archives");
        push_list_filter(&mut count_query, user_id, filter);

        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count archives: {}", e)))?;

        let mut query =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM archives", ARCHIVE_COLUMNS));
        push_list_filter(&mut query, user_id, filter);
        query.push(" ORDER BY created_at DESC LIMIT ");
        query.push_bind(i64::from(filter.limit));
        query.push(" OFFSET ");
        query.push_bind(filter.offset() as i64);

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list archives: {}", e)))?;

        Ok((rows.iter().map(row_to_archive).collect(), total as u64))
    }

    async fn count(&self, user_id: &UserId) -> Result<u64, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM archives WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count archives: {}", e)))?;

        Ok(count as u64)
    }

    async fn delete_created_before(
        &self,
        user_id: &UserId,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM archives WHERE user_id = $1 AND created_at < $2")
            .bind(user_id.as_uuid())
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete old archives: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn oldest_ids(&self, user_id: &UserId, n: u64) -> Result<Vec<Uuid>, DomainError> {
        sqlx::query_scalar(
            "SELECT id FROM archives WHERE user_id = $1 ORDER BY created_at ASC LIMIT $2",
        )
        .bind(user_id.as_uuid())
        .bind(n as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to select oldest archives: {}", e)))
    }

    async fn delete_ids(&self, user_id: &UserId, ids: &[Uuid]) -> Result<u64, DomainError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM archives WHERE user_id = $1 AND id = ANY($2)")
            .bind(user_id.as_uuid())
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete archives: {}", e)))?;

        Ok(result.rows_affected())
    }
}

fn row_to_archive(row: &PgRow) -> Archive {
    Archive {
        id: row.get("id"),
        user_id: UserId::new(row.get("user_id")),
        title: row.get("title"),
        content: row.get("content"),
        preview: row.get("preview"),
        tone: row.get("tone"),
        purpose: row.get("purpose"),
        relationship: row.get("relationship"),
        rationale: row.get("rationale"),
        created_at: row.get("created_at"),
    }
}
