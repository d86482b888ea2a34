use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::domain::listing::ListFilter;
use crate::domain::template::{Template, TemplateRepository, ALREADY_CONVERTED};
use crate::domain::user::UserId;
use crate::domain::DomainError;
use crate::infrastructure::storage::{is_unique_violation, push_list_filter};

const TEMPLATE_COLUMNS: &str = "id, user_id, title, content, preview, tone, purpose, \
     relationship, rationale, source_archive_id, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresTemplateRepository {
    pool: PgPool,
}

impl PostgresTemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemplateRepository for PostgresTemplateRepository {
    async fn create(&self, template: Template) -> Result<Template, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO templates (id, user_id, title, content, preview, tone, purpose,
                                   relationship, rationale, source_archive_id,
                                   created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(template.id)
        .bind(template.user_id.as_uuid())
        .bind(&template.title)
        .bind(&template.content)
        .bind(&template.preview)
        .bind(&template.tone)
        .bind(&template.purpose)
        .bind(&template.relationship)
        .bind(&template.rationale)
        .bind(template.source_archive_id)
        .bind(template.created_at)
        .bind(template.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict(ALREADY_CONVERTED)
            } else {
                DomainError::storage(format!("Failed to create template: {}", e))
            }
        })?;

        Ok(template)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Template>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM templates WHERE id = $1",
            TEMPLATE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get template: {}", e)))?;

        Ok(row.as_ref().map(row_to_template))
    }

    async fn update(&self, template: &Template) -> Result<Template, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE templates
            SET title = $2, content = $3, preview = $4, tone = $5, purpose = $6,
                relationship = $7, rationale = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(template.id)
        .bind(&template.title)
        .bind(&template.content)
        .bind(&template.preview)
        .bind(&template.tone)
        .bind(&template.purpose)
        .bind(&template.relationship)
        .bind(&template.rationale)
        .bind(template.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to update template: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Template not found"));
        }

        Ok(template.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM templates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete template: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(
        &self,
        user_id: &UserId,
        filter: &ListFilter,
    ) -> Result<(Vec<Template>, u64), DomainError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM templates");
        push_list_filter(&mut count_query, user_id, filter);

        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count templates: {}", e)))?;

        let mut query =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM templates", TEMPLATE_COLUMNS));
        push_list_filter(&mut query, user_id, filter);
        query.push(" ORDER BY created_at DESC LIMIT ");
        query.push_bind(i64::from(filter.limit));
        query.push(" OFFSET ");
        query.push_bind(filter.offset() as i64);

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list templates: {}", e)))?;

        Ok((rows.iter().map(row_to_template).collect(), total as u64))
    }

    async fn count(&self, user_id: &UserId) -> Result<u64, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM templates WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count templates: {}", e)))?;

        Ok(count as u64)
    }

    async fn find_by_source_archive(
        &self,
        archive_id: Uuid,
    ) -> Result<Option<Template>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM templates WHERE source_archive_id = $1",
            TEMPLATE_COLUMNS
        ))
        .bind(archive_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to find template: {}", e)))?;

        Ok(row.as_ref().map(row_to_template))
    }
}

fn row_to_template(row: &PgRow) -> Template {
    Template {
        id: row.get("id"),
        user_id: UserId::new(row.get("user_id")),
        title: row.get("title"),
        content: row.get("content"),
        preview: row.get("preview"),
        tone: row.get("tone"),
        purpose: row.get("purpose"),
        relationship: row.get("relationship"),
        rationale: row.get("rationale"),
        source_archive_id: row.get("source_archive_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
