use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::domain::note::{ExpressionNote, NoteFilter, NoteRepository};
use crate::domain::user::UserId;
use crate::domain::DomainError;
use crate::infrastructure::storage::escape_like;

const NOTE_COLUMNS: &str =
    "id, user_id, term, description, example, is_starred, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresNoteRepository {
    pool: PgPool,
}

impl PostgresNoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_note_filter(builder: &mut QueryBuilder<'_, Postgres>, user_id: &UserId, filter: &NoteFilter) {
    builder.push(" WHERE user_id = ");
    builder.push_bind(user_id.as_uuid());

    if let Some(ref q) = filter.search {
        let pattern = format!("%{}%", escape_like(q));
        builder.push(" AND (term ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" ESCAPE '\\' OR description ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" ESCAPE '\\' OR example ILIKE ");
        builder.push_bind(pattern);
        builder.push(" ESCAPE '\\')");
    }
}

#[async_trait]
impl NoteRepository for PostgresNoteRepository {
    async fn create(&self, note: ExpressionNote) -> Result<ExpressionNote, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO expression_notes (id, user_id, term, description, example,
                                          is_starred, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(note.id)
        .bind(note.user_id.as_uuid())
        .bind(&note.term)
        .bind(&note.description)
        .bind(&note.example)
        .bind(note.is_starred)
        .bind(note.created_at)
        .bind(note.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create note: {}", e)))?;

        Ok(note)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ExpressionNote>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM expression_notes WHERE id = $1",
            NOTE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get note: {}", e)))?;

        Ok(row.as_ref().map(row_to_note))
    }

    async fn update(&self, note: &ExpressionNote) -> Result<ExpressionNote, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE expression_notes
            SET term = $2, description = $3, example = $4, is_starred = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(note.id)
        .bind(&note.term)
        .bind(&note.description)
        .bind(&note.example)
        .bind(note.is_starred)
        .bind(note.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to update note: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Note not found"));
        }

        Ok(note.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM expression_notes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete note: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(
        &self,
        user_id: &UserId,
        filter: &NoteFilter,
    ) -> Result<(Vec<ExpressionNote>, u64), DomainError> {
        let mut count_query =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM expression_notes");
        push_note_filter(&mut count_query, user_id, filter);

        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count notes: {}", e)))?;

        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM expression_notes",
            NOTE_COLUMNS
        ));
        push_note_filter(&mut query, user_id, filter);
        query.push(" ORDER BY ");
        query.push(filter.sort.order_by());
        query.push(" LIMIT ");
        query.push_bind(i64::from(filter.limit));
        query.push(" OFFSET ");
        query.push_bind(filter.offset() as i64);

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list notes: {}", e)))?;

        Ok((rows.iter().map(row_to_note).collect(), total as u64))
    }
}

fn row_to_note(row: &PgRow) -> ExpressionNote {
    ExpressionNote {
        id: row.get("id"),
        user_id: UserId::new(row.get("user_id")),
        term: row.get("term"),
        description: row.get("description"),
        example: row.get("example"),
        is_starred: row.get("is_starred"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
