use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::session::{RefreshSession, SessionRepository};
use crate::domain::user::UserId;
use crate::domain::DomainError;
use crate::infrastructure::storage::is_unique_violation;

#[derive(Debug, Clone)]
pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    async fn create(&self, session: RefreshSession) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_sessions (jti, user_id, expires_at, revoked_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&session.jti)
        .bind(session.user_id.as_uuid())
        .bind(session.expires_at)
        .bind(session.revoked_at)
        .bind(session.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict("Session already exists")
            } else {
                DomainError::storage(format!("Failed to create session: {}", e))
            }
        })?;

        Ok(())
    }

    async fn get(&self, jti: &str) -> Result<Option<RefreshSession>, DomainError> {
        let row = sqlx::query(
            "SELECT jti, user_id, expires_at, revoked_at, created_at \
             FROM refresh_sessions WHERE jti = $1",
        )
        .bind(jti)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get session: {}", e)))?;

        Ok(row.as_ref().map(row_to_session))
    }

    async fn revoke(&self, jti: &str) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "UPDATE refresh_sessions SET revoked_at = NOW() WHERE jti = $1 AND revoked_at IS NULL",
        )
        .bind(jti)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to revoke session: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_all(&self, user_id: &UserId) -> Result<u64, DomainError> {
        let result = sqlx::query(
            "UPDATE refresh_sessions SET revoked_at = NOW() \
             WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to revoke sessions: {}", e)))?;

        Ok(result.rows_affected())
    }
}

fn row_to_session(row: &PgRow) -> RefreshSession {
    RefreshSession {
        jti: row.get("jti"),
        user_id: UserId::new(row.get("user_id")),
        expires_at: row.get("expires_at"),
        revoked_at: row.get("revoked_at"),
        created_at: row.get("created_at"),
    }
}
