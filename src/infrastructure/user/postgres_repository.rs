//! PostgreSQL user repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::billing::{CreditTransaction, Subscription, SubscriptionStatus};
use crate::domain::tier::Tier;
use crate::domain::user::{User, UserId, UserRepository, INSUFFICIENT_CREDITS};
use crate::domain::DomainError;
use crate::infrastructure::storage::is_unique_violation;

const USER_COLUMNS: &str =
    "id, email, username, password_hash, credit_balance, tier, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_subscriptions(&self, id: Uuid) -> Result<Vec<Subscription>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, status, start_at, end_at
            FROM subscriptions
            WHERE user_id = $1
            ORDER BY start_at
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to load subscriptions: {}", e)))?;

        rows.iter().map(row_to_subscription).collect()
    }

    async fn hydrate(&self, row: Option<PgRow>) -> Result<Option<User>, DomainError> {
        match row {
            Some(row) => {
                let id: Uuid = row.get("id");
                let subscriptions = self.load_subscriptions(id).await?;
                Ok(Some(row_to_user(&row, subscriptions)?))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get user: {}", e)))?;

        self.hydrate(row).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get user by email: {}", e)))?;

        self.hydrate(row).await
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, username, password_hash, credit_balance, tier,
                               created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id().as_uuid())
        .bind(user.email())
        .bind(user.username())
        .bind(user.password_hash())
        .bind(user.credit_balance())
        .bind(user.persisted_tier().as_str())
        .bind(user.created_at())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict("Email already in use")
            } else {
                DomainError::storage(format!("Failed to create user: {}", e))
            }
        })?;

        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET username = $2, password_hash = $3, tier = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user.id().as_uuid())
        .bind(user.username())
        .bind(user.password_hash())
        .bind(user.persisted_tier().as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to update user: {}", e)))?;

        self.hydrate(row)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", user.id())))
    }

    async fn charge_credits(
        &self,
        id: &UserId,
        cost: i64,
        reason: &str,
    ) -> Result<i64, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        let balance: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE users
            SET credit_balance = credit_balance - $2, updated_at = NOW()
            WHERE id = $1 AND credit_balance >= $2
            RETURNING credit_balance
            "#,
        )
        .bind(id.as_uuid())
        .bind(cost)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to charge credits: {}", e)))?;

        let Some(balance) = balance else {
            return Err(DomainError::forbidden(INSUFFICIENT_CREDITS));
        };

        let entry = CreditTransaction::charge(*id, cost, reason);

        sqlx::query(
            r#"
            INSERT INTO credit_transactions (id, user_id, amount, status, reason, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.id)
        .bind(entry.user_id.as_uuid())
        .bind(entry.amount)
        .bind(entry.status.as_str())
        .bind(&entry.reason)
        .bind(entry.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to record credit transaction: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit credit charge: {}", e)))?;

        Ok(balance)
    }
}

fn row_to_user(row: &PgRow, subscriptions: Vec<Subscription>) -> Result<User, DomainError> {
    let tier: String = row.get("tier");
    let tier = Tier::parse(&tier)
        .ok_or_else(|| DomainError::storage(format!("Invalid tier in database: {}", tier)))?;

    Ok(User::restore(
        UserId::new(row.get("id")),
        row.get("email"),
        row.get("username"),
        row.get("password_hash"),
        row.get("credit_balance"),
        tier,
        subscriptions,
        row.get::<DateTime<Utc>, _>("created_at"),
        row.get::<DateTime<Utc>, _>("updated_at"),
    ))
}

fn row_to_subscription(row: &PgRow) -> Result<Subscription, DomainError> {
    let status: String = row.get("status");
    let status = SubscriptionStatus::parse(&status).ok_or_else(|| {
        DomainError::storage(format!("Invalid subscription status in database: {}", status))
    })?;

    Ok(Subscription {
        id: row.get("id"),
        user_id: UserId::new(row.get("user_id")),
        status,
        start_at: row.get("start_at"),
        end_at: row.get("end_at"),
    })
}
