//! User repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{User, UserId};
use crate::domain::DomainError;

/// Repository trait for user storage
#[async_trait]
pub trait UserRepository: Send + Sync + Debug {
    /// Get a user by ID, subscriptions included
    async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// Get a user by normalized email (for login)
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// Create a new user; duplicate email is a conflict
    async fn create(&self, user: User) -> Result<User, DomainError>;

    /// Persist profile fields and the cached tier
    async fn update(&self, user: &User) -> Result<User, DomainError>;

    /// Decrement the balance by `cost` and append a ledger entry in one unit.
    /// Returns the balance after the charge.
    async fn charge_credits(
        &self,
        id: &UserId,
        cost: i64,
        reason: &str,
    ) -> Result<i64, DomainError>;

    /// Check if an email is registered
    async fn email_exists(&self, email: &str) -> Result<bool, DomainError> {
        Ok(self.get_by_email(email).await?.is_some())
    }
}
