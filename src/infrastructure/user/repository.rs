//! In-memory user repository

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::billing::{CreditTransaction, Subscription};
use crate::domain::user::{User, UserId, UserRepository, INSUFFICIENT_CREDITS};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct UserTables {
    users: HashMap<UserId, User>,
    email_index: HashMap<String, UserId>,
    ledger: Vec<CreditTransaction>,
}

/// In-memory implementation of UserRepository. Credits and ledger share one
/// lock so a charge is all-or-nothing.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    tables: Arc<RwLock<UserTables>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a user's balance directly, bypassing the ledger
    pub async fn set_credit_balance(&self, id: &UserId, balance: i64) -> Result<(), DomainError> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("User not found"))?;
        user.set_credit_balance(balance);
        Ok(())
    }

    pub async fn add_subscription(&self, subscription: Subscription) -> Result<(), DomainError> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .remove(&subscription.user_id)
            .ok_or_else(|| DomainError::not_found("User not found"))?;
        let id = user.id();
        tables.users.insert(id, user.with_subscription(subscription));
        Ok(())
    }

    /// Ledger entries of a user in insertion order
    pub async fn transactions(&self, id: &UserId) -> Vec<CreditTransaction> {
        let tables = self.tables.read().await;
        tables
            .ledger
            .iter()
            .filter(|t| &t.user_id == id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables
            .email_index
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut tables = self.tables.write().await;

        if tables.email_index.contains_key(user.email()) {
            return Err(DomainError::conflict("Email already in use"));
        }

        tables.email_index.insert(user.email().to_string(), user.id());
        tables.users.insert(user.id(), user.clone());

        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let mut tables = self.tables.write().await;

        let Some(existing) = tables.users.get(&user.id()) else {
            return Err(DomainError::not_found(format!("User '{}' not found", user.id())));
        };

        // Balance and subscriptions are owned by the billing paths
        let mut updated = user.clone();
        updated.set_credit_balance(existing.credit_balance());
        updated.set_subscriptions(existing.subscriptions().to_vec());

        tables.users.insert(updated.id(), updated.clone());
        Ok(updated)
    }

    async fn charge_credits(
        &self,
        id: &UserId,
        cost: i64,
        reason: &str,
    ) -> Result<i64, DomainError> {
        let mut tables = self.tables.write().await;

        let user = tables
            .users
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("User not found"))?;

        if user.credit_balance() < cost {
            return Err(DomainError::forbidden(INSUFFICIENT_CREDITS));
        }

        let balance = user.credit_balance() - cost;
        user.set_credit_balance(balance);
        tables.ledger.push(CreditTransaction::charge(*id, cost, reason));

        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::{SubscriptionStatus, TransactionStatus};
    use chrono::{Duration, Utc};

    async fn seeded(credit: i64) -> (InMemoryUserRepository, UserId) {
        let repo = InMemoryUserRepository::new();
        let user = repo
            .create(User::new("kim@example.com", None, "hash"))
            .await
            .unwrap();
        repo.set_credit_balance(&user.id(), credit).await.unwrap();
        (repo, user.id())
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let (repo, _) = seeded(0).await;
        let result = repo
            .create(User::new("kim@example.com", None, "other"))
            .await;

        assert!(matches!(result, Err(DomainError::Conflict { .. })));
        assert!(repo.get_by_email("kim@example.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_charge_writes_ledger() {
        let (repo, id) = seeded(3).await;

        let balance = repo.charge_credits(&id, 1, "template save").await.unwrap();
        assert_eq!(balance, 2);

        let ledger = repo.transactions(&id).await;
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].amount, -1);
        assert_eq!(ledger[0].status, TransactionStatus::Completed);
        assert_eq!(ledger[0].reason, "template save");
    }

    #[tokio::test]
    async fn test_charge_never_overdraws() {
        let (repo, id) = seeded(0).await;

        let result = repo.charge_credits(&id, 1, "advanced email generation").await;
        assert!(matches!(result, Err(DomainError::Forbidden { .. })));
        assert!(repo.transactions(&id).await.is_empty());
        assert_eq!(repo.get(&id).await.unwrap().unwrap().credit_balance(), 0);
    }

    #[tokio::test]
    async fn test_update_keeps_billing_state() {
        let (repo, id) = seeded(5).await;
        let now = Utc::now();
        repo.add_subscription(Subscription::new(
            id,
            SubscriptionStatus::Active,
            now - Duration::days(1),
            now + Duration::days(30),
        ))
        .await
        .unwrap();

        let mut stale = repo.get(&id).await.unwrap().unwrap().with_credit_balance(99);
        stale.set_username("kim");
        let updated = repo.update(&stale).await.unwrap();

        assert_eq!(updated.username(), Some("kim"));
        assert_eq!(updated.credit_balance(), 5);
        assert_eq!(updated.subscriptions().len(), 1);
    }
}
