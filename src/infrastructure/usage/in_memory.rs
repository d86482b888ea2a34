//! In-memory usage repository

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::domain::usage::{UsageRecord, UsageRepository};
use crate::domain::user::UserId;
use crate::domain::DomainError;

/// Rows keyed by `(user, date)`; the write lock makes each upsert atomic
#[derive(Debug, Default)]
pub struct InMemoryUsageRepository {
    rows: RwLock<HashMap<(UserId, NaiveDate), UsageRecord>>,
}

impl InMemoryUsageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn row_count(&self) -> usize {
        self.rows.read().await.len()
    }
}

#[async_trait]
impl UsageRepository for InMemoryUsageRepository {
    async fn get_or_create(
        &self,
        user_id: &UserId,
        date: NaiveDate,
    ) -> Result<UsageRecord, DomainError> {
        let mut rows = self.rows.write().await;

        Ok(rows
            .entry((*user_id, date))
            .or_insert_with(|| UsageRecord::empty(*user_id, date))
            .clone())
    }

    async fn increment(
        &self,
        user_id: &UserId,
        date: NaiveDate,
        is_advanced: bool,
        tokens_used: u64,
    ) -> Result<UsageRecord, DomainError> {
        let mut rows = self.rows.write().await;

        let row = rows
            .entry((*user_id, date))
            .or_insert_with(|| UsageRecord::empty(*user_id, date));
        row.record(is_advanced, tokens_used);

        Ok(row.clone())
    }

    async fn list_range(
        &self,
        user_id: &UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<UsageRecord>, DomainError> {
        let rows = self.rows.read().await;

        let mut records: Vec<UsageRecord> = rows
            .values()
            .filter(|r| &r.user_id == user_id && r.date >= from && r.date <= to)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.date.cmp(&a.date));

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let repo = InMemoryUsageRepository::new();
        let user = UserId::generate();
        let today = crate::domain::calendar::today_local();

        let first = repo.get_or_create(&user, today).await.unwrap();
        let second = repo.get_or_create(&user, today).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(repo.row_count().await, 1);
    }

    #[tokio::test]
    async fn test_increment_creates_row_with_increment_applied() {
        let repo = InMemoryUsageRepository::new();
        let user = UserId::generate();
        let today = crate::domain::calendar::today_local();

        let row = repo.increment(&user, today, true, 42).await.unwrap();
        assert_eq!(row.advanced_requests, 1);
        assert_eq!(row.basic_requests, 0);
        assert_eq!(row.total_tokens_used, 42);
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let repo = Arc::new(InMemoryUsageRepository::new());
        let user = UserId::generate();
        let today = crate::domain::calendar::today_local();

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.increment(&user, today, false, 1).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let row = repo.get_or_create(&user, today).await.unwrap();
        assert_eq!(row.basic_requests, 50);
        assert_eq!(row.total_tokens_used, 50);
    }

    #[tokio::test]
    async fn test_list_range_newest_first() {
        let repo = InMemoryUsageRepository::new();
        let user = UserId::generate();
        let today = crate::domain::calendar::today_local();

        for offset in 0..10 {
            repo.increment(&user, today - Duration::days(offset), false, 1)
                .await
                .unwrap();
        }
        repo.increment(&UserId::generate(), today, false, 1)
            .await
            .unwrap();

        let rows = repo
            .list_range(&user, today - Duration::days(7), today)
            .await
            .unwrap();

        assert_eq!(rows.len(), 8);
        assert_eq!(rows[0].date, today);
        assert!(rows.windows(2).all(|w| w[0].date > w[1].date));
    }
}
