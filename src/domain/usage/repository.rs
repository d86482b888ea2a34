//! Usage repository trait

use async_trait::async_trait;
use chrono::NaiveDate;
use std::fmt::Debug;

use super::UsageRecord;
use crate::domain::user::UserId;
use crate::domain::DomainError;

/// Storage for daily usage counters.
///
/// Both write paths are upserts keyed by `(user_id, date)`; implementations must
/// never lose a concurrent increment or create two rows for one key.
#[async_trait]
pub trait UsageRepository: Send + Sync + Debug {
    /// Read the row for a key, creating it with zero counters if absent
    async fn get_or_create(
        &self,
        user_id: &UserId,
        date: NaiveDate,
    ) -> Result<UsageRecord, DomainError>;

    /// Add one request and `tokens_used` tokens; a missing row is created with
    /// the increment already applied
    async fn increment(
        &self,
        user_id: &UserId,
        date: NaiveDate,
        is_advanced: bool,
        tokens_used: u64,
    ) -> Result<UsageRecord, DomainError>;

    /// Rows with `from <= date <= to`, newest first
    async fn list_range(
        &self,
        user_id: &UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<UsageRecord>, DomainError>;
}
