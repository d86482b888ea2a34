use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;
use uuid::Uuid;

use super::Archive;
use crate::domain::listing::ListFilter;
use crate::domain::user::UserId;
use crate::domain::DomainError;

/// Repository trait for archive storage
#[async_trait]
pub trait ArchiveRepository: Send + Sync + Debug {
    async fn create(&self, archive: Archive) -> Result<Archive, DomainError>;

    async fn get(&self, id: Uuid) -> Result<Option<Archive>, DomainError>;

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError>;

    /// One page of a user's archives, newest first, with the total match count
    async fn list(
        &self,
        user_id: &UserId,
        filter: &ListFilter,
    ) -> Result<(Vec<Archive>, u64), DomainError>;

    async fn count(&self, user_id: &UserId) -> Result<u64, DomainError>;

    /// Delete a user's archives created strictly before `cutoff`
    async fn delete_created_before(
        &self,
        user_id: &UserId,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, DomainError>;

    /// IDs of a user's `n` oldest archives
    async fn oldest_ids(&self, user_id: &UserId, n: u64) -> Result<Vec<Uuid>, DomainError>;

    async fn delete_ids(&self, user_id: &UserId, ids: &[Uuid]) -> Result<u64, DomainError>;
}
