use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::archive::{Archive, ArchiveRepository};
use crate::domain::listing::ListFilter;
use crate::domain::user::UserId;
use crate::domain::DomainError;

#[derive(Debug, Default)]
pub struct InMemoryArchiveRepository {
    archives: RwLock<HashMap<Uuid, Archive>>,
}

impl InMemoryArchiveRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArchiveRepository for InMemoryArchiveRepository {
    async fn create(&self, archive: Archive) -> Result<Archive, DomainError> {
        let mut archives = self.archives.write().await;
        archives.insert(archive.id, archive.clone());
        Ok(archive)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Archive>, DomainError> {
        Ok(self.archives.read().await.get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        Ok(self.archives.write().await.remove(&id).is_some())
    }

    async fn list(
        &self,
        user_id: &UserId,
        filter: &ListFilter,
    ) -> Result<(Vec<Archive>, u64), DomainError> {
        let archives = self.archives.read().await;

        let mut matching: Vec<&Archive> = archives
            .values()
            .filter(|a| &a.user_id == user_id && filter.matches(*a))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit as usize)
            .cloned()
            .collect();

        Ok((page, total))
    }

    async fn count(&self, user_id: &UserId) -> Result<u64, DomainError> {
        let archives = self.archives.read().await;
        Ok(archives.values().filter(|a| &a.user_id == user_id).count() as u64)
    }

    async fn delete_created_before(
        &self,
        user_id: &UserId,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        let mut archives = self.archives.write().await;
        let before = archives.len();
        archives.retain(|_, a| !(&a.user_id == user_id && a.created_at < cutoff));
        Ok((before - archives.len()) as u64)
    }

    async fn oldest_ids(&self, user_id: &UserId, n: u64) -> Result<Vec<Uuid>, DomainError> {
        let archives = self.archives.read().await;

        let mut owned: Vec<&Archive> = archives
            .values()
            .filter(|a| &a.user_id == user_id)
            .collect();
        owned.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        Ok(owned.into_iter().take(n as usize).map(|a| a.id).collect())
    }

    async fn delete_ids(&self, user_id: &UserId, ids: &[Uuid]) -> Result<u64, DomainError> {
        let mut archives = self.archives.write().await;
        let mut deleted = 0;

        for id in ids {
            if archives.get(id).is_some_and(|a| &a.user_id == user_id) {
                archives.remove(id);
                deleted += 1;
            }
        }

        Ok(deleted)
    }
}
