//! Archive reads, deletes and the retention sweep

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::archive::{Archive, ArchiveRepository, RetentionPolicy};
use crate::domain::calendar::today_local;
use crate::domain::listing::{ListQuery, Page};
use crate::domain::tier::Tier;
use crate::domain::user::{UserId, UserRepository};
use crate::domain::DomainError;

pub const DEFAULT_ARCHIVE_PAGE_SIZE: u32 = 20;

/// Two sequential passes: by age, then by count. Returns rows deleted.
pub async fn cleanup_old_archives(
    archives: &dyn ArchiveRepository,
    user_id: &UserId,
    tier: Tier,
) -> Result<u64, DomainError> {
    let policy = RetentionPolicy::for_tier(tier);

    let deleted_by_date = archives
        .delete_created_before(user_id, policy.cutoff(today_local()))
        .await?;

    let remaining = archives.count(user_id).await?;
    let excess = policy.excess(remaining);

    let deleted_by_count = if excess > 0 {
        let ids = archives.oldest_ids(user_id, excess).await?;
        archives.delete_ids(user_id, &ids).await?
    } else {
        0
    };

    if deleted_by_date + deleted_by_count > 0 {
        info!(
            user_id = %user_id,
            tier = %tier,
            deleted_by_date,
            deleted_by_count,
            "Archive retention sweep"
        );
    }

    Ok(deleted_by_date + deleted_by_count)
}

#[derive(Debug)]
pub struct ArchiveService {
    archives: Arc<dyn ArchiveRepository>,
    users: Arc<dyn UserRepository>,
}

impl ArchiveService {
    /// Create a new archive service
    pub fn new(archives: Arc<dyn ArchiveRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { archives, users }
    }

    /// Persist one generation result
    pub async fn create(&self, archive: Archive) -> Result<Archive, DomainError> {
        self.archives.create(archive).await
    }

    /// One page of the caller's archives. Kicks off the retention sweep for the
    /// caller's tier in the background.
    pub async fn find_all(
        &self,
        user_id: &UserId,
        query: ListQuery,
    ) -> Result<Page<Archive>, DomainError> {
        let filter = query.validate(DEFAULT_ARCHIVE_PAGE_SIZE)?;

        self.spawn_cleanup(user_id).await;

        let (items, total) = self.archives.list(user_id, &filter).await?;

        Ok(Page {
            items,
            total,
            page: filter.page,
            limit: filter.limit,
        })
    }

    /// Get one archive owned by the caller
    pub async fn find_one(&self, user_id: &UserId, id: Uuid) -> Result<Archive, DomainError> {
        let archive = self
            .archives
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Archive not found"))?;

        if &archive.user_id != user_id {
            return Err(DomainError::forbidden("You do not have access to this archive"));
        }

        Ok(archive)
    }

    /// Delete one archive owned by the caller
    pub async fn delete(&self, user_id: &UserId, id: Uuid) -> Result<(), DomainError> {
        self.find_one(user_id, id).await?;
        self.archives.delete(id).await?;
        Ok(())
    }

    async fn spawn_cleanup(&self, user_id: &UserId) {
        let tier = match self.users.get(user_id).await {
            Ok(Some(user)) => user.computed_tier(Utc::now()),
            Ok(None) => return,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Skipping archive sweep");
                return;
            }
        };

        let archives = self.archives.clone();
        let user_id = *user_id;

        tokio::spawn(async move {
            if let Err(e) = cleanup_old_archives(archives.as_ref(), &user_id, tier).await {
                warn!(user_id = %user_id, error = %e, "Archive retention sweep failed");
            }
        });
    }
}
