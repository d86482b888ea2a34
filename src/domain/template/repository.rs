use async_trait::async_trait;
use std::fmt::Debug;
use uuid::Uuid;

use super::Template;
use crate::domain::listing::ListFilter;
use crate::domain::user::UserId;
use crate::domain::DomainError;

/// Repository trait for template storage
#[async_trait]
pub trait TemplateRepository: Send + Sync + Debug {
    /// Insert a template. A second template for the same `source_archive_id`
    /// must fail with `DomainError::Conflict`, enforced by storage.
    async fn create(&self, template: Template) -> Result<Template, DomainError>;

    async fn get(&self, id: Uuid) -> Result<Option<Template>, DomainError>;

    async fn update(&self, template: &Template) -> Result<Template, DomainError>;

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError>;

    async fn list(
        &self,
        user_id: &UserId,
        filter: &ListFilter,
    ) -> Result<(Vec<Template>, u64), DomainError>;

    async fn count(&self, user_id: &UserId) -> Result<u64, DomainError>;

    async fn find_by_source_archive(
        &self,
        archive_id: Uuid,
    ) -> Result<Option<Template>, DomainError>;
}
