use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::listing::ListFilter;
use crate::domain::template::{Template, TemplateRepository, ALREADY_CONVERTED};
use crate::domain::user::UserId;
use crate::domain::DomainError;

/// In-memory templates; the write lock serializes the source-archive
/// uniqueness check with the insert
#[derive(Debug, Default)]
pub struct InMemoryTemplateRepository {
    templates: RwLock<HashMap<Uuid, Template>>,
}

impl InMemoryTemplateRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateRepository for InMemoryTemplateRepository {
    async fn create(&self, template: Template) -> Result<Template, DomainError> {
        let mut templates = self.templates.write().await;

        if let Some(source) = template.source_archive_id {
            if templates
                .values()
                .any(|t| t.source_archive_id == Some(source))
            {
                return Err(DomainError::conflict(ALREADY_CONVERTED));
            }
        }

        templates.insert(template.id, template.clone());
        Ok(template)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Template>, DomainError> {
        Ok(self.templates.read().await.get(&id).cloned())
    }

    async fn update(&self, template: &Template) -> Result<Template, DomainError> {
        let mut templates = self.templates.write().await;

        if !templates.contains_key(&template.id) {
            return Err(DomainError::not_found("Template not found"));
        }

        templates.insert(template.id, template.clone());
        Ok(template.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        Ok(self.templates.write().await.remove(&id).is_some())
    }

    async fn list(
        &self,
        user_id: &UserId,
        filter: &ListFilter,
    ) -> Result<(Vec<Template>, u64), DomainError> {
        let templates = self.templates.read().await;

        let mut matching: Vec<&Template> = templates
            .values()
            .filter(|t| &t.user_id == user_id && filter.matches(*t))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit as usize)
            .cloned()
            .collect();

        Ok((items, total))
    }

    async fn count(&self, user_id: &UserId) -> Result<u64, DomainError> {
        let templates = self.templates.read().await;
        Ok(templates.values().filter(|t| &t.user_id == user_id).count() as u64)
    }

    async fn find_by_source_archive(
        &self,
        archive_id: Uuid,
    ) -> Result<Option<Template>, DomainError> {
        let templates = self.templates.read().await;
        Ok(templates
            .values()
            .find(|t| t.source_archive_id == Some(archive_id))
            .cloned())
    }
}
