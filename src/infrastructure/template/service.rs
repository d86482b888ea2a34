//! Template CRUD with the creation quota and credit charge

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::archive::ArchiveRepository;
use crate::domain::billing::reasons;
use crate::domain::listing::{ListQuery, Page};
use crate::domain::template::{
    can_create_template, Template, TemplateRepository, TemplateTier, TemplateUpdate,
    ALREADY_CONVERTED,
};
use crate::domain::user::{UserId, UserRepository};
use crate::domain::DomainError;
use crate::infrastructure::observability::record_credit_charge;

const DEFAULT_TEMPLATE_PAGE_SIZE: u32 = 20;
const MAX_TITLE_CHARS: usize = 255;
const MAX_TONE_CHARS: usize = 50;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tone: Option<String>,
    pub relationship: Option<String>,
    pub purpose: Option<String>,
    pub rationale: Option<String>,
    pub source_archive_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTemplateRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tone: Option<String>,
    pub relationship: Option<String>,
    pub purpose: Option<String>,
    pub rationale: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateCreated {
    pub id: Uuid,
    pub message: String,
    pub credit_charged: i64,
}

fn check_title(title: Option<&String>) -> Result<(), DomainError> {
    match title {
        Some(t) if t.chars().count() > MAX_TITLE_CHARS => Err(DomainError::validation(format!(
            "title must be at most {} characters",
            MAX_TITLE_CHARS
        ))),
        _ => Ok(()),
    }
}

fn check_tone(tone: &str) -> Result<(), DomainError> {
    if tone.trim().is_empty() {
        return Err(DomainError::validation("tone must not be empty"));
    }
    if tone.chars().count() > MAX_TONE_CHARS {
        return Err(DomainError::validation(format!(
            "tone must be at most {} characters",
            MAX_TONE_CHARS
        )));
    }
    Ok(())
}

impl CreateTemplateRequest {
    fn validate(&self) -> Result<(String, String), DomainError> {
        check_title(self.title.as_ref())?;

        let content = self
            .content
            .clone()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| DomainError::validation("content must not be empty"))?;

        let tone = self
            .tone
            .clone()
            .ok_or_else(|| DomainError::validation("tone is required"))?;
        check_tone(&tone)?;

        Ok((content, tone))
    }
}

impl UpdateTemplateRequest {
    fn into_update(self) -> Result<TemplateUpdate, DomainError> {
        check_title(self.title.as_ref())?;

        if let Some(ref content) = self.content {
            if content.trim().is_empty() {
                return Err(DomainError::validation("content must not be empty"));
            }
        }
        if let Some(ref tone) = self.tone {
            check_tone(tone)?;
        }

        Ok(TemplateUpdate {
            title: self.title,
            content: self.content,
            tone: self.tone,
            relationship: self.relationship,
            purpose: self.purpose,
            rationale: self.rationale,
        })
    }
}

#[derive(Debug)]
pub struct TemplateService {
    templates: Arc<dyn TemplateRepository>,
    archives: Arc<dyn ArchiveRepository>,
    users: Arc<dyn UserRepository>,
}

impl TemplateService {
    /// Create a new template service
    pub fn new(
        templates: Arc<dyn TemplateRepository>,
        archives: Arc<dyn ArchiveRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            templates,
            archives,
            users,
        }
    }

    /// Create a template under the caller's quota, charging credit when owed.
    ///
    /// The count check is optimistic; two concurrent creations at the quota
    /// edge can both pass. The `source_archive_id` uniqueness is enforced by
    /// storage regardless of the pre-check.
    pub async fn create(
        &self,
        user_id: &UserId,
        request: CreateTemplateRequest,
    ) -> Result<TemplateCreated, DomainError> {
        let (content, tone) = request.validate()?;

        if let Some(archive_id) = request.source_archive_id {
            let archive = self
                .archives
                .get(archive_id)
                .await?
                .ok_or_else(|| DomainError::not_found("Archive not found"))?;

            if &archive.user_id != user_id {
                return Err(DomainError::forbidden("You do not have access to this archive"));
            }

            if self
                .templates
                .find_by_source_archive(archive_id)
                .await?
                .is_some()
            {
                return Err(DomainError::conflict(ALREADY_CONVERTED));
            }
        }

        let user = self
            .users
            .get(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User not found"))?;

        let tier = TemplateTier::resolve(&user, Utc::now());
        let current = self.templates.count(user_id).await?;
        let decision = can_create_template(tier, current, user.credit_balance());

        if !decision.allowed {
            return Err(DomainError::forbidden(decision.message));
        }

        let template = Template::new(*user_id, content, tone)
            .with_title(request.title)
            .with_relationship(request.relationship)
            .with_purpose(request.purpose)
            .with_rationale(request.rationale)
            .with_source_archive(request.source_archive_id);

        // A duplicate conversion fails here, before any credit moves
        let template = self.templates.create(template).await?;

        let credit_charged = if decision.requires_credit && decision.cost > 0 {
            let balance = match self
                .users
                .charge_credits(user_id, decision.cost, reasons::TEMPLATE_SAVE)
                .await
            {
                Ok(balance) => balance,
                Err(e) => {
                    if let Err(rollback) = self.templates.delete(template.id).await {
                        warn!(
                            template_id = %template.id,
                            error = %rollback,
                            "Failed to remove unpaid template"
                        );
                    }
                    return Err(e);
                }
            };
            record_credit_charge(reasons::TEMPLATE_SAVE, decision.cost);
            info!(
                user_id = %user_id,
                cost = decision.cost,
                balance,
                "Charged credit for template save"
            );
            decision.cost
        } else {
            0
        };

        Ok(TemplateCreated {
            id: template.id,
            message: if credit_charged > 0 {
                decision.message
            } else {
                "Template saved.".to_string()
            },
            credit_charged,
        })
    }

    /// Apply a partial update; the preview follows the content
    pub async fn update(
        &self,
        user_id: &UserId,
        id: Uuid,
        request: UpdateTemplateRequest,
    ) -> Result<Template, DomainError> {
        let update = request.into_update()?;
        let mut template = self.find_one(user_id, id).await?;

        template.apply(update);
        self.templates.update(&template).await
    }

    /// Delete one template owned by the caller
    pub async fn delete(&self, user_id: &UserId, id: Uuid) -> Result<(), DomainError> {
        self.find_one(user_id, id).await?;
        self.templates.delete(id).await?;
        Ok(())
    }

    /// List the caller's templates
    pub async fn find_all(
        &self,
        user_id: &UserId,
        query: ListQuery,
    ) -> Result<Page<Template>, DomainError> {
        let filter = query.validate(DEFAULT_TEMPLATE_PAGE_SIZE)?;
        let (items, total) = self.templates.list(user_id, &filter).await?;

        Ok(Page {
            items,
            total,
            page: filter.page,
            limit: filter.limit,
        })
    }

    /// Get one template owned by the caller
    pub async fn find_one(&self, user_id: &UserId, id: Uuid) -> Result<Template, DomainError> {
        let template = self
            .templates
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Template not found"))?;

        if &template.user_id != user_id {
            return Err(DomainError::forbidden("You do not have access to this template"));
        }

        Ok(template)
    }
}
