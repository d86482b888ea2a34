use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::listing::{make_preview, Listable};
use crate::domain::user::UserId;

/// A user-curated, reusable email pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: Uuid,
    pub user_id: UserId,
    pub title: Option<String>,
    pub content: String,
    pub preview: String,
    pub tone: String,
    pub purpose: Option<String>,
    pub relationship: Option<String>,
    pub rationale: Option<String>,
    /// At most one template may reference a given archive
    pub source_archive_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct TemplateUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tone: Option<String>,
    pub relationship: Option<String>,
    pub purpose: Option<String>,
    pub rationale: Option<String>,
}

impl Template {
    /// Create a template; the preview is derived from the content
    pub fn new(user_id: UserId, content: impl Into<String>, tone: impl Into<String>) -> Self {
        let content = content.into();
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            user_id,
            title: None,
            preview: make_preview(&content),
            content,
            tone: tone.into(),
            purpose: None,
            relationship: None,
            rationale: None,
            source_archive_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn with_purpose(mut self, purpose: Option<String>) -> Self {
        self.purpose = purpose;
        self
    }

    pub fn with_relationship(mut self, relationship: Option<String>) -> Self {
        self.relationship = relationship;
        self
    }

    pub fn with_rationale(mut self, rationale: Option<String>) -> Self {
        self.rationale = rationale;
        self
    }

    /// Record the archive this template was converted from
    pub fn with_source_archive(mut self, source_archive_id: Option<Uuid>) -> Self {
        self.source_archive_id = source_archive_id;
        self
    }

    /// Apply a partial update, recomputing the preview when content changes
    pub fn apply(&mut self, update: TemplateUpdate) {
        if let Some(title) = update.title {
            self.title = Some(title);
        }
        if let Some(content) = update.content {
            self.preview = make_preview(&content);
            self.content = content;
        }
        if let Some(tone) = update.tone {
            self.tone = tone;
        }
        if let Some(relationship) = update.relationship {
            self.relationship = Some(relationship);
        }
        if let Some(purpose) = update.purpose {
            self.purpose = Some(purpose);
        }
        if let Some(rationale) = update.rationale {
            self.rationale = Some(rationale);
        }
        self.updated_at = Utc::now();
    }
}

impl Listable for Template {
    fn content(&self) -> &str {
        &self.content
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn tone(&self) -> Option<&str> {
        Some(&self.tone)
    }

    fn relationship(&self) -> Option<&str> {
        self.relationship.as_deref()
    }

    fn purpose(&self) -> Option<&str> {
        self.purpose.as_deref()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_recomputes_preview() {
        let mut template = Template::new(UserId::generate(), "short", "formal");
        template.apply(TemplateUpdate {
            content: Some("y".repeat(300)),
            ..Default::default()
        });

        assert!(template.preview.ends_with("..."));
        assert_eq!(template.tone, "formal");
    }

    #[test]
    fn test_apply_keeps_untouched_fields() {
        let mut template = Template::new(UserId::generate(), "body", "formal")
            .with_title(Some("Greeting".into()));
        template.apply(TemplateUpdate {
            tone: Some("casual".into()),
            ..Default::default()
        });

        assert_eq!(template.title.as_deref(), Some("Greeting"));
        assert_eq!(template.content, "body");
        assert_eq!(template.preview, "body");
        assert_eq!(template.tone, "casual");
    }
}
