use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::listing::{make_preview, Listable};
use crate::domain::user::UserId;

/// Tone recorded when a generation did not specify one
pub const DEFAULT_TONE: &str = "neutral";

/// One persisted generation result. Never updated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Archive {
    pub id: Uuid,
    pub user_id: UserId,
    pub title: Option<String>,
    pub content: String,
    pub preview: String,
    pub tone: String,
    pub purpose: Option<String>,
    pub relationship: Option<String>,
    pub rationale: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Archive {
    /// Create an archive; the preview is derived from the content
    pub fn new(user_id: UserId, content: impl Into<String>, tone: Option<String>) -> Self {
        let content = content.into();

        Self {
            id: Uuid::new_v4(),
            user_id,
            title: None,
            preview: make_preview(&content),
            content,
            tone: tone.unwrap_or_else(|| DEFAULT_TONE.to_string()),
            purpose: None,
            relationship: None,
            rationale: None,
            created_at: Utc::now(),
        }
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

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Backdate an archive
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

impl Listable for Archive {
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
    fn test_default_tone() {
        let archive = Archive::new(UserId::generate(), "Dear professor", None);
        assert_eq!(archive.tone, "neutral");
        assert_eq!(archive.preview, "Dear professor");
    }

    #[test]
    fn test_long_content_preview() {
        let archive = Archive::new(UserId::generate(), "x".repeat(450), Some("formal".into()));
        assert_eq!(archive.preview.chars().count(), 200);
        assert_eq!(archive.content.len(), 450);
    }
}
