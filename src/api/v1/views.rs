//! camelCase response bodies for stored records

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::archive::Archive;
use crate::domain::listing::{display_preview, Page};
use crate::domain::note::ExpressionNote;
use crate::domain::template::Template;
use crate::domain::usage::UsageRecord;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveView {
    pub id: Uuid,
    pub title: Option<String>,
    pub content: String,
    pub preview: String,
    pub tone: String,
    pub purpose: Option<String>,
    pub relationship: Option<String>,
    pub rationale: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Archive> for ArchiveView {
    fn from(a: Archive) -> Self {
        Self {
            id: a.id,
            title: a.title,
            preview: display_preview(&a.preview),
            content: a.content,
            tone: a.tone,
            purpose: a.purpose,
            relationship: a.relationship,
            rationale: a.rationale,
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateView {
    pub id: Uuid,
    pub title: Option<String>,
    pub content: String,
    pub preview: String,
    pub tone: String,
    pub purpose: Option<String>,
    pub relationship: Option<String>,
    pub rationale: Option<String>,
    pub source_archive_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Template> for TemplateView {
    fn from(t: Template) -> Self {
        Self {
            id: t.id,
            title: t.title,
            preview: display_preview(&t.preview),
            content: t.content,
            tone: t.tone,
            purpose: t.purpose,
            relationship: t.relationship,
            rationale: t.rationale,
            source_archive_id: t.source_archive_id,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteView {
    pub id: Uuid,
    pub term: String,
    pub description: Option<String>,
    pub example: Option<String>,
    pub is_starred: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ExpressionNote> for NoteView {
    fn from(n: ExpressionNote) -> Self {
        Self {
            id: n.id,
            term: n.term,
            description: n.description,
            example: n.example,
            is_starred: n.is_starred,
            created_at: n.created_at,
            updated_at: n.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageDayView {
    pub date: NaiveDate,
    pub basic_requests: u32,
    pub advanced_requests: u32,
    pub total_tokens_used: u64,
}

impl From<UsageRecord> for UsageDayView {
    fn from(r: UsageRecord) -> Self {
        Self {
            date: r.date,
            basic_requests: r.basic_requests,
            advanced_requests: r.advanced_requests,
            total_tokens_used: r.total_tokens_used,
        }
    }
}

pub fn page_view<T, V: From<T>>(page: Page<T>) -> Page<V> {
    page.map(V::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::UserId;

    #[test]
    fn test_archive_view_is_camel_case_with_preview_fallback() {
        let archive = Archive::new(UserId::generate(), "", None);
        let json = serde_json::to_value(ArchiveView::from(archive)).unwrap();

        assert_eq!(json["preview"], "(no content)");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("user_id").is_none());
    }
}
