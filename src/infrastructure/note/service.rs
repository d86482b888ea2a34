use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::note::{validate_term, ExpressionNote, NoteQuery, NoteRepository, NoteUpdate};
use crate::domain::user::UserId;
use crate::domain::DomainError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
    pub term: Option<String>,
    pub description: Option<String>,
    pub example: Option<String>,
    pub is_starred: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoteRequest {
    pub term: Option<String>,
    pub description: Option<String>,
    pub example: Option<String>,
    pub is_starred: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    fn new(page: u32, limit: u32, total: u64) -> Self {
        Self {
            page,
            limit,
            total,
            total_pages: total.div_ceil(u64::from(limit.max(1))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NoteList {
    pub notes: Vec<ExpressionNote>,
    pub pagination: Pagination,
}

#[derive(Debug)]
pub struct NoteService {
    notes: Arc<dyn NoteRepository>,
}

impl NoteService {
    /// Create a new note service
    pub fn new(notes: Arc<dyn NoteRepository>) -> Self {
        Self { notes }
    }

    /// Create a note with a trimmed term
    pub async fn create(
        &self,
        user_id: &UserId,
        request: CreateNoteRequest,
    ) -> Result<ExpressionNote, DomainError> {
        let term = validate_term(request.term.as_deref().unwrap_or_default())?;

        let note = ExpressionNote::new(*user_id, term)
            .with_description(request.description)
            .with_example(request.example)
            .starred(request.is_starred.unwrap_or(false));

        self.notes.create(note).await
    }

    /// List the caller's notes with search, sort and pagination
    pub async fn list(&self, user_id: &UserId, query: NoteQuery) -> Result<NoteList, DomainError> {
        let filter = query.validate()?;
        let (notes, total) = self.notes.list(user_id, &filter).await?;

        Ok(NoteList {
            notes,
            pagination: Pagination::new(filter.page, filter.limit, total),
        })
    }

    /// Get one note owned by the caller
    pub async fn get(&self, user_id: &UserId, id: Uuid) -> Result<ExpressionNote, DomainError> {
        let note = self
            .notes
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Note not found"))?;

        if &note.user_id != user_id {
            return Err(DomainError::forbidden("You do not have access to this note"));
        }

        Ok(note)
    }

    /// Apply a partial update
    pub async fn update(
        &self,
        user_id: &UserId,
        id: Uuid,
        request: UpdateNoteRequest,
    ) -> Result<ExpressionNote, DomainError> {
        let term = request.term.as_deref().map(validate_term).transpose()?;
        let mut note = self.get(user_id, id).await?;

        note.apply(NoteUpdate {
            term,
            description: request.description,
            example: request.example,
            is_starred: request.is_starred,
        });

        self.notes.update(&note).await
    }

    /// Flip the starred flag
    pub async fn toggle_star(
        &self,
        user_id: &UserId,
        id: Uuid,
    ) -> Result<ExpressionNote, DomainError> {
        let mut note = self.get(user_id, id).await?;
        note.toggle_star();
        self.notes.update(&note).await
    }

    /// Delete one note owned by the caller
    pub async fn delete(&self, user_id: &UserId, id: Uuid) -> Result<(), DomainError> {
        self.get(user_id, id).await?;
        self.notes.delete(id).await?;
        Ok(())
    }
}
