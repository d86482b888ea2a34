use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::note::{ExpressionNote, NoteFilter, NoteRepository};
use crate::domain::user::UserId;
use crate::domain::DomainError;

#[derive(Debug, Default)]
pub struct InMemoryNoteRepository {
    notes: RwLock<HashMap<Uuid, ExpressionNote>>,
}

impl InMemoryNoteRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NoteRepository for InMemoryNoteRepository {
    async fn create(&self, note: ExpressionNote) -> Result<ExpressionNote, DomainError> {
        self.notes.write().await.insert(note.id, note.clone());
        Ok(note)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ExpressionNote>, DomainError> {
        Ok(self.notes.read().await.get(&id).cloned())
    }

    async fn update(&self, note: &ExpressionNote) -> Result<ExpressionNote, DomainError> {
        let mut notes = self.notes.write().await;

        match notes.get_mut(&note.id) {
            Some(existing) => {
                *existing = note.clone();
                Ok(note.clone())
            }
            None => Err(DomainError::not_found("Note not found")),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        Ok(self.notes.write().await.remove(&id).is_some())
    }

    async fn list(
        &self,
        user_id: &UserId,
        filter: &NoteFilter,
    ) -> Result<(Vec<ExpressionNote>, u64), DomainError> {
        let notes = self.notes.read().await;

        let mut matching: Vec<ExpressionNote> = notes
            .values()
            .filter(|n| &n.user_id == user_id && filter.matches(n))
            .cloned()
            .collect();
        filter.sort.sort(&mut matching);

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit as usize)
            .collect();

        Ok((items, total))
    }
}
