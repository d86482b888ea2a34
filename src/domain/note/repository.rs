use async_trait::async_trait;
use std::fmt::Debug;
use uuid::Uuid;

use super::{ExpressionNote, NoteFilter};
use crate::domain::user::UserId;
use crate::domain::DomainError;

#[async_trait]
pub trait NoteRepository: Send + Sync + Debug {
    async fn create(&self, note: ExpressionNote) -> Result<ExpressionNote, DomainError>;

    async fn get(&self, id: Uuid) -> Result<Option<ExpressionNote>, DomainError>;

    async fn update(&self, note: &ExpressionNote) -> Result<ExpressionNote, DomainError>;

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError>;

    async fn list(
        &self,
        user_id: &UserId,
        filter: &NoteFilter,
    ) -> Result<(Vec<ExpressionNote>, u64), DomainError>;
}
