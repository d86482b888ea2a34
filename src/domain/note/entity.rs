use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user::UserId;
use crate::domain::DomainError;

const MAX_TERM_CHARS: usize = 255;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpressionNote {
    pub id: Uuid,
    pub user_id: UserId,
    pub term: String,
    pub description: Option<String>,
    pub example: Option<String>,
    pub is_starred: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NoteUpdate {
    pub term: Option<String>,
    pub description: Option<String>,
    pub example: Option<String>,
    pub is_starred: Option<bool>,
}

/// Trimmed, non-empty, at most 255 characters
pub fn validate_term(term: &str) -> Result<String, DomainError> {
    let term = term.trim();

    if term.is_empty() {
        return Err(DomainError::validation("term must not be empty"));
    }

    if term.chars().count() > MAX_TERM_CHARS {
        return Err(DomainError::validation(format!(
            "term must be at most {} characters",
            MAX_TERM_CHARS
        )));
    }

    Ok(term.to_string())
}

impl ExpressionNote {
    /// Create an unstarred note
    pub fn new(user_id: UserId, term: impl Into<String>) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            user_id,
            term: term.into(),
            description: None,
            example: None,
            is_starred: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_example(mut self, example: Option<String>) -> Self {
        self.example = example;
        self
    }

    pub fn starred(mut self, is_starred: bool) -> Self {
        self.is_starred = is_starred;
        self
    }

    /// Apply a partial update and bump `updated_at`
    pub fn apply(&mut self, update: NoteUpdate) {
        if let Some(term) = update.term {
            self.term = term;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(example) = update.example {
            self.example = Some(example);
        }
        if let Some(is_starred) = update.is_starred {
            self.is_starred = is_starred;
        }
        self.updated_at = Utc::now();
    }

    /// Flip the starred flag
    pub fn toggle_star(&mut self) {
        self.is_starred = !self.is_starred;
        self.updated_at = Utc::now();
    }
}
