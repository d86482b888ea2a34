//! Backend selection for the repository set

use std::sync::Arc;

use sqlx::PgPool;

use crate::domain::archive::ArchiveRepository;
use crate::domain::note::NoteRepository;
use crate::domain::session::SessionRepository;
use crate::domain::template::TemplateRepository;
use crate::domain::usage::UsageRepository;
use crate::domain::user::UserRepository;
use crate::infrastructure::archive::{InMemoryArchiveRepository, PostgresArchiveRepository};
use crate::infrastructure::note::{InMemoryNoteRepository, PostgresNoteRepository};
use crate::infrastructure::session::{InMemorySessionRepository, PostgresSessionRepository};
use crate::infrastructure::template::{InMemoryTemplateRepository, PostgresTemplateRepository};
use crate::infrastructure::usage::{InMemoryUsageRepository, PostgresUsageRepository};
use crate::infrastructure::user::{InMemoryUserRepository, PostgresUserRepository};

/// Supported storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    InMemory,
    Postgres,
}

impl StorageType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            _ => None,
        }
    }
}

/// Every repository the services need, on one backend
#[derive(Debug, Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub usage: Arc<dyn UsageRepository>,
    pub archives: Arc<dyn ArchiveRepository>,
    pub templates: Arc<dyn TemplateRepository>,
    pub notes: Arc<dyn NoteRepository>,
}

impl Repositories {
    /// Process-local maps; state is lost on restart
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            sessions: Arc::new(InMemorySessionRepository::new()),
            usage: Arc::new(InMemoryUsageRepository::new()),
            archives: Arc::new(InMemoryArchiveRepository::new()),
            templates: Arc::new(InMemoryTemplateRepository::new()),
            notes: Arc::new(InMemoryNoteRepository::new()),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            sessions: Arc::new(PostgresSessionRepository::new(pool.clone())),
            usage: Arc::new(PostgresUsageRepository::new(pool.clone())),
            archives: Arc::new(PostgresArchiveRepository::new(pool.clone())),
            templates: Arc::new(PostgresTemplateRepository::new(pool.clone())),
            notes: Arc::new(PostgresNoteRepository::new(pool)),
        }
    }
}
