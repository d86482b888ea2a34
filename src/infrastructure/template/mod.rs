//! Template persistence and quota-checked creation

mod in_memory;
mod postgres;
mod service;

pub use in_memory::InMemoryTemplateRepository;
pub use postgres::PostgresTemplateRepository;
pub use service::{CreateTemplateRequest, TemplateCreated, TemplateService, UpdateTemplateRequest};
