//! Expression note persistence and CRUD

mod in_memory;
mod postgres;
mod service;

pub use in_memory::InMemoryNoteRepository;
pub use postgres::PostgresNoteRepository;
pub use service::{CreateNoteRequest, NoteList, NoteService, Pagination, UpdateNoteRequest};
