//! Expression notes: a per-user vocabulary notebook

mod entity;
mod query;
mod repository;

pub use entity::{validate_term, ExpressionNote, NoteUpdate};
pub use query::{NoteFilter, NoteQuery, NoteSort};
pub use repository::NoteRepository;
