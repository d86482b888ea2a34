//! Email generation orchestration

mod service;

pub use service::{GenerationService, GenerationSettings};
