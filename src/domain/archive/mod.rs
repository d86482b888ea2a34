//! Archive domain: stored generation results and their retention policy

mod entity;
mod policy;
mod repository;

pub use entity::Archive;
pub use policy::RetentionPolicy;
pub use repository::ArchiveRepository;
