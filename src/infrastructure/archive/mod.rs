//! Archive persistence and the retention sweep

mod in_memory;
mod postgres;
mod service;

pub use in_memory::InMemoryArchiveRepository;
pub use postgres::PostgresArchiveRepository;
pub use service::{cleanup_old_archives, ArchiveService, DEFAULT_ARCHIVE_PAGE_SIZE};
