//! Daily usage tracking

mod in_memory;
mod postgres;
mod service;

pub use in_memory::InMemoryUsageRepository;
pub use postgres::PostgresUsageRepository;
pub use service::{UsageService, DEFAULT_STATS_DAYS, MAX_STATS_DAYS};
