//! Storage infrastructure: connection pool, migrations and backend wiring

mod factory;
mod listing;
pub mod migrations;
mod postgres;

pub use factory::{Repositories, StorageType};
pub use listing::{escape_like, push_list_filter};
pub use migrations::{run_migrations, Migration, PostgresMigrator};
pub use postgres::{connect, PostgresConfig};

/// SQLSTATE 23505
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}
